//! Domain services used by the event handlers

pub mod clips;
pub mod config;
pub mod validation;

pub use clips::ClipService;
pub use config::ConfigService;

//! # Soundpad Common Library
//!
//! Shared code for the soundpad service:
//! - Clip and config persistence (the clip store)
//! - Wire event tags and outgoing message types
//! - Configuration file loading and data folder resolution
//! - Common error type

pub mod config;
pub mod db;
pub mod error;
pub mod events;

pub use error::{Error, Result};

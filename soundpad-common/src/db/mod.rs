//! Clip store: SQLite persistence for clips and the config record
//!
//! Queries are plain async functions taking the pool, one module per table.

pub mod clips;
pub mod init;
pub mod models;
pub mod settings;

pub use init::{init_database, init_in_memory};
pub use models::*;

//! # Soundpad Server Library (soundpad-server)
//!
//! Local soundboard service: plays stored clips on the default output (the
//! monitor) and on a routed device (a virtual microphone input) at the same
//! time, controlled over a WebSocket JSON protocol.
//!
//! **Architecture:** axum WebSocket server → event dispatcher → services and
//! playback controller → worker thread streaming symphonia → two cpal outputs

pub mod audio;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod playback;
pub mod server;
pub mod services;
pub mod state;

pub use error::{Error, EventError, Result};
pub use state::{AppContext, LiveSettings};

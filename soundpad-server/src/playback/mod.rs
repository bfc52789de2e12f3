//! Clip playback
//!
//! [`PlaybackController`] serializes play/stop requests over a single session
//! slot. Each session runs on its own worker thread, streaming one source to
//! two outputs (monitor and routed) with independent gains.

pub mod controller;
pub mod gains;
pub mod session;

pub use controller::{ControllerStatus, PlaybackController};
pub use session::{SessionState, StoppedSession};

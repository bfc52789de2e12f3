//! Error types for soundpad-server
//!
//! Two layers:
//! - [`EventError`]: domain failures a client can act on, each mapped to one
//!   wire error tag via [`EventError::kind`]
//! - [`Error`]: everything else the server can hit; the dispatcher reports
//!   these to the client as `GENERIC_ERROR`

use soundpad_common::events::ErrorEvent;
use thiserror::Error;

/// Domain failure surfaced to the client as a typed error event
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EventError {
    /// A required payload field is absent or null
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// Payload present but malformed or out of range
    #[error("{0}")]
    Validation(String),

    #[error("Sound with ID {0} not found")]
    SoundNotFound(i64),

    /// Backing file missing, unreadable, or not decodable (carries the path)
    #[error("Sound file not found or invalid: {0}")]
    InvalidSoundFile(String),

    #[error("Config with ID {0} not found")]
    ConfigNotFound(i64),

    #[error("Playback device not found: {0}")]
    PlaybackDeviceNotFound(String),

    #[error("Playback device ambiguous: {0}")]
    PlaybackDeviceAmbiguous(String),

    #[error("Event type {0} not supported")]
    UnsupportedEvent(String),
}

impl EventError {
    /// Wire error tag for this failure
    pub fn kind(&self) -> ErrorEvent {
        match self {
            EventError::MissingField(_) => ErrorEvent::MissingField,
            EventError::Validation(_) => ErrorEvent::ValidationError,
            EventError::SoundNotFound(_) => ErrorEvent::SoundNotFound,
            EventError::InvalidSoundFile(_) => ErrorEvent::SoundFileNotFound,
            EventError::ConfigNotFound(_) => ErrorEvent::ConfigNotFound,
            EventError::PlaybackDeviceNotFound(_) => ErrorEvent::PlaybackDeviceNotFound,
            EventError::PlaybackDeviceAmbiguous(_) => ErrorEvent::PlaybackDeviceAmbiguous,
            EventError::UnsupportedEvent(_) => ErrorEvent::EventNotSupported,
        }
    }
}

/// Main error type for soundpad-server
#[derive(Error, Debug)]
pub enum Error {
    /// Client-facing domain failure
    #[error(transparent)]
    Event(#[from] EventError),

    /// Store or configuration failure from soundpad-common
    #[error(transparent)]
    Common(#[from] soundpad_common::Error),

    /// Database connection or query errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration resolution errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Audio decoding errors
    #[error("Audio decode error: {0}")]
    Decode(String),

    /// Audio output device errors
    #[error("Audio output error: {0}")]
    AudioOutput(String),

    /// Handler table misuse (duplicate tag)
    #[error("Registration error: {0}")]
    Registration(String),

    /// The client's outbound channel is gone
    #[error("Connection closed")]
    ConnectionClosed,

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// The domain failure carried by this error, if any
    pub fn as_event(&self) -> Option<&EventError> {
        match self {
            Error::Event(e) => Some(e),
            _ => None,
        }
    }
}

/// Convenience Result type using soundpad-server Error
pub type Result<T> = std::result::Result<T, Error>;

//! Wire event types for the soundpad protocol
//!
//! Every message is a JSON object carrying a `type` tag:
//! - [`IncomingEvent`]: tags a client may send
//! - [`OutgoingMessage`]: typed replies and lifecycle notifications
//! - [`ErrorEvent`] / [`ErrorMessage`]: error replies (`{type, error}`)

use crate::db::models::{Clip, ConfigRecord};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Inbound event tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IncomingEvent {
    SoundAdd,
    SoundUpdate,
    SoundRemove,
    SoundFetch,
    SoundPlay,
    SoundStop,
    ConfigFetch,
    ConfigUpdate,
}

impl IncomingEvent {
    /// Every inbound tag, in protocol-table order
    pub const ALL: [IncomingEvent; 8] = [
        IncomingEvent::SoundAdd,
        IncomingEvent::SoundUpdate,
        IncomingEvent::SoundRemove,
        IncomingEvent::SoundFetch,
        IncomingEvent::SoundPlay,
        IncomingEvent::SoundStop,
        IncomingEvent::ConfigFetch,
        IncomingEvent::ConfigUpdate,
    ];

    /// Wire tag
    pub fn as_str(&self) -> &'static str {
        match self {
            IncomingEvent::SoundAdd => "SOUND_ADD",
            IncomingEvent::SoundUpdate => "SOUND_UPDATE",
            IncomingEvent::SoundRemove => "SOUND_REMOVE",
            IncomingEvent::SoundFetch => "SOUND_FETCH",
            IncomingEvent::SoundPlay => "SOUND_PLAY",
            IncomingEvent::SoundStop => "SOUND_STOP",
            IncomingEvent::ConfigFetch => "CONFIG_FETCH",
            IncomingEvent::ConfigUpdate => "CONFIG_UPDATE",
        }
    }
}

impl fmt::Display for IncomingEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not a known inbound tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEventTag(pub String);

impl fmt::Display for UnknownEventTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown event tag: {}", self.0)
    }
}

impl std::error::Error for UnknownEventTag {}

impl FromStr for IncomingEvent {
    type Err = UnknownEventTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IncomingEvent::ALL
            .into_iter()
            .find(|event| event.as_str() == s)
            .ok_or_else(|| UnknownEventTag(s.to_string()))
    }
}

/// Outbound messages other than errors
///
/// `SoundPlaying` and `SoundStopped` are also emitted asynchronously by the
/// playback worker, outside any request/response cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutgoingMessage {
    SoundAdded {
        sound: Clip,
    },
    SoundUpdated {
        sound: Clip,
    },
    SoundRemoved {
        #[serde(rename = "soundId")]
        sound_id: i64,
    },
    SoundFetched {
        sounds: Vec<Clip>,
    },
    SoundPlaying {
        #[serde(rename = "soundId")]
        sound_id: i64,
    },
    /// Terminal notification; identical for completion and cancellation.
    /// `sound_id` is `None` only in the reply to a stop with nothing playing.
    SoundStopped {
        #[serde(rename = "soundId")]
        sound_id: Option<i64>,
    },
    ConfigFetched {
        config: ConfigRecord,
    },
    ConfigUpdated {
        config: ConfigRecord,
    },
}

/// Error reply tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorEvent {
    /// A required field is absent
    MissingField,
    /// A payload fails schema or range validation
    ValidationError,
    /// Referenced clip id does not exist
    SoundNotFound,
    /// The clip's backing file is missing or unreadable
    SoundFileNotFound,
    /// No config record exists
    ConfigNotFound,
    PlaybackDeviceNotFound,
    PlaybackDeviceAmbiguous,
    /// Unknown `type` tag
    EventNotSupported,
    /// Any unanticipated failure
    GenericError,
}

impl ErrorEvent {
    /// Wire tag
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorEvent::MissingField => "MISSING_FIELD",
            ErrorEvent::ValidationError => "VALIDATION_ERROR",
            ErrorEvent::SoundNotFound => "SOUND_NOT_FOUND",
            ErrorEvent::SoundFileNotFound => "SOUND_FILE_NOT_FOUND",
            ErrorEvent::ConfigNotFound => "CONFIG_NOT_FOUND",
            ErrorEvent::PlaybackDeviceNotFound => "PLAYBACK_DEVICE_NOT_FOUND",
            ErrorEvent::PlaybackDeviceAmbiguous => "PLAYBACK_DEVICE_AMBIGUOUS",
            ErrorEvent::EventNotSupported => "EVENT_NOT_SUPPORTED",
            ErrorEvent::GenericError => "GENERIC_ERROR",
        }
    }
}

impl fmt::Display for ErrorEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error reply: `{"type": <ErrorEvent>, "error": <message>}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMessage {
    #[serde(rename = "type")]
    pub kind: ErrorEvent,
    pub error: String,
}

impl ErrorMessage {
    pub fn new(kind: ErrorEvent, error: impl Into<String>) -> Self {
        Self {
            kind,
            error: error.into(),
        }
    }
}

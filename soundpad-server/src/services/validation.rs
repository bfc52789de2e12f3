//! Clip field validation
//!
//! Enforced before a clip is persisted, so the controller only ever sees
//! paths with a recognized audio extension.

use crate::error::EventError;
use soundpad_common::db::NewClip;
use std::path::Path;

/// Maximum length of `name` and `path`, in characters
pub const MAX_FIELD_LEN: usize = 255;

/// Accepted file extensions (compared case-insensitively)
pub const AUDIO_EXTENSIONS: [&str; 2] = ["mp3", "wav"];

/// Check both fields of a clip about to be stored
pub fn validate_clip(clip: &NewClip) -> Result<(), EventError> {
    validate_length("name", &clip.name)?;
    validate_length("path", &clip.path)?;

    if !has_audio_extension(&clip.path) {
        return Err(EventError::Validation(format!(
            "Sound path must end with .{}",
            AUDIO_EXTENSIONS.join(" or .")
        )));
    }

    Ok(())
}

fn validate_length(field: &str, value: &str) -> Result<(), EventError> {
    let len = value.chars().count();
    if len == 0 || len > MAX_FIELD_LEN {
        return Err(EventError::Validation(format!(
            "{} must be between 1 and {} characters (got {})",
            field, MAX_FIELD_LEN, len
        )));
    }
    Ok(())
}

/// True if `path` ends in one of [`AUDIO_EXTENSIONS`]
pub fn has_audio_extension(path: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|ext| AUDIO_EXTENSIONS.iter().any(|a| a.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

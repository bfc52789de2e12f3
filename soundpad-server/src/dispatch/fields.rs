//! Payload field extraction
//!
//! Field paths are dotted (`"data.name"`) and the same path is used in the
//! `MISSING_FIELD` message. A JSON `null` counts as absent.

use crate::error::EventError;
use serde_json::Value;

type FieldResult<T> = std::result::Result<T, EventError>;

fn lookup<'a>(message: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(message, |current, segment| current.get(segment))
        .filter(|value| !value.is_null())
}

/// Value at `path`, failing with `MissingField` if absent or null
pub fn required<'a>(message: &'a Value, path: &str) -> FieldResult<&'a Value> {
    lookup(message, path).ok_or_else(|| EventError::MissingField(path.to_string()))
}

/// String at `path`
pub fn required_str<'a>(message: &'a Value, path: &str) -> FieldResult<&'a str> {
    required(message, path)?
        .as_str()
        .ok_or_else(|| EventError::Validation(format!("{} must be a string", path)))
}

/// Integer id at `path`
pub fn required_id(message: &Value, path: &str) -> FieldResult<i64> {
    required(message, path)?
        .as_i64()
        .ok_or_else(|| EventError::Validation(format!("{} must be an integer", path)))
}

/// String at `path` if present
pub fn optional_str(message: &Value, path: &str) -> FieldResult<Option<String>> {
    match lookup(message, path) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(EventError::Validation(format!("{} must be a string", path))),
    }
}

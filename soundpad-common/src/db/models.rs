//! Database models
//!
//! These types double as wire payloads: field names serialize in camelCase
//! (`isValid`, `createdAt`, `monitorVolume`, ...).

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Volume used for any config field a client leaves out
pub const DEFAULT_VOLUME: f64 = 0.5;

/// Mute state used for any config field a client leaves out
pub const DEFAULT_MUTED: bool = false;

/// A stored sound clip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Clip {
    /// Assigned by the store, immutable
    pub id: i64,
    pub name: String,
    /// Path to the audio file on disk
    pub path: String,
    /// False once a play attempt found the file missing
    pub is_valid: bool,
    /// Set by the store, immutable
    pub created_at: NaiveDateTime,
}

/// Fields accepted when creating a clip
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewClip {
    pub name: String,
    pub path: String,
}

/// Partial clip update; absent fields keep their stored value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
}

impl ClipPatch {
    /// Overlay the patch on a stored clip, producing the fields to persist
    pub fn apply_to(&self, clip: &Clip) -> NewClip {
        NewClip {
            name: self.name.clone().unwrap_or_else(|| clip.name.clone()),
            path: self.path.clone().unwrap_or_else(|| clip.path.clone()),
        }
    }
}

/// The single config record
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ConfigRecord {
    /// Gain applied to the monitor (default device) output, 0.0-1.0
    pub monitor_volume: f64,
    /// Gain applied to the routed (virtual microphone) output, 0.0-1.0
    pub routed_volume: f64,
    /// When set, the monitor output is silenced
    pub routed_muted: bool,
}

impl Default for ConfigRecord {
    fn default() -> Self {
        Self {
            monitor_volume: DEFAULT_VOLUME,
            routed_volume: DEFAULT_VOLUME,
            routed_muted: DEFAULT_MUTED,
        }
    }
}

/// Config update payload; every field is optional on the wire
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigPatch {
    #[serde(default)]
    pub monitor_volume: Option<f64>,
    #[serde(default)]
    pub routed_volume: Option<f64>,
    #[serde(default)]
    pub routed_muted: Option<bool>,
}

impl ConfigPatch {
    /// Resolve the patch into a full record.
    ///
    /// Absent fields take the fixed defaults, not the previously stored
    /// values.
    pub fn resolve_with_defaults(&self) -> ConfigRecord {
        ConfigRecord {
            monitor_volume: self.monitor_volume.unwrap_or(DEFAULT_VOLUME),
            routed_volume: self.routed_volume.unwrap_or(DEFAULT_VOLUME),
            routed_muted: self.routed_muted.unwrap_or(DEFAULT_MUTED),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_config_patch_defaults_absent_fields() {
        let patch: ConfigPatch = serde_json::from_value(json!({ "routedVolume": 0.2 })).unwrap();
        let record = patch.resolve_with_defaults();

        assert_eq!(record.routed_volume, 0.2);
        assert_eq!(record.monitor_volume, DEFAULT_VOLUME);
        assert!(!record.routed_muted);
    }

    #[test]
    fn test_config_patch_rejects_wrong_types() {
        let result = serde_json::from_value::<ConfigPatch>(json!({ "routedMuted": "yes" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_clip_patch_keeps_unset_fields() {
        let stored = Clip {
            id: 1,
            name: "old".to_string(),
            path: "/sounds/old.mp3".to_string(),
            is_valid: true,
            created_at: NaiveDateTime::default(),
        };
        let patch: ClipPatch = serde_json::from_value(json!({ "name": "new" })).unwrap();

        let merged = patch.apply_to(&stored);
        assert_eq!(merged.name, "new");
        assert_eq!(merged.path, "/sounds/old.mp3");
    }

    #[test]
    fn test_clip_serializes_camel_case() {
        let clip = Clip {
            id: 7,
            name: "airhorn".to_string(),
            path: "/sounds/airhorn.mp3".to_string(),
            is_valid: true,
            created_at: NaiveDateTime::default(),
        };

        let value = serde_json::to_value(&clip).unwrap();
        assert_eq!(value["isValid"], json!(true));
        assert!(value.get("createdAt").is_some());
        assert!(value.get("is_valid").is_none());
    }
}

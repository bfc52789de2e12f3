//! Per-output gain computation
//!
//! Mute silences the monitor (the local speakers) only; the routed copy
//! always follows `routed_volume`.

use soundpad_common::db::ConfigRecord;

/// Scale factors for one chunk
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gains {
    pub monitor: f32,
    pub routed: f32,
}

impl Gains {
    pub fn from_settings(settings: &ConfigRecord) -> Self {
        Self {
            monitor: if settings.routed_muted {
                0.0
            } else {
                settings.monitor_volume as f32
            },
            routed: settings.routed_volume as f32,
        }
    }
}

/// Write `input * gain` into `out` (cleared first)
pub fn scale_into(input: &[f32], gain: f32, out: &mut Vec<f32>) {
    out.clear();
    out.extend(input.iter().map(|s| s * gain));
}

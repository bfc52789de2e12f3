//! Routed output device resolution
//!
//! Deterministic: one enumeration, no retry, no fallback to the default
//! device. Exactly one device must match.

use crate::audio::{AudioBackend, DeviceInfo};
use crate::config::RoutingTarget;
use crate::error::{EventError, Result};
use tracing::debug;

/// Select the single device whose name contains `name_fragment`
/// (case-insensitive) and whose host equals `host`.
pub fn resolve_device(
    devices: &[DeviceInfo],
    name_fragment: &str,
    host: &str,
) -> std::result::Result<usize, EventError> {
    let needle = name_fragment.to_lowercase();

    let matches: Vec<&DeviceInfo> = devices
        .iter()
        .filter(|d| d.host == host && d.name.to_lowercase().contains(&needle))
        .collect();

    match matches.as_slice() {
        [single] => Ok(single.index),
        [] => Err(EventError::PlaybackDeviceNotFound(format!(
            "no output device matching '{}' on host {}",
            name_fragment, host
        ))),
        many => {
            let names: Vec<&str> = many.iter().map(|d| d.name.as_str()).collect();
            Err(EventError::PlaybackDeviceAmbiguous(format!(
                "'{}' on host {} matches {} devices: {}",
                name_fragment,
                host,
                many.len(),
                names.join(", ")
            )))
        }
    }
}

/// Enumerate the backend's devices and resolve the routing target
///
/// Enumeration failures propagate unchanged.
pub fn resolve(backend: &dyn AudioBackend, target: &RoutingTarget) -> Result<usize> {
    let devices = backend.output_devices()?;
    let index = resolve_device(&devices, &target.name_fragment, &target.host)?;
    debug!(
        "Routed output resolved to device #{} on {}",
        index, target.host
    );
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use soundpad_common::events::ErrorEvent;

    fn device(index: usize, name: &str, host: &str) -> DeviceInfo {
        DeviceInfo {
            index,
            name: name.to_string(),
            host: host.to_string(),
        }
    }

    fn sample_devices() -> Vec<DeviceInfo> {
        vec![
            device(0, "Speakers (Realtek Audio)", "WASAPI"),
            device(1, "VoiceMeeter Input (VB-Audio VoiceMeeter VAIO)", "WASAPI"),
            device(2, "VoiceMeeter Input (VB-Audio VoiceMeeter VAIO)", "ASIO"),
            device(3, "CABLE Input (VB-Audio Virtual Cable)", "WASAPI"),
            device(4, "CABLE Input (VB-Audio Virtual Cable) 2", "WASAPI"),
        ]
    }

    #[test]
    fn test_case_insensitive_unique_match() {
        let index = resolve_device(&sample_devices(), "voicemeeter input (vb-audio voi", "WASAPI").unwrap();
        assert_eq!(index, 1);
    }

    #[test]
    fn test_host_must_match_exactly() {
        let index = resolve_device(&sample_devices(), "voicemeeter", "ASIO").unwrap();
        assert_eq!(index, 2);

        let err = resolve_device(&sample_devices(), "voicemeeter", "asio").unwrap_err();
        assert_eq!(err.kind(), ErrorEvent::PlaybackDeviceNotFound);
    }

    #[test]
    fn test_zero_matches_not_found() {
        let err = resolve_device(&sample_devices(), "headphones", "WASAPI").unwrap_err();
        assert!(matches!(err, EventError::PlaybackDeviceNotFound(_)));
    }

    #[test]
    fn test_two_matches_ambiguous() {
        let err = resolve_device(&sample_devices(), "cable input", "WASAPI").unwrap_err();
        match err {
            EventError::PlaybackDeviceAmbiguous(msg) => assert!(msg.contains("2 devices")),
            other => panic!("expected ambiguous, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_enumeration() {
        let err = resolve_device(&[], "anything", "ALSA").unwrap_err();
        assert!(matches!(err, EventError::PlaybackDeviceNotFound(_)));
    }
}

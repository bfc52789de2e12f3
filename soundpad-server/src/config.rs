//! soundpad-server configuration
//!
//! Process constants fixed at startup. Values are merged from command-line
//! overrides (which already include environment variables) and the TOML
//! file, falling back to compiled defaults.

use crate::error::{Error, Result};
use soundpad_common::config::{resolve_database_path, TomlConfig};
use std::path::PathBuf;

/// Default bind address (local clients only)
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default WebSocket port
pub const DEFAULT_PORT: u16 = 4358;

/// Default frames per chunk
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// Default routed device name fragment (virtual microphone input)
pub const DEFAULT_ROUTED_DEVICE: &str = "voicemeeter input (vb-audio voi";

/// Which output device receives the routed copy of each clip
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingTarget {
    /// Case-insensitive substring of the device name
    pub name_fragment: String,
    /// Exact audio host name the device must belong to
    pub host: String,
}

impl Default for RoutingTarget {
    fn default() -> Self {
        Self {
            name_fragment: DEFAULT_ROUTED_DEVICE.to_string(),
            host: default_host_name(),
        }
    }
}

/// Name of the platform default audio host (e.g. "ALSA", "WASAPI")
pub fn default_host_name() -> String {
    cpal::default_host().id().name().to_string()
}

/// Settings supplied on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub chunk_size: Option<usize>,
    pub database_path: Option<PathBuf>,
    pub routed_device: Option<String>,
    pub routed_host: Option<String>,
}

/// Resolved server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Frames read and written per loop iteration
    pub chunk_size: usize,
    pub database_path: PathBuf,
    pub routing: RoutingTarget,
}

impl ServerConfig {
    /// Merge overrides over the TOML file over compiled defaults
    pub fn resolve(overrides: ConfigOverrides, toml: &TomlConfig) -> Result<Self> {
        let chunk_size = overrides
            .chunk_size
            .or(toml.chunk_size)
            .unwrap_or(DEFAULT_CHUNK_SIZE);
        if chunk_size == 0 {
            return Err(Error::Config("chunk_size must be greater than 0".to_string()));
        }

        let routing = RoutingTarget {
            name_fragment: overrides
                .routed_device
                .or_else(|| toml.routed_device.clone())
                .unwrap_or_else(|| DEFAULT_ROUTED_DEVICE.to_string()),
            host: overrides
                .routed_host
                .or_else(|| toml.routed_host.clone())
                .unwrap_or_else(default_host_name),
        };
        if routing.name_fragment.trim().is_empty() {
            return Err(Error::Config("routed device name must not be empty".to_string()));
        }

        Ok(Self {
            host: overrides
                .host
                .or_else(|| toml.host.clone())
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: overrides.port.or(toml.port).unwrap_or(DEFAULT_PORT),
            chunk_size,
            database_path: resolve_database_path(overrides.database_path.as_deref(), toml),
            routing,
        })
    }

    /// `host:port` for the listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_nothing_set() {
        let config = ServerConfig::resolve(ConfigOverrides::default(), &TomlConfig::default()).unwrap();

        assert_eq!(config.bind_addr(), "127.0.0.1:4358");
        assert_eq!(config.chunk_size, 1024);
        assert_eq!(config.routing.name_fragment, DEFAULT_ROUTED_DEVICE);
        assert_eq!(config.routing.host, default_host_name());
    }

    #[test]
    fn test_overrides_beat_toml() {
        let toml = TomlConfig {
            port: Some(5000),
            chunk_size: Some(256),
            routed_device: Some("cable input".to_string()),
            ..Default::default()
        };
        let overrides = ConfigOverrides {
            port: Some(6000),
            ..Default::default()
        };

        let config = ServerConfig::resolve(overrides, &toml).unwrap();
        assert_eq!(config.port, 6000);
        assert_eq!(config.chunk_size, 256);
        assert_eq!(config.routing.name_fragment, "cable input");
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let overrides = ConfigOverrides {
            chunk_size: Some(0),
            ..Default::default()
        };

        let result = ServerConfig::resolve(overrides, &TomlConfig::default());
        assert!(matches!(result, Err(Error::Config(_))));
    }
}

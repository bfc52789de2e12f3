//! Configuration file loading and data folder resolution
//!
//! Resolution priority for every setting:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! Levels 1 and 2 are handled by the binary's argument parser; this module
//! covers the TOML file and the compiled defaults. A missing config file is
//! never fatal: it logs a warning and yields an empty [`TomlConfig`].

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Application directory name under the platform config/data roots
pub const APP_DIR_NAME: &str = "soundpad";

/// Database file name inside the data folder
pub const DATABASE_FILE_NAME: &str = "soundpad.db";

/// Contents of `config.toml`; every key is optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub chunk_size: Option<usize>,
    pub database_path: Option<PathBuf>,
    /// Case-insensitive fragment of the routed output device name
    pub routed_device: Option<String>,
    /// Audio host API the routed device must belong to
    pub routed_host: Option<String>,
}

/// Default config file location for the platform
///
/// `~/.config/soundpad/config.toml` on Linux, the equivalent per-user
/// config directory elsewhere.
pub fn default_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join("config.toml"))
}

/// Load the TOML config file.
///
/// With `path` = `None` the platform default location is used. A file
/// that does not exist produces a warning and an empty config; a file
/// that exists but cannot be parsed is an error.
pub fn load_toml_config(path: Option<&Path>) -> Result<TomlConfig> {
    let path = match path.map(Path::to_path_buf).or_else(default_config_file) {
        Some(path) => path,
        None => {
            warn!("Could not determine config directory, using defaults");
            return Ok(TomlConfig::default());
        }
    };

    if !path.exists() {
        warn!("Config file not found at {}, using defaults", path.display());
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(&path)?;
    let config = parse_toml_config(&content)
        .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;

    debug!("Loaded config file: {}", path.display());
    Ok(config)
}

/// Parse config file contents
pub fn parse_toml_config(content: &str) -> Result<TomlConfig> {
    toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
}

/// Default data folder for the platform
pub fn default_data_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/soundpad
        dirs::data_local_dir()
            .map(|d| d.join(APP_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from("/var/lib/soundpad"))
    } else if cfg!(target_os = "windows") {
        // %LOCALAPPDATA%\soundpad
        dirs::data_local_dir()
            .map(|d| d.join(APP_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\soundpad"))
    } else {
        dirs::data_dir()
            .map(|d| d.join(APP_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from("./soundpad_data"))
    }
}

/// Default database file path
pub fn default_database_path() -> PathBuf {
    default_data_folder().join(DATABASE_FILE_NAME)
}

/// Pick the database path: explicit value (CLI or env), then TOML, then default
pub fn resolve_database_path(explicit: Option<&Path>, toml: &TomlConfig) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .or_else(|| toml.database_path.clone())
        .unwrap_or_else(default_database_path)
}

//! Config service
//!
//! The store and the live settings must agree: an update is persisted first
//! and only then published to the playback worker.

use crate::error::{EventError, Result};
use crate::state::LiveSettings;
use serde_json::Value;
use soundpad_common::db::{settings, ConfigPatch, ConfigRecord};
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::info;

/// Id of the singleton config record
pub const CONFIG_ID: i64 = 1;

#[derive(Clone)]
pub struct ConfigService {
    pool: SqlitePool,
    settings: Arc<LiveSettings>,
}

impl ConfigService {
    pub fn new(pool: SqlitePool, settings: Arc<LiveSettings>) -> Self {
        Self { pool, settings }
    }

    /// Load the stored record for startup.
    ///
    /// Fails with `ConfigNotFound` if the row is missing.
    pub async fn hydrate(pool: &SqlitePool) -> Result<ConfigRecord> {
        let record = settings::get_config(pool)
            .await?
            .ok_or(EventError::ConfigNotFound(CONFIG_ID))?;
        info!(
            "Loaded config: monitor={}, routed={}, muted={}",
            record.monitor_volume, record.routed_volume, record.routed_muted
        );
        Ok(record)
    }

    /// Current live settings
    pub fn live(&self) -> ConfigRecord {
        self.settings.snapshot()
    }

    /// Apply a `config` payload.
    ///
    /// Absent fields take the defaults, not the previous values. Returns the
    /// resolved record as stored.
    pub async fn update(&self, payload: &Value) -> Result<ConfigRecord> {
        if !payload.is_object() {
            return Err(EventError::Validation("config must be an object".to_string()).into());
        }

        let patch: ConfigPatch = serde_json::from_value(payload.clone())
            .map_err(|e| EventError::Validation(format!("Invalid config: {}", e)))?;
        let record = patch.resolve_with_defaults();
        validate_record(&record)?;

        settings::update_config(&self.pool, &record)
            .await
            .map_err(|e| match e {
                soundpad_common::Error::NotFound(_) => EventError::ConfigNotFound(CONFIG_ID).into(),
                other => crate::Error::from(other),
            })?;

        self.settings.replace(record);
        info!(
            "Config updated: monitor={}, routed={}, muted={}",
            record.monitor_volume, record.routed_volume, record.routed_muted
        );
        Ok(record)
    }
}

fn validate_record(record: &ConfigRecord) -> std::result::Result<(), EventError> {
    for (field, value) in [
        ("monitorVolume", record.monitor_volume),
        ("routedVolume", record.routed_volume),
    ] {
        if !(0.0..=1.0).contains(&value) {
            return Err(EventError::Validation(format!(
                "{} must be between 0.0 and 1.0 (got {})",
                field, value
            )));
        }
    }
    Ok(())
}

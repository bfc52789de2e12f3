//! Shared application state
//!
//! - [`LiveSettings`]: the process-wide volume/mute record, read by the
//!   playback worker on every chunk and replaced by config updates
//! - [`AppContext`]: everything a handler needs, cloned into each handler
//!   closure at registration time

use crate::playback::PlaybackController;
use crate::services::{ClipService, ConfigService};
use soundpad_common::db::ConfigRecord;
use sqlx::SqlitePool;
use std::sync::{Arc, RwLock};

/// Live volume and mute settings
///
/// Readers always get a whole-record snapshot, so a chunk never mixes
/// fields from two different updates.
#[derive(Debug, Default)]
pub struct LiveSettings {
    inner: RwLock<ConfigRecord>,
}

impl LiveSettings {
    pub fn new(initial: ConfigRecord) -> Self {
        Self {
            inner: RwLock::new(initial),
        }
    }

    /// Copy of the current record
    pub fn snapshot(&self) -> ConfigRecord {
        // A poisoned lock still holds a complete Copy record
        *self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    /// Replace the whole record
    pub fn replace(&self, record: ConfigRecord) {
        *self.inner.write().unwrap_or_else(|e| e.into_inner()) = record;
    }
}

/// Handles shared by every event handler
#[derive(Clone)]
pub struct AppContext {
    pub pool: SqlitePool,
    pub settings: Arc<LiveSettings>,
    pub controller: Arc<PlaybackController>,
    pub clips: ClipService,
    pub config: ConfigService,
}

impl AppContext {
    pub fn new(pool: SqlitePool, settings: Arc<LiveSettings>, controller: Arc<PlaybackController>) -> Self {
        Self {
            clips: ClipService::new(pool.clone()),
            config: ConfigService::new(pool.clone(), Arc::clone(&settings)),
            pool,
            settings,
            controller,
        }
    }
}

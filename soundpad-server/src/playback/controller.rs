//! Playback controller
//!
//! Owns the single session slot. `play` and `stop` hold the slot lock for
//! their whole duration, so concurrent callers serialize and at most one
//! worker thread exists at any time.
//!
//! Both operations block (joining a worker can take up to one chunk) and
//! must be called from a blocking context, e.g. `tokio::task::spawn_blocking`.

use crate::audio::{devices, AudioBackend};
use crate::config::RoutingTarget;
use crate::dispatch::Connection;
use crate::error::{EventError, Result};
use crate::playback::session::{self, ActiveSession, SessionParams, SessionState, StoppedSession};
use crate::state::LiveSettings;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// Snapshot of what the controller is doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerStatus {
    Idle,
    Busy {
        sound_id: i64,
        state: SessionState,
        /// Frames played so far
        cursor: u64,
        total_frames: Option<u64>,
    },
}

pub struct PlaybackController {
    backend: Arc<dyn AudioBackend>,
    settings: Arc<LiveSettings>,
    routing: RoutingTarget,
    chunk_size: usize,
    slot: Mutex<Option<ActiveSession>>,
}

impl PlaybackController {
    pub fn new(
        backend: Arc<dyn AudioBackend>,
        settings: Arc<LiveSettings>,
        routing: RoutingTarget,
        chunk_size: usize,
    ) -> Self {
        Self {
            backend,
            settings,
            routing,
            chunk_size,
            slot: Mutex::new(None),
        }
    }

    fn lock_slot(&self) -> MutexGuard<'_, Option<ActiveSession>> {
        // The slot stays consistent even if a holder panicked
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Play `path` as sound `sound_id`, notifying `connection`.
    ///
    /// Any existing session is stopped and joined first (it emits its own
    /// `SOUND_STOPPED`). Then the routed device is resolved and the file
    /// opened; failures there abort before any stream exists.
    pub fn play(&self, path: &Path, sound_id: i64, connection: Connection) -> Result<()> {
        let mut slot = self.lock_slot();

        if let Some(previous) = slot.take() {
            let previous_id = previous.sound_id();
            if previous.stop().is_some() {
                debug!("Superseded sound {} with sound {}", previous_id, sound_id);
            }
        }

        let routed_device = devices::resolve(self.backend.as_ref(), &self.routing)?;

        let source = self.backend.open_source(path).map_err(|e| {
            warn!("Cannot open {} for playback: {}", path.display(), e);
            EventError::InvalidSoundFile(path.display().to_string())
        })?;

        let session = session::spawn(SessionParams {
            sound_id,
            source,
            backend: Arc::clone(&self.backend),
            routed_device,
            chunk_size: self.chunk_size,
            settings: Arc::clone(&self.settings),
            connection,
        })?;

        info!("Started playback of sound {}", sound_id);
        *slot = Some(session);
        Ok(())
    }

    /// Stop the active session, if any. Idempotent.
    ///
    /// Returns the session this call interrupted. Its owner has already been
    /// sent `SOUND_STOPPED` by the time this returns.
    pub fn stop(&self) -> Option<StoppedSession> {
        let stopped = self.lock_slot().take().and_then(ActiveSession::stop);
        if let Some(session) = stopped {
            info!(
                "Stopped playback of sound {} (owner {})",
                session.sound_id, session.owner
            );
        }
        stopped
    }

    pub fn status(&self) -> ControllerStatus {
        match self.lock_slot().as_ref() {
            Some(session) if matches!(session.state(), SessionState::Starting | SessionState::Playing) => {
                ControllerStatus::Busy {
                    sound_id: session.sound_id(),
                    state: session.state(),
                    cursor: session.cursor(),
                    total_frames: session.total_frames(),
                }
            }
            _ => ControllerStatus::Idle,
        }
    }
}

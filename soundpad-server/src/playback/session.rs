//! One playback session and its worker thread
//!
//! The worker owns the source and both output streams for its whole life.
//! Lifecycle on the connection:
//! - `SOUND_PLAYING` is queued after both streams opened, before the first chunk
//! - `SOUND_STOPPED` is queued exactly once when the worker exits, whether
//!   the source ran out or the session was cancelled
//!
//! If a stream fails to open, the error goes back to the caller of
//! [`spawn`] and neither notification is sent.
//!
//! Outputs drain their queued audio only when the source ran out; a
//! cancelled session discards it.

use crate::audio::{AudioBackend, AudioSource, OutputStream, OutputTarget, StreamSpec};
use crate::dispatch::Connection;
use crate::error::{Error, Result};
use crate::playback::gains::{scale_into, Gains};
use crate::state::LiveSettings;
use soundpad_common::events::OutgoingMessage;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::mpsc::{sync_channel, SyncSender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Worker spawned, streams not yet open
    Starting,
    Playing,
    /// Source exhausted
    Completed,
    /// Cancelled by `stop`
    Stopped,
}

impl SessionState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => SessionState::Starting,
            1 => SessionState::Playing,
            2 => SessionState::Completed,
            _ => SessionState::Stopped,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            SessionState::Starting => 0,
            SessionState::Playing => 1,
            SessionState::Completed => 2,
            SessionState::Stopped => 3,
        }
    }
}

/// State shared between the controller and the worker
#[derive(Debug)]
struct SessionShared {
    cancel: AtomicBool,
    state: AtomicU8,
    /// Frames written to both outputs so far
    cursor: AtomicU64,
}

impl SessionShared {
    fn state(&self) -> SessionState {
        SessionState::from_u8(self.state.load(Ordering::SeqCst))
    }

    fn set_state(&self, state: SessionState) {
        self.state.store(state.as_u8(), Ordering::SeqCst);
    }
}

/// Everything the worker needs, moved onto its thread
pub struct SessionParams {
    pub sound_id: i64,
    pub source: Box<dyn AudioSource>,
    pub backend: Arc<dyn AudioBackend>,
    /// Enumeration index of the routed output device
    pub routed_device: usize,
    pub chunk_size: usize,
    pub settings: Arc<LiveSettings>,
    pub connection: Connection,
}

/// A session interrupted by `stop`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoppedSession {
    pub sound_id: i64,
    /// Connection that started the session and received its notifications
    pub owner: Uuid,
}

/// Handle to a running (or finished but not yet reaped) session
pub struct ActiveSession {
    sound_id: i64,
    owner: Uuid,
    total_frames: Option<u64>,
    shared: Arc<SessionShared>,
    thread: Option<JoinHandle<()>>,
}

impl ActiveSession {
    pub fn sound_id(&self) -> i64 {
        self.sound_id
    }

    pub fn state(&self) -> SessionState {
        self.shared.state()
    }

    pub fn cursor(&self) -> u64 {
        self.shared.cursor.load(Ordering::SeqCst)
    }

    pub fn total_frames(&self) -> Option<u64> {
        self.total_frames
    }

    /// Cancel and join the worker.
    ///
    /// Returns the interrupted session, or `None` if it had already
    /// completed on its own.
    pub fn stop(mut self) -> Option<StoppedSession> {
        self.shared.cancel.store(true, Ordering::SeqCst);

        if let Some(handle) = self.thread.take() {
            if handle.join().is_err() {
                error!("Playback worker for sound {} panicked", self.sound_id);
            }
        }

        match self.shared.state() {
            SessionState::Completed => None,
            _ => Some(StoppedSession {
                sound_id: self.sound_id,
                owner: self.owner,
            }),
        }
    }
}

impl Drop for ActiveSession {
    fn drop(&mut self) {
        // Never leave a detached worker behind
        if let Some(handle) = self.thread.take() {
            self.shared.cancel.store(true, Ordering::SeqCst);
            let _ = handle.join();
        }
    }
}

/// Start a worker and wait until its streams are open.
pub fn spawn(params: SessionParams) -> Result<ActiveSession> {
    let sound_id = params.sound_id;
    let owner = params.connection.id();
    let total_frames = params.source.total_frames();
    let shared = Arc::new(SessionShared {
        cancel: AtomicBool::new(false),
        state: AtomicU8::new(SessionState::Starting.as_u8()),
        cursor: AtomicU64::new(0),
    });

    let (ready_tx, ready_rx) = sync_channel::<Result<()>>(1);
    let worker_shared = Arc::clone(&shared);

    let handle = thread::Builder::new()
        .name(format!("playback-{}", sound_id))
        .spawn(move || run_worker(params, worker_shared, ready_tx))?;

    match ready_rx.recv() {
        Ok(Ok(())) => Ok(ActiveSession {
            sound_id,
            owner,
            total_frames,
            shared,
            thread: Some(handle),
        }),
        Ok(Err(e)) => {
            let _ = handle.join();
            Err(e)
        }
        Err(_) => {
            let _ = handle.join();
            Err(Error::Internal(format!(
                "Playback worker for sound {} exited before starting",
                sound_id
            )))
        }
    }
}

/// Sends the terminal notification when the worker exits, including by panic
struct StoppedNotice {
    sound_id: i64,
    connection: Connection,
    shared: Arc<SessionShared>,
}

impl Drop for StoppedNotice {
    fn drop(&mut self) {
        let final_state = if self.shared.cancel.load(Ordering::SeqCst) {
            SessionState::Stopped
        } else {
            SessionState::Completed
        };
        self.shared.set_state(final_state);

        info!(
            "Playback of sound {} ended ({:?}) after {} frames",
            self.sound_id,
            final_state,
            self.shared.cursor.load(Ordering::SeqCst)
        );

        let message = OutgoingMessage::SoundStopped {
            sound_id: Some(self.sound_id),
        };
        if let Err(e) = self.connection.send(&message) {
            debug!("Could not deliver SOUND_STOPPED for {}: {}", self.sound_id, e);
        }
    }
}

fn run_worker(params: SessionParams, shared: Arc<SessionShared>, ready: SyncSender<Result<()>>) {
    let SessionParams {
        sound_id,
        mut source,
        backend,
        routed_device,
        chunk_size,
        settings,
        connection,
    } = params;

    let spec = StreamSpec {
        sample_rate: source.sample_rate(),
        channels: source.channels(),
        chunk_frames: chunk_size,
    };

    let mut monitor = match backend.open_output(OutputTarget::Default, spec) {
        Ok(stream) => stream,
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };

    let mut routed = match backend.open_output(OutputTarget::Device(routed_device), spec) {
        Ok(stream) => stream,
        Err(e) => {
            if let Err(close_err) = monitor.abort() {
                warn!("Failed to close monitor output: {}", close_err);
            }
            let _ = ready.send(Err(e));
            return;
        }
    };

    let _notice = StoppedNotice {
        sound_id,
        connection: connection.clone(),
        shared: Arc::clone(&shared),
    };

    shared.set_state(SessionState::Playing);
    if let Err(e) = connection.send(&OutgoingMessage::SoundPlaying { sound_id }) {
        debug!("Could not deliver SOUND_PLAYING for {}: {}", sound_id, e);
    }
    let _ = ready.send(Ok(()));

    info!(
        "Playing sound {} ({} Hz, {} ch, {} frames/chunk)",
        sound_id, spec.sample_rate, spec.channels, chunk_size
    );

    let result = stream_chunks(
        source.as_mut(),
        monitor.as_mut(),
        routed.as_mut(),
        &settings,
        &shared,
        chunk_size,
    );
    if let Err(e) = result {
        error!("Playback of sound {} aborted: {}", sound_id, e);
    }

    let cancelled = shared.cancel.load(Ordering::SeqCst);
    for (label, output) in [("monitor", monitor), ("routed", routed)] {
        let result = if cancelled { output.abort() } else { output.close() };
        if let Err(e) = result {
            warn!("Failed to close {} output: {}", label, e);
        }
    }
}

/// Main loop: read a chunk, scale per output, write to both.
///
/// Settings are re-read every chunk so volume changes land at the next
/// chunk boundary.
fn stream_chunks(
    source: &mut dyn AudioSource,
    monitor: &mut dyn OutputStream,
    routed: &mut dyn OutputStream,
    settings: &LiveSettings,
    shared: &SessionShared,
    chunk_size: usize,
) -> Result<()> {
    let channels = source.channels() as usize;
    let mut chunk = Vec::with_capacity(chunk_size * channels);
    let mut monitor_buf = Vec::with_capacity(chunk_size * channels);
    let mut routed_buf = Vec::with_capacity(chunk_size * channels);

    while !shared.cancel.load(Ordering::SeqCst) {
        let frames = source.read_frames(chunk_size, &mut chunk)?;
        if frames == 0 {
            break;
        }

        let gains = Gains::from_settings(&settings.snapshot());
        scale_into(&chunk, gains.monitor, &mut monitor_buf);
        scale_into(&chunk, gains.routed, &mut routed_buf);

        monitor.write(&monitor_buf)?;
        routed.write(&routed_buf)?;

        shared.cursor.fetch_add(frames as u64, Ordering::SeqCst);
    }

    Ok(())
}

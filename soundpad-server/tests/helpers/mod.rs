//! Test helpers for soundpad-server integration tests
//!
//! - fake_audio: scripted backend with recording outputs
//! - audio_generator: WAV fixtures written with hound
//! - wait helpers for messages arriving from the playback worker

#![allow(dead_code)]

pub mod audio_generator;
pub mod fake_audio;

pub use audio_generator::write_constant_wav;
pub use fake_audio::{FakeBackend, FakeClip, RecordedOutput, FAKE_HOST, ROUTED_FRAGMENT};

use serde_json::Value;
use soundpad_server::config::RoutingTarget;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::mpsc::UnboundedReceiver;

/// Generous upper bound for anything the worker thread does
pub const WAIT: Duration = Duration::from_secs(5);

/// Routing that matches [`FakeBackend::with_routed_device`]
pub fn fake_routing() -> RoutingTarget {
    RoutingTarget {
        name_fragment: ROUTED_FRAGMENT.to_string(),
        host: FAKE_HOST.to_string(),
    }
}

/// Poll for the next message from a synchronous test thread
pub fn next_message(rx: &mut UnboundedReceiver<Value>, timeout: Duration) -> Option<Value> {
    let deadline = Instant::now() + timeout;
    loop {
        match rx.try_recv() {
            Ok(message) => return Some(message),
            Err(TryRecvError::Disconnected) => return None,
            Err(TryRecvError::Empty) => {
                if Instant::now() >= deadline {
                    return None;
                }
                std::thread::sleep(Duration::from_millis(2));
            }
        }
    }
}

/// Await the next message from an async test
pub async fn recv_message(rx: &mut UnboundedReceiver<Value>) -> Value {
    tokio::time::timeout(WAIT, rx.recv())
        .await
        .expect("timed out waiting for message")
        .expect("connection channel closed")
}

/// Poll `condition` until it holds or [`WAIT`] elapses
pub fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + WAIT;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    condition()
}

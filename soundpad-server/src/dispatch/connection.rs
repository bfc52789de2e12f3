//! Per-client outbound channel
//!
//! Handlers and the playback worker never touch the socket. They push JSON
//! values into an unbounded channel; the connection's writer task drains it
//! onto the wire in order.

use crate::error::{Error, Result};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Cloneable handle for sending messages to one client
#[derive(Debug, Clone)]
pub struct Connection {
    id: Uuid,
    tx: mpsc::UnboundedSender<Value>,
}

impl Connection {
    /// Create a connection handle and the receiver its writer task drains
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Value>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                id: Uuid::new_v4(),
                tx,
            },
            rx,
        )
    }

    /// Identifier used in log lines
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Queue a message. Safe to call from any thread, never blocks.
    pub fn send<T: Serialize>(&self, message: &T) -> Result<()> {
        let value = serde_json::to_value(message)
            .map_err(|e| Error::Internal(format!("Failed to serialize message: {}", e)))?;
        self.tx.send(value).map_err(|_| Error::ConnectionClosed)
    }
}

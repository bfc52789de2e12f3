//! Event dispatch
//!
//! Routes each inbound JSON message to the handler registered for its
//! `type` tag and turns every failure into exactly one error reply on the
//! same connection:
//! - domain errors ([`EventError`]) become `{type: <their tag>, error}`
//! - anything else, including a handler panic, becomes `GENERIC_ERROR`
//!
//! The table is built once at startup and is read-only afterwards.

pub mod connection;
pub mod fields;
pub mod handlers;

pub use connection::Connection;
pub use handlers::build_dispatcher;

use crate::error::{Error, EventError, Result};
use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value;
use soundpad_common::events::{ErrorEvent, ErrorMessage, IncomingEvent};
use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Boxed future returned by every registered handler
pub type HandlerFuture = BoxFuture<'static, Result<()>>;

type Handler = Arc<dyn Fn(Connection, Value) -> HandlerFuture + Send + Sync>;

/// Tag → handler table
#[derive(Default)]
pub struct EventDispatcher {
    handlers: HashMap<IncomingEvent, Handler>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `event`.
    ///
    /// Fails with [`Error::Registration`] if the tag already has a handler.
    pub fn register<F, Fut>(&mut self, event: IncomingEvent, handler: F) -> Result<()>
    where
        F: Fn(Connection, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        if self.handlers.contains_key(&event) {
            return Err(Error::Registration(format!(
                "Handler for {} already registered",
                event
            )));
        }

        self.handlers
            .insert(event, Arc::new(move |conn, message| handler(conn, message).boxed()));
        Ok(())
    }

    pub fn is_registered(&self, event: IncomingEvent) -> bool {
        self.handlers.contains_key(&event)
    }

    /// Number of registered tags
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Dispatch one raw text frame
    pub async fn handle_text(&self, conn: &Connection, text: &str) {
        match serde_json::from_str::<Value>(text) {
            Ok(message) => self.handle(conn, message).await,
            Err(e) => {
                warn!("Connection {}: invalid JSON frame: {}", conn.id(), e);
                send_reply(conn, ErrorMessage::new(ErrorEvent::GenericError, format!("Invalid JSON: {}", e)));
            }
        }
    }

    /// Dispatch one decoded message. Never fails: errors are replied.
    pub async fn handle(&self, conn: &Connection, message: Value) {
        if let Err(err) = self.route(conn, message).await {
            report_error(conn, &err);
        }
    }

    async fn route(&self, conn: &Connection, message: Value) -> Result<()> {
        let tag = match message.get("type") {
            Some(Value::String(tag)) if !tag.is_empty() => tag.clone(),
            _ => return Err(EventError::MissingField("type".to_string()).into()),
        };

        let handler = tag
            .parse::<IncomingEvent>()
            .ok()
            .and_then(|event| self.handlers.get(&event).cloned())
            .ok_or_else(|| EventError::UnsupportedEvent(tag.clone()))?;

        debug!("Connection {}: dispatching {}", conn.id(), tag);

        let conn = conn.clone();
        let invocation = AssertUnwindSafe(async move { handler(conn, message).await });
        match invocation.catch_unwind().await {
            Ok(result) => result,
            Err(panic) => Err(Error::Internal(format!(
                "Handler for {} panicked: {}",
                tag,
                panic_message(panic.as_ref())
            ))),
        }
    }
}

/// Convert a failed dispatch into its wire reply
fn report_error(conn: &Connection, err: &Error) {
    let reply = match err.as_event() {
        Some(event_err) => {
            warn!("Connection {}: {}", conn.id(), event_err);
            ErrorMessage::new(event_err.kind(), event_err.to_string())
        }
        None => {
            error!("Connection {}: unhandled error: {:?}", conn.id(), err);
            ErrorMessage::new(ErrorEvent::GenericError, err.to_string())
        }
    };
    send_reply(conn, reply);
}

fn send_reply(conn: &Connection, reply: ErrorMessage) {
    if let Err(e) = conn.send(&reply) {
        debug!("Connection {}: dropping error reply: {}", conn.id(), e);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

//! WebSocket server
//!
//! Routes:
//! - `GET /` upgrades to the event protocol (text frames, one JSON object each)
//! - `GET /health` reports liveness
//!
//! Per connection, inbound frames are dispatched strictly in arrival order on
//! the connection task. Outbound messages (replies and playback
//! notifications) flow through the connection's channel into a dedicated
//! writer task. When the client disconnects the server shuts down.

use crate::dispatch::{Connection, EventDispatcher};
use crate::error::Result;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use soundpad_common::events::{ErrorEvent, ErrorMessage};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

/// State shared by every route
#[derive(Clone)]
pub struct ServerState {
    pub dispatcher: Arc<EventDispatcher>,
    /// Cancelled when the server should stop accepting and exit
    pub shutdown: CancellationToken,
}

impl ServerState {
    pub fn new(dispatcher: EventDispatcher, shutdown: CancellationToken) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
            shutdown,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
}

/// Build the application router
pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/", get(ws_handler))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until the shutdown token is cancelled
pub async fn run(listener: TcpListener, state: ServerState) -> Result<()> {
    let shutdown = state.shutdown.clone();
    if let Ok(addr) = listener.local_addr() {
        info!("Listening on ws://{}/", addr);
    }

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    info!("Server stopped");
    Ok(())
}

/// GET /health
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        module: "soundpad-server".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// WebSocket upgrade handler
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<ServerState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: ServerState) {
    let (conn, mut outbox) = Connection::new();
    info!("Client connected: {}", conn.id());

    let (mut sink, mut inbound) = socket.split();

    let writer = tokio::spawn(async move {
        while let Some(message) = outbox.recv().await {
            if sink.send(Message::Text(message.to_string().into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(frame) = inbound.next().await {
        match frame {
            Ok(Message::Text(text)) => state.dispatcher.handle_text(&conn, &text).await,
            Ok(Message::Binary(_)) => {
                let reply = ErrorMessage::new(ErrorEvent::GenericError, "Binary frames are not supported");
                if conn.send(&reply).is_err() {
                    break;
                }
            }
            Ok(Message::Close(_)) => break,
            // Ping/pong are answered by the transport
            Ok(_) => {}
            Err(e) => {
                warn!("Connection {}: receive error: {}", conn.id(), e);
                break;
            }
        }
    }

    info!("Client disconnected: {}", conn.id());
    writer.abort();

    debug!("Requesting server shutdown after disconnect");
    state.shutdown.cancel();
}

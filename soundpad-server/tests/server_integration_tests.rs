//! WebSocket round trips against a live server on an ephemeral port

mod helpers;

use futures::{SinkExt, Stream, StreamExt};
use helpers::{fake_routing, FakeBackend, WAIT};
use serde_json::{json, Value};
use soundpad_common::db::init_in_memory;
use soundpad_server::dispatch::build_dispatcher;
use soundpad_server::playback::PlaybackController;
use soundpad_server::server::{self, ServerState};
use soundpad_server::services::ConfigService;
use soundpad_server::{AppContext, LiveSettings};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

async fn start_server() -> (SocketAddr, CancellationToken, JoinHandle<soundpad_server::Result<()>>) {
    let pool = init_in_memory().await.unwrap();
    let settings = Arc::new(LiveSettings::new(ConfigService::hydrate(&pool).await.unwrap()));
    let controller = Arc::new(PlaybackController::new(
        Arc::new(FakeBackend::new().with_routed_device()),
        Arc::clone(&settings),
        fake_routing(),
        64,
    ));
    let ctx = AppContext::new(pool, settings, controller);
    let dispatcher = build_dispatcher(&ctx).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = CancellationToken::new();
    let handle = tokio::spawn(server::run(listener, ServerState::new(dispatcher, shutdown.clone())));

    (addr, shutdown, handle)
}

async fn next_json<S>(stream: &mut S) -> Value
where
    S: Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    loop {
        let frame = tokio::time::timeout(WAIT, stream.next())
            .await
            .expect("timed out waiting for frame")
            .expect("stream ended")
            .expect("receive error");
        if let Message::Text(text) = frame {
            return serde_json::from_str(&text).unwrap();
        }
    }
}

#[tokio::test]
async fn test_round_trip_and_shutdown_on_disconnect() {
    let (addr, shutdown, handle) = start_server().await;

    let (socket, _) = tokio_tungstenite::connect_async(format!("ws://{}/", addr))
        .await
        .unwrap();
    let (mut tx, mut rx) = socket.split();

    let add = json!({ "type": "SOUND_ADD", "data": { "name": "Horn", "path": "/sounds/horn.mp3" } });
    tx.send(Message::Text(add.to_string())).await.unwrap();
    let reply = next_json(&mut rx).await;
    assert_eq!(reply["type"], "SOUND_ADDED");
    assert_eq!(reply["sound"]["name"], "Horn");

    tx.send(Message::Text(json!({ "type": "SOUND_FETCH" }).to_string()))
        .await
        .unwrap();
    let reply = next_json(&mut rx).await;
    assert_eq!(reply["type"], "SOUND_FETCHED");
    assert_eq!(reply["sounds"].as_array().unwrap().len(), 1);

    // Frames are answered in order, errors included
    tx.send(Message::Text("{broken".to_string())).await.unwrap();
    tx.send(Message::Text(json!({ "type": "CONFIG_FETCH" }).to_string()))
        .await
        .unwrap();
    assert_eq!(next_json(&mut rx).await["type"], "GENERIC_ERROR");
    assert_eq!(next_json(&mut rx).await["type"], "CONFIG_FETCHED");

    tx.send(Message::Close(None)).await.unwrap();

    let result = tokio::time::timeout(WAIT, handle)
        .await
        .expect("server did not stop after disconnect")
        .unwrap();
    assert!(result.is_ok());
    assert!(shutdown.is_cancelled());
}

#[tokio::test]
async fn test_health_over_http() {
    let (addr, shutdown, handle) = start_server().await;

    let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
    tokio::io::AsyncWriteExt::write_all(
        &mut stream,
        b"GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    )
    .await
    .unwrap();
    let mut response = String::new();
    tokio::io::AsyncReadExt::read_to_string(&mut stream, &mut response)
        .await
        .unwrap();

    assert!(response.starts_with("HTTP/1.1 200"));
    assert!(response.contains("\"status\":\"ok\""));

    shutdown.cancel();
    assert!(tokio::time::timeout(WAIT, handle).await.unwrap().unwrap().is_ok());
}

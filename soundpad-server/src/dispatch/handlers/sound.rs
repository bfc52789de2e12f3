//! Clip handlers: SOUND_ADD, SOUND_UPDATE, SOUND_REMOVE, SOUND_FETCH,
//! SOUND_PLAY, SOUND_STOP

use crate::dispatch::fields::{optional_str, required, required_id, required_str};
use crate::dispatch::{Connection, EventDispatcher};
use crate::error::{Error, Result};
use crate::state::AppContext;
use serde_json::Value;
use soundpad_common::db::{ClipPatch, NewClip};
use soundpad_common::events::{IncomingEvent, OutgoingMessage};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

pub fn register(dispatcher: &mut EventDispatcher, ctx: &AppContext) -> Result<()> {
    let c = ctx.clone();
    dispatcher.register(IncomingEvent::SoundAdd, move |conn, msg| sound_add(c.clone(), conn, msg))?;

    let c = ctx.clone();
    dispatcher.register(IncomingEvent::SoundUpdate, move |conn, msg| sound_update(c.clone(), conn, msg))?;

    let c = ctx.clone();
    dispatcher.register(IncomingEvent::SoundRemove, move |conn, msg| sound_remove(c.clone(), conn, msg))?;

    let c = ctx.clone();
    dispatcher.register(IncomingEvent::SoundFetch, move |conn, msg| sound_fetch(c.clone(), conn, msg))?;

    let c = ctx.clone();
    dispatcher.register(IncomingEvent::SoundPlay, move |conn, msg| sound_play(c.clone(), conn, msg))?;

    let c = ctx.clone();
    dispatcher.register(IncomingEvent::SoundStop, move |conn, msg| sound_stop(c.clone(), conn, msg))?;

    Ok(())
}

async fn sound_add(ctx: AppContext, conn: Connection, message: Value) -> Result<()> {
    required(&message, "data")?;
    let clip = NewClip {
        name: required_str(&message, "data.name")?.to_string(),
        path: required_str(&message, "data.path")?.to_string(),
    };

    let sound = ctx.clips.create(clip).await?;
    conn.send(&OutgoingMessage::SoundAdded { sound })
}

async fn sound_update(ctx: AppContext, conn: Connection, message: Value) -> Result<()> {
    required(&message, "data")?;
    let id = required_id(&message, "data.id")?;
    let patch = ClipPatch {
        name: optional_str(&message, "data.name")?,
        path: optional_str(&message, "data.path")?,
    };

    let sound = ctx.clips.update(id, patch).await?;
    conn.send(&OutgoingMessage::SoundUpdated { sound })
}

async fn sound_remove(ctx: AppContext, conn: Connection, message: Value) -> Result<()> {
    let sound_id = required_id(&message, "soundId")?;

    // A clip that is currently playing keeps playing
    ctx.clips.remove(sound_id).await?;
    conn.send(&OutgoingMessage::SoundRemoved { sound_id })
}

async fn sound_fetch(ctx: AppContext, conn: Connection, _message: Value) -> Result<()> {
    let sounds = ctx.clips.list().await?;
    conn.send(&OutgoingMessage::SoundFetched { sounds })
}

async fn sound_play(ctx: AppContext, conn: Connection, message: Value) -> Result<()> {
    let sound_id = required_id(&message, "soundId")?;

    let clip = ctx.clips.get(sound_id).await?;
    let clip = ctx.clips.refresh_validity(&clip).await?;
    debug!("Connection {}: playing sound {} from {}", conn.id(), clip.id, clip.path);

    let controller = Arc::clone(&ctx.controller);
    let path = PathBuf::from(clip.path);
    tokio::task::spawn_blocking(move || controller.play(&path, sound_id, conn))
        .await
        .map_err(|e| Error::Internal(format!("Playback task failed: {}", e)))?
}

async fn sound_stop(ctx: AppContext, conn: Connection, _message: Value) -> Result<()> {
    let controller = Arc::clone(&ctx.controller);
    let stopped = tokio::task::spawn_blocking(move || controller.stop())
        .await
        .map_err(|e| Error::Internal(format!("Playback task failed: {}", e)))?;

    // A session started from this connection already queued its own
    // SOUND_STOPPED here; anyone else gets an explicit reply
    match stopped {
        Some(session) if session.owner == conn.id() => Ok(()),
        Some(session) => conn.send(&OutgoingMessage::SoundStopped {
            sound_id: Some(session.sound_id),
        }),
        None => conn.send(&OutgoingMessage::SoundStopped { sound_id: None }),
    }
}

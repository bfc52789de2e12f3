//! Event handlers
//!
//! Each module exposes `register(&mut EventDispatcher, &AppContext)`. A
//! handler either sends its reply on the connection or returns an error for
//! the dispatcher to report; `SOUND_PLAY` instead relies on the playback
//! worker's `SOUND_PLAYING` notification as its reply.

pub mod config;
pub mod sound;

use crate::dispatch::EventDispatcher;
use crate::error::Result;
use crate::state::AppContext;

/// Register every handler module
pub fn register_all(dispatcher: &mut EventDispatcher, ctx: &AppContext) -> Result<()> {
    sound::register(dispatcher, ctx)?;
    config::register(dispatcher, ctx)?;
    Ok(())
}

/// Build the complete dispatch table
pub fn build_dispatcher(ctx: &AppContext) -> Result<EventDispatcher> {
    let mut dispatcher = EventDispatcher::new();
    register_all(&mut dispatcher, ctx)?;
    Ok(dispatcher)
}

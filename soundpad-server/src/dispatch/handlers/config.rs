//! Config handlers: CONFIG_FETCH, CONFIG_UPDATE

use crate::dispatch::fields::required;
use crate::dispatch::{Connection, EventDispatcher};
use crate::error::Result;
use crate::state::AppContext;
use serde_json::Value;
use soundpad_common::events::{IncomingEvent, OutgoingMessage};

pub fn register(dispatcher: &mut EventDispatcher, ctx: &AppContext) -> Result<()> {
    let c = ctx.clone();
    dispatcher.register(IncomingEvent::ConfigFetch, move |conn, msg| config_fetch(c.clone(), conn, msg))?;

    let c = ctx.clone();
    dispatcher.register(IncomingEvent::ConfigUpdate, move |conn, msg| config_update(c.clone(), conn, msg))?;

    Ok(())
}

async fn config_fetch(ctx: AppContext, conn: Connection, _message: Value) -> Result<()> {
    conn.send(&OutgoingMessage::ConfigFetched {
        config: ctx.config.live(),
    })
}

async fn config_update(ctx: AppContext, conn: Connection, message: Value) -> Result<()> {
    let payload = required(&message, "config")?;
    let config = ctx.config.update(payload).await?;
    conn.send(&OutgoingMessage::ConfigUpdated { config })
}

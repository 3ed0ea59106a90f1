//! Built-in MPD commands, one module per command group.

mod connection;
mod current_playlist;
mod music_db;
mod playback;
mod status;
mod stored_playlists;

use crate::context::Context;
use crate::error::{ProtocolError, Result};
use crate::registry::CommandRegistry;
use core_library::models::Playlist;
use core_library::LibraryError;
use core_service::Backend;
use std::sync::Arc;

pub(crate) fn register_all(registry: &mut CommandRegistry) -> Result<()> {
    connection::register(registry)?;
    status::register(registry)?;
    playback::register(registry)?;
    current_playlist::register(registry)?;
    music_db::register(registry)?;
    stored_playlists::register(registry)?;
    Ok(())
}

/// Stored playlist called `name`, searched across backends in order.
async fn find_playlist(ctx: &Context, name: &str) -> Result<(Arc<Backend>, Playlist)> {
    for backend in ctx.core().router().all() {
        match backend.stored_playlists.get(name).await {
            Ok(playlist) => return Ok((Arc::clone(backend), playlist)),
            Err(LibraryError::NotFound { .. }) => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Err(ProtocolError::NotFound("No such playlist".to_string()))
}

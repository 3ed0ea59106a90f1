//! Stored playlist commands.
//!
//! Playlists are looked up by name across every backend; new playlists are
//! saved through the default backend.

use super::find_playlist;
use crate::args::{arg, Args};
use crate::context::Context;
use crate::error::{ProtocolError, Result};
use crate::format;
use crate::registry::{CommandRegistry, Response};
use core_library::models::{Playlist, Track};
use futures::FutureExt;

pub(super) fn register(registry: &mut CommandRegistry) -> Result<()> {
    registry.register("listplaylists", |ctx, args| listplaylists(ctx, args).boxed())?;
    registry.register(&format!("listplaylist {}", arg("name")), |ctx, args| {
        listplaylist(ctx, args).boxed()
    })?;
    registry.register(&format!("listplaylistinfo {}", arg("name")), |ctx, args| {
        listplaylistinfo(ctx, args).boxed()
    })?;
    registry.register(&format!("load {}", arg("name")), |ctx, args| {
        load(ctx, args).boxed()
    })?;
    registry.register(&format!("save {}", arg("name")), |ctx, args| {
        save(ctx, args).boxed()
    })?;
    registry.register(&format!("rm {}", arg("name")), |ctx, args| {
        rm(ctx, args).boxed()
    })?;
    registry.register(
        &format!("rename {} {}", arg("old"), arg("new")),
        |ctx, args| rename(ctx, args).boxed(),
    )?;
    Ok(())
}

async fn ensure_absent(ctx: &Context, name: &str) -> Result<()> {
    match find_playlist(ctx, name).await {
        Ok(_) => Err(ProtocolError::Exist("Playlist already exists".to_string())),
        Err(ProtocolError::NotFound(_)) => Ok(()),
        Err(e) => Err(e),
    }
}

async fn listplaylists(ctx: &mut Context, _args: Args) -> Result<Response> {
    let mut lines = Vec::new();
    for backend in ctx.core().router().all() {
        for playlist in backend.stored_playlists.playlists().await {
            lines.extend(format::stored_playlist_lines(&playlist));
        }
    }
    Ok(lines.into())
}

async fn listplaylist(ctx: &mut Context, args: Args) -> Result<Response> {
    let (_, playlist) = find_playlist(ctx, args.required("name")?).await?;
    Ok(playlist
        .tracks
        .iter()
        .map(|track| format!("file: {}", track.uri))
        .collect::<Vec<_>>()
        .into())
}

async fn listplaylistinfo(ctx: &mut Context, args: Args) -> Result<Response> {
    let (_, playlist) = find_playlist(ctx, args.required("name")?).await?;
    Ok(format::tracks_lines(&playlist.tracks).into())
}

/// Appends the playlist's tracks to the tracklist.
async fn load(ctx: &mut Context, args: Args) -> Result<Response> {
    let (_, playlist) = find_playlist(ctx, args.required("name")?).await?;
    ctx.backend().tracklist.append(playlist.tracks);
    Ok(Response::ok())
}

/// Saves the tracklist as a new playlist.
async fn save(ctx: &mut Context, args: Args) -> Result<Response> {
    let name = args.required("name")?;
    ensure_absent(ctx, name).await?;

    let backend = ctx.backend();
    let tracks: Vec<Track> = backend
        .tracklist
        .tracks()
        .into_iter()
        .map(|tl_track| tl_track.track)
        .collect();

    let created = backend.stored_playlists.create(name).await?;
    let filled = Playlist { tracks, ..created };
    backend.stored_playlists.save(&filled).await?;
    Ok(Response::ok())
}

async fn rm(ctx: &mut Context, args: Args) -> Result<Response> {
    let (backend, playlist) = find_playlist(ctx, args.required("name")?).await?;
    backend.stored_playlists.delete(&playlist).await?;
    Ok(Response::ok())
}

async fn rename(ctx: &mut Context, args: Args) -> Result<Response> {
    let (backend, playlist) = find_playlist(ctx, args.required("old")?).await?;
    let new_name = args.required("new")?;
    ensure_absent(ctx, new_name).await?;

    backend.stored_playlists.rename(&playlist, new_name).await?;
    Ok(Response::ok())
}

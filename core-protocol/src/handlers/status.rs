//! Status queries and idle.

use crate::args::{tokenize, Args};
use crate::context::Context;
use crate::error::{ProtocolError, Result};
use crate::format;
use crate::registry::{CommandRegistry, Response};
use core_runtime::events::SUBSYSTEMS;
use futures::FutureExt;
use std::collections::HashSet;
use std::time::Duration;

pub(super) fn register(registry: &mut CommandRegistry) -> Result<()> {
    registry.register("status", |ctx, args| status(ctx, args).boxed())?;
    registry.register("currentsong", |ctx, args| currentsong(ctx, args).boxed())?;
    registry.register("stats", |ctx, args| stats(ctx, args).boxed())?;
    registry.register("clearerror", |ctx, args| clearerror(ctx, args).boxed())?;
    registry.register("idle(?: (?P<subsystems>.+))?", |ctx, args| {
        idle(ctx, args).boxed()
    })?;
    registry.register("noidle", |ctx, args| noidle(ctx, args).boxed())?;
    Ok(())
}

async fn status(ctx: &mut Context, _args: Args) -> Result<Response> {
    let status = ctx.backend().playback.status().await?;
    Ok(format::status_lines(&status).into())
}

async fn currentsong(ctx: &mut Context, _args: Args) -> Result<Response> {
    let tracklist = &ctx.backend().tracklist;
    let lines = tracklist
        .current()
        .and_then(|current| {
            tracklist
                .position_of(current.id)
                .map(|position| format::tl_track_lines(&current, position))
        })
        .unwrap_or_default();
    Ok(lines.into())
}

async fn stats(ctx: &mut Context, _args: Args) -> Result<Response> {
    let mut artists = HashSet::new();
    let mut albums = HashSet::new();
    let mut songs = 0usize;
    let mut db_playtime = Duration::ZERO;

    for backend in ctx.core().router().all() {
        for track in backend.library.tracks() {
            songs += 1;
            db_playtime += track.length.unwrap_or_default();
            artists.extend(track.artist_names().map(str::to_string));
            if let Some(album) = track.album_name() {
                albums.insert(album.to_string());
            }
        }
    }

    Ok(vec![
        format!("artists: {}", artists.len()),
        format!("albums: {}", albums.len()),
        format!("songs: {}", songs),
        format!("uptime: {}", ctx.core().uptime().as_secs()),
        format!("db_playtime: {}", db_playtime.as_secs()),
        "playtime: 0".to_string(),
    ]
    .into())
}

async fn clearerror(_ctx: &mut Context, _args: Args) -> Result<Response> {
    Ok(Response::ok())
}

async fn idle(_ctx: &mut Context, args: Args) -> Result<Response> {
    let subsystems = match args.get("subsystems") {
        Some(raw) => tokenize(raw)?,
        None => Vec::new(),
    };
    if let Some(unknown) = subsystems.iter().find(|s| !SUBSYSTEMS.contains(&s.as_str())) {
        return Err(ProtocolError::InvalidArgument(format!(
            "Unrecognized idle event: {}",
            unknown
        )));
    }
    Ok(Response::Idle(subsystems))
}

/// Only meaningful while idling, which the session handles itself.
async fn noidle(_ctx: &mut Context, _args: Args) -> Result<Response> {
    Ok(Response::ok())
}

//! Tracklist commands.

use crate::args::{arg, Args};
use crate::context::Context;
use crate::error::{ProtocolError, Result};
use crate::format;
use crate::registry::{CommandRegistry, Response};
use core_library::models::Track;
use core_library::LibraryError;
use core_playback::tracklist::{TlId, TlTrack};
use futures::FutureExt;

pub(super) fn register(registry: &mut CommandRegistry) -> Result<()> {
    registry.register(&format!("add {}", arg("uri")), |ctx, args| {
        add(ctx, args).boxed()
    })?;
    registry.register(
        &format!("addid {}(?: {})?", arg("uri"), arg("pos")),
        |ctx, args| addid(ctx, args).boxed(),
    )?;
    registry.register(&format!("delete {}", arg("range")), |ctx, args| {
        delete(ctx, args).boxed()
    })?;
    registry.register(&format!("deleteid {}", arg("id")), |ctx, args| {
        deleteid(ctx, args).boxed()
    })?;
    registry.register("clear", |ctx, args| clear(ctx, args).boxed())?;
    registry.register(
        &format!("move {} {}", arg("range"), arg("to")),
        |ctx, args| move_range(ctx, args).boxed(),
    )?;
    registry.register(
        &format!("moveid {} {}", arg("id"), arg("to")),
        |ctx, args| moveid(ctx, args).boxed(),
    )?;
    registry.register(&format!("shuffle(?: {})?", arg("range")), |ctx, args| {
        shuffle(ctx, args).boxed()
    })?;
    registry.register("playlist", |ctx, args| playlist(ctx, args).boxed())?;
    registry.register(&format!("playlistinfo(?: {})?", arg("range")), |ctx, args| {
        playlistinfo(ctx, args).boxed()
    })?;
    registry.register(&format!("playlistid(?: {})?", arg("id")), |ctx, args| {
        playlistid(ctx, args).boxed()
    })?;
    registry.register(&format!("plchanges {}", arg("version")), |ctx, args| {
        plchanges(ctx, args).boxed()
    })?;
    Ok(())
}

/// The track at `uri`, or every track under it when `uri` names a
/// directory.
fn resolve(ctx: &Context, uri: &str) -> Result<Vec<Track>> {
    let backend = ctx.core().router().for_uri(uri)?;
    match backend.library.lookup(uri) {
        Ok(track) => Ok(vec![track]),
        Err(LibraryError::NotFound { .. }) => {
            let tracks: Vec<Track> = backend
                .library
                .tracks()
                .into_iter()
                .filter(|t| t.uri.starts_with(uri))
                .collect();
            if tracks.is_empty() {
                Err(ProtocolError::NotFound("directory or file not found".to_string()))
            } else {
                Ok(tracks)
            }
        }
        Err(e) => Err(e.into()),
    }
}

fn numbered(tracks: Vec<TlTrack>, offset: usize) -> Vec<String> {
    tracks
        .iter()
        .enumerate()
        .flat_map(|(i, tl_track)| format::tl_track_lines(tl_track, offset + i))
        .collect()
}

async fn add(ctx: &mut Context, args: Args) -> Result<Response> {
    let tracks = resolve(ctx, args.required("uri")?)?;
    ctx.backend().tracklist.append(tracks);
    Ok(Response::ok())
}

async fn addid(ctx: &mut Context, args: Args) -> Result<Response> {
    let uri = args.required("uri")?;
    let track = ctx.core().router().for_uri(uri)?.library.lookup(uri)?;
    let position = args.int::<usize>("pos")?;

    let added = ctx.backend().tracklist.add(vec![track], position)?;
    Ok(added
        .iter()
        .map(|tl_track| format!("Id: {}", tl_track.id))
        .collect::<Vec<_>>()
        .into())
}

async fn delete(ctx: &mut Context, args: Args) -> Result<Response> {
    let backend = ctx.backend();
    if let Some(range) = args.range("range", backend.tracklist.len())? {
        backend.playback.remove_position(range).await?;
    }
    Ok(Response::ok())
}

async fn deleteid(ctx: &mut Context, args: Args) -> Result<Response> {
    let id: TlId = args.required_int("id")?;
    ctx.backend().playback.remove(id).await?;
    Ok(Response::ok())
}

async fn clear(ctx: &mut Context, _args: Args) -> Result<Response> {
    ctx.backend().playback.clear().await?;
    Ok(Response::ok())
}

async fn move_range(ctx: &mut Context, args: Args) -> Result<Response> {
    let tracklist = &ctx.backend().tracklist;
    let to: usize = args.required_int("to")?;
    if let Some(range) = args.range("range", tracklist.len())? {
        tracklist.move_range(range, to)?;
    }
    Ok(Response::ok())
}

async fn moveid(ctx: &mut Context, args: Args) -> Result<Response> {
    let id: TlId = args.required_int("id")?;
    let to: usize = args.required_int("to")?;
    ctx.backend().tracklist.move_track(id, to)?;
    Ok(Response::ok())
}

async fn shuffle(ctx: &mut Context, args: Args) -> Result<Response> {
    let tracklist = &ctx.backend().tracklist;
    let range = args.range("range", tracklist.len())?;
    tracklist.shuffle(range)?;
    Ok(Response::ok())
}

/// Deprecated `POS:file` listing.
async fn playlist(ctx: &mut Context, _args: Args) -> Result<Response> {
    Ok(ctx
        .backend()
        .tracklist
        .tracks()
        .iter()
        .enumerate()
        .map(|(position, tl_track)| format!("{}:{}", position, tl_track.track.uri))
        .collect::<Vec<_>>()
        .into())
}

async fn playlistinfo(ctx: &mut Context, args: Args) -> Result<Response> {
    let tracks = ctx.backend().tracklist.tracks();

    let range = match args.get("range") {
        None | Some("-1") => 0..tracks.len(),
        Some(_) => match args.range("range", tracks.len())? {
            Some(range) if range.end <= tracks.len() => range,
            _ => return Err(ProtocolError::InvalidArgument("Bad song index".to_string())),
        },
    };
    let start = range.start;
    Ok(numbered(tracks[range].to_vec(), start).into())
}

async fn playlistid(ctx: &mut Context, args: Args) -> Result<Response> {
    let tracklist = &ctx.backend().tracklist;
    match args.int::<i64>("id")?.filter(|&id| id >= 0) {
        None => Ok(numbered(tracklist.tracks(), 0).into()),
        Some(id) => {
            let id = TlId::try_from(id)
                .map_err(|_| ProtocolError::InvalidArgument(format!("Bad song id: {}", id)))?;
            let tl_track = tracklist.get(id)?;
            let position = tracklist.position_of(id).unwrap_or_default();
            Ok(format::tl_track_lines(&tl_track, position).into())
        }
    }
}

async fn plchanges(ctx: &mut Context, args: Args) -> Result<Response> {
    let version: u64 = args.required_int("version")?;
    Ok(ctx
        .backend()
        .tracklist
        .changes_since(version)
        .iter()
        .flat_map(|(position, tl_track)| format::tl_track_lines(tl_track, *position))
        .collect::<Vec<_>>()
        .into())
}

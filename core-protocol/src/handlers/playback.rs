//! Playback control and mode switches.

use crate::args::{arg, Args};
use crate::context::Context;
use crate::error::{ProtocolError, Result};
use crate::registry::{CommandRegistry, Response};
use core_playback::controller::PlaybackState;
use core_playback::options::PlaybackOption;
use core_playback::tracklist::TlId;
use futures::FutureExt;

pub(super) fn register(registry: &mut CommandRegistry) -> Result<()> {
    registry.register(&format!("play(?: {})?", arg("pos")), |ctx, args| {
        play(ctx, args).boxed()
    })?;
    registry.register(&format!("playid(?: {})?", arg("id")), |ctx, args| {
        playid(ctx, args).boxed()
    })?;
    registry.register(&format!("pause(?: {})?", arg("state")), |ctx, args| {
        pause(ctx, args).boxed()
    })?;
    registry.register("stop", |ctx, args| stop(ctx, args).boxed())?;
    registry.register("next", |ctx, args| next(ctx, args).boxed())?;
    registry.register("previous", |ctx, args| previous(ctx, args).boxed())?;
    registry.register(
        &format!("seek {} {}", arg("pos"), arg("time")),
        |ctx, args| seek(ctx, args).boxed(),
    )?;
    registry.register(
        &format!("seekid {} {}", arg("id"), arg("time")),
        |ctx, args| seekid(ctx, args).boxed(),
    )?;
    registry.register(&format!("seekcur {}", arg("time")), |ctx, args| {
        seekcur(ctx, args).boxed()
    })?;
    registry.register(&format!("repeat {}", arg("state")), |ctx, args| {
        set_option(ctx, args, PlaybackOption::Repeat).boxed()
    })?;
    registry.register(&format!("random {}", arg("state")), |ctx, args| {
        set_option(ctx, args, PlaybackOption::Random).boxed()
    })?;
    registry.register(&format!("single {}", arg("state")), |ctx, args| {
        set_option(ctx, args, PlaybackOption::Single).boxed()
    })?;
    registry.register(&format!("consume {}", arg("state")), |ctx, args| {
        set_option(ctx, args, PlaybackOption::Consume).boxed()
    })?;
    Ok(())
}

/// `-1` or no argument means "whatever is current".
fn optional_index(args: &Args, name: &str) -> Result<Option<i64>> {
    Ok(args.int::<i64>(name)?.filter(|&value| value >= 0))
}

fn tl_id(value: i64) -> Result<TlId> {
    TlId::try_from(value)
        .map_err(|_| ProtocolError::InvalidArgument(format!("Bad song id: {}", value)))
}

fn position(value: i64) -> Result<usize> {
    usize::try_from(value)
        .map_err(|_| ProtocolError::InvalidArgument(format!("Bad song index: {}", value)))
}

/// Seconds, possibly fractional, as milliseconds.
fn time_ms(raw: &str) -> Result<i64> {
    let seconds: f64 = raw
        .parse()
        .map_err(|_| ProtocolError::InvalidArgument(format!("Number expected: {}", raw)))?;
    if !seconds.is_finite() {
        return Err(ProtocolError::InvalidArgument(format!("Number expected: {}", raw)));
    }
    Ok((seconds * 1000.0).round() as i64)
}

async fn play(ctx: &mut Context, args: Args) -> Result<Response> {
    let backend = ctx.backend();
    let id = match optional_index(&args, "pos")? {
        Some(pos) => Some(backend.tracklist.at_position(position(pos)?)?.id),
        None => None,
    };
    backend.playback.play(id).await?;
    Ok(Response::ok())
}

async fn playid(ctx: &mut Context, args: Args) -> Result<Response> {
    let id = optional_index(&args, "id")?.map(tl_id).transpose()?;
    ctx.backend().playback.play(id).await?;
    Ok(Response::ok())
}

async fn pause(ctx: &mut Context, args: Args) -> Result<Response> {
    let playback = &ctx.backend().playback;
    match args.bool("state")? {
        Some(true) => playback.pause().await?,
        Some(false) => playback.resume().await?,
        None => match playback.state().await {
            PlaybackState::Playing => playback.pause().await?,
            PlaybackState::Paused => playback.resume().await?,
            PlaybackState::Stopped => {}
        },
    }
    Ok(Response::ok())
}

async fn stop(ctx: &mut Context, _args: Args) -> Result<Response> {
    ctx.backend().playback.stop().await?;
    Ok(Response::ok())
}

async fn next(ctx: &mut Context, _args: Args) -> Result<Response> {
    ctx.backend().playback.next().await?;
    Ok(Response::ok())
}

async fn previous(ctx: &mut Context, _args: Args) -> Result<Response> {
    ctx.backend().playback.previous().await?;
    Ok(Response::ok())
}

/// Makes `id` the playing track unless it already is.
async fn play_if_not_current(ctx: &Context, id: TlId) -> Result<()> {
    let backend = ctx.backend();
    let is_current = backend.tracklist.current().map(|c| c.id) == Some(id);
    if !is_current || backend.playback.state().await == PlaybackState::Stopped {
        backend.playback.play(Some(id)).await?;
    }
    Ok(())
}

async fn seek(ctx: &mut Context, args: Args) -> Result<Response> {
    let pos = position(args.required_int("pos")?)?;
    let time = time_ms(args.required("time")?)?;
    let id = ctx.backend().tracklist.at_position(pos)?.id;

    play_if_not_current(ctx, id).await?;
    ctx.backend().playback.seek(time).await?;
    Ok(Response::ok())
}

async fn seekid(ctx: &mut Context, args: Args) -> Result<Response> {
    let id = tl_id(args.required_int("id")?)?;
    let time = time_ms(args.required("time")?)?;
    ctx.backend().tracklist.get(id)?;

    play_if_not_current(ctx, id).await?;
    ctx.backend().playback.seek(time).await?;
    Ok(Response::ok())
}

/// `TIME` is absolute; `+TIME` and `-TIME` are relative to the current
/// position.
async fn seekcur(ctx: &mut Context, args: Args) -> Result<Response> {
    let raw = args.required("time")?;
    let playback = &ctx.backend().playback;

    let target = if raw.starts_with('+') || raw.starts_with('-') {
        let current = i64::try_from(playback.time_position().await?.as_millis())
            .map_err(|_| ProtocolError::System("position out of range".to_string()))?;
        current
            .checked_add(time_ms(raw)?)
            .ok_or_else(|| ProtocolError::InvalidArgument(format!("Bad time: {}", raw)))?
    } else {
        time_ms(raw)?
    };
    playback.seek(target).await?;
    Ok(Response::ok())
}

async fn set_option(ctx: &mut Context, args: Args, option: PlaybackOption) -> Result<Response> {
    let enabled = args
        .bool("state")?
        .ok_or_else(|| ProtocolError::InvalidArgument(format!("missing {} state", option)))?;
    ctx.backend().playback.set_option(option, enabled);
    Ok(Response::ok())
}

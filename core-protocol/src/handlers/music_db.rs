//! Music database queries.

use crate::args::{arg, tokenize, Args};
use crate::context::Context;
use crate::error::{ProtocolError, Result};
use crate::format;
use crate::registry::{CommandRegistry, Response};
use core_library::models::Track;
use core_library::query::{MatchMode, Query};
use futures::FutureExt;
use tracing::info;

pub(super) fn register(registry: &mut CommandRegistry) -> Result<()> {
    registry.register("find(?: (?P<query>.+))?", |ctx, args| {
        query(ctx, args, MatchMode::Exact).boxed()
    })?;
    registry.register("search(?: (?P<query>.+))?", |ctx, args| {
        query(ctx, args, MatchMode::Search).boxed()
    })?;
    registry.register(&format!("listall(?: {})?", arg("uri")), |ctx, args| {
        listall(ctx, args).boxed()
    })?;
    registry.register(&format!("update(?: {})?", arg("uri")), |ctx, args| {
        update(ctx, args).boxed()
    })?;
    Ok(())
}

/// Library field for an MPD tag name. Unknown names pass through and are
/// rejected when the query is built.
fn field_name(tag: &str) -> String {
    match tag.to_ascii_lowercase().as_str() {
        "title" => "track".to_string(),
        "file" | "filename" => "uri".to_string(),
        other => other.to_string(),
    }
}

/// Parses `TAG VALUE [TAG VALUE ...]`.
fn parse_query(raw: Option<&str>) -> Result<Query> {
    let incorrect = || ProtocolError::InvalidArgument("incorrect arguments".to_string());
    let tokens = tokenize(raw.ok_or_else(incorrect)?)?;
    if tokens.is_empty() || tokens.len() % 2 != 0 {
        return Err(incorrect());
    }

    let pairs = tokens
        .chunks(2)
        .map(|pair| (field_name(&pair[0]), vec![pair[1].clone()]));
    Ok(Query::from_pairs(pairs)?)
}

async fn query(ctx: &mut Context, args: Args, mode: MatchMode) -> Result<Response> {
    let query = parse_query(args.get("query"))?;

    let mut tracks: Vec<Track> = Vec::new();
    for backend in ctx.core().router().all() {
        let result = match mode {
            MatchMode::Exact => backend.library.find_exact(&query),
            MatchMode::Search => backend.library.search(&query),
        };
        tracks.extend(result.tracks);
    }
    Ok(format::tracks_lines(&tracks).into())
}

async fn listall(ctx: &mut Context, args: Args) -> Result<Response> {
    let prefix = args.get("uri").unwrap_or("");
    let lines: Vec<String> = ctx
        .core()
        .router()
        .all()
        .iter()
        .flat_map(|backend| backend.library.tracks())
        .filter(|track| track.uri.starts_with(prefix))
        .map(|track| format!("file: {}", track.uri))
        .collect();
    Ok(lines.into())
}

async fn update(ctx: &mut Context, args: Args) -> Result<Response> {
    match args.get("uri") {
        Some(uri) => {
            let backend = ctx.core().router().for_uri(uri)?;
            let count = backend.library.refresh(Some(uri)).await?;
            info!(uri, count, "Library updated");
        }
        None => {
            for backend in ctx.core().router().all() {
                let count = backend.library.refresh(None).await?;
                info!(backend = backend.name(), count, "Library updated");
            }
        }
    }
    Ok(vec!["updating_db: 1".to_string()].into())
}

//! Connection commands.

use crate::args::{arg, Args};
use crate::context::Context;
use crate::error::{ProtocolError, Result};
use crate::registry::{CommandRegistry, Response};
use futures::FutureExt;

pub(super) fn register(registry: &mut CommandRegistry) -> Result<()> {
    registry.register("ping", |ctx, args| ping(ctx, args).boxed())?;
    registry.register("close", |ctx, args| close(ctx, args).boxed())?;
    registry.register(&format!("password {}", arg("password")), |ctx, args| {
        password(ctx, args).boxed()
    })?;
    registry.register("commands", |ctx, args| commands(ctx, args).boxed())?;
    registry.register("notcommands", |ctx, args| notcommands(ctx, args).boxed())?;
    Ok(())
}

async fn ping(_ctx: &mut Context, _args: Args) -> Result<Response> {
    Ok(Response::ok())
}

async fn close(_ctx: &mut Context, _args: Args) -> Result<Response> {
    Ok(Response::Close)
}

async fn password(ctx: &mut Context, args: Args) -> Result<Response> {
    if ctx.authenticate(args.required("password")?) {
        Ok(Response::ok())
    } else {
        Err(ProtocolError::IncorrectPassword)
    }
}

async fn commands(ctx: &mut Context, _args: Args) -> Result<Response> {
    Ok(command_lines(ctx, true).into())
}

async fn notcommands(ctx: &mut Context, _args: Args) -> Result<Response> {
    Ok(command_lines(ctx, false).into())
}

fn command_lines(ctx: &Context, allowed: bool) -> Vec<String> {
    ctx.registry()
        .command_names()
        .into_iter()
        .filter(|name| ctx.is_allowed(name) == allowed)
        .map(|name| format!("command: {}", name))
        .collect()
}

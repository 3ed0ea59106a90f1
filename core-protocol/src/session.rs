//! # Client Session
//!
//! One connection, one task. Requests are read line by line and answered
//! strictly in order; the next line is not read before the reply to the
//! previous one has been written.
//!
//! The session subscribes to the event bus as soon as it starts. Changes
//! that happen between two `idle` commands are therefore reported by the
//! next `idle` right away, as MPD does.

use crate::dispatcher::{Dispatcher, SessionAction};
use crate::error::Result;
use crate::registry::CommandRegistry;
use core_runtime::events::{EventStream, SUBSYSTEMS};
use core_runtime::logging::redact_if_sensitive;
use core_service::CoreService;
use std::sync::Arc;
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, Lines,
};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

/// First line sent on every connection.
pub const GREETING: &str = "OK MPD 0.16.0";

enum IdleOutcome {
    Changed(Vec<String>),
    Cancelled,
    Closed,
}

/// Serves one client until it closes the connection or sends `close`.
pub async fn run_session<S>(
    stream: S,
    core: Arc<CoreService>,
    registry: Arc<CommandRegistry>,
) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Send + Unpin,
{
    let (reader, mut writer) = tokio::io::split(stream);
    let mut lines = BufReader::new(reader).lines();
    let mut events = EventStream::new(core.events().subscribe());
    let mut dispatcher = Dispatcher::new(core, registry);

    write_lines(&mut writer, &[GREETING.to_string()]).await?;

    while let Some(line) = lines.next_line().await? {
        let request = line.trim_end_matches('\r');
        let reply = dispatcher.handle_request(request).await;
        write_lines(&mut writer, &reply.lines).await?;

        match reply.action {
            None => {}
            Some(SessionAction::Close) => break,
            Some(SessionAction::Idle(subsystems)) => {
                match wait_for_changes(&mut events, &subsystems, &mut lines).await? {
                    IdleOutcome::Changed(changed) => {
                        let mut reply: Vec<String> =
                            changed.iter().map(|s| format!("changed: {}", s)).collect();
                        reply.push("OK".to_string());
                        write_lines(&mut writer, &reply).await?;
                    }
                    IdleOutcome::Cancelled => {
                        write_lines(&mut writer, &["OK".to_string()]).await?;
                    }
                    IdleOutcome::Closed => break,
                }
            }
        }
    }

    debug!("Session ended");
    Ok(())
}

async fn write_lines<W>(writer: &mut W, lines: &[String]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    if lines.is_empty() {
        return Ok(());
    }
    let mut buffer = lines.join("\n");
    buffer.push('\n');
    writer.write_all(buffer.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

/// Blocks until a wanted subsystem changes, the client sends `noidle`, or
/// the connection goes away.
async fn wait_for_changes<R>(
    events: &mut EventStream,
    subsystems: &[String],
    lines: &mut Lines<R>,
) -> Result<IdleOutcome>
where
    R: AsyncBufRead + Unpin,
{
    let wanted: Vec<String> = if subsystems.is_empty() {
        SUBSYSTEMS.iter().map(|s| s.to_string()).collect()
    } else {
        subsystems.to_vec()
    };

    let mut changed: Vec<String> = Vec::new();
    let record = |subsystem: &str, changed: &mut Vec<String>| {
        if wanted.iter().any(|w| w == subsystem) && !changed.iter().any(|c| c == subsystem) {
            changed.push(subsystem.to_string());
        }
    };

    while let Some(event) = events.try_recv() {
        match event {
            Ok(event) => record(event.subsystem(), &mut changed),
            Err(RecvError::Lagged(_)) => {
                for subsystem in SUBSYSTEMS {
                    record(*subsystem, &mut changed);
                }
            }
            Err(RecvError::Closed) => return Ok(IdleOutcome::Closed),
        }
    }
    if !changed.is_empty() {
        return Ok(IdleOutcome::Changed(changed));
    }

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    record(event.subsystem(), &mut changed);
                    if !changed.is_empty() {
                        return Ok(IdleOutcome::Changed(changed));
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "Idle subscriber lagged");
                    for subsystem in SUBSYSTEMS {
                        record(*subsystem, &mut changed);
                    }
                    return Ok(IdleOutcome::Changed(changed));
                }
                Err(RecvError::Closed) => return Ok(IdleOutcome::Closed),
            },
            line = lines.next_line() => match line? {
                Some(line) if line.trim() == "noidle" => return Ok(IdleOutcome::Cancelled),
                Some(line) => {
                    let command = crate::args::command_name(&line);
                    warn!(
                        request = %redact_if_sensitive(command, &line),
                        "Only noidle is allowed while idle; closing connection"
                    );
                    return Ok(IdleOutcome::Closed);
                }
                None => return Ok(IdleOutcome::Closed),
            },
        }
    }
}

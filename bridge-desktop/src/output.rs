//! Channel-based audio engine client and a position-tracking engine worker.
//!
//! [`EngineOutput`] is the client stub: every [`AudioOutput`] call becomes an
//! [`EngineCommand`] sent over an mpsc channel together with a oneshot reply
//! slot, and the caller waits at most `timeout` for the answer. Whatever sits
//! at the other end of the channel (a thread driving a real decoder, a bridge
//! to another process) only has to speak [`EngineRequest`].
//!
//! [`spawn_clock_engine`] starts a worker that tracks transport state and
//! position against the Tokio clock without rendering any audio. It backs the
//! local backend when no audio device is wired and makes the playback state
//! machine testable end to end.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    output::{AudioOutput, OutputState},
};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, trace};

/// Depth of the command queue between client stubs and the engine.
const ENGINE_QUEUE_DEPTH: usize = 32;

/// Transport command understood by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCommand {
    PlayUri(String),
    SetState(OutputState),
    SetPosition(Duration),
    GetPosition,
}

/// Engine answer to an [`EngineCommand`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineReply {
    Accepted(bool),
    Position(Duration),
}

/// One request/response exchange travelling over the engine channel.
#[derive(Debug)]
pub struct EngineRequest {
    pub command: EngineCommand,
    pub reply: oneshot::Sender<EngineReply>,
}

/// Client stub implementing [`AudioOutput`] over an engine channel.
#[derive(Debug, Clone)]
pub struct EngineOutput {
    sender: mpsc::Sender<EngineRequest>,
    timeout: Duration,
}

impl EngineOutput {
    /// Wrap an existing engine channel.
    pub fn new(sender: mpsc::Sender<EngineRequest>, timeout: Duration) -> Self {
        Self { sender, timeout }
    }

    async fn call(&self, command: EngineCommand) -> Result<EngineReply> {
        trace!(?command, "Sending engine command");
        let (reply_tx, reply_rx) = oneshot::channel();
        let request = EngineRequest {
            command,
            reply: reply_tx,
        };

        let exchange = async {
            self.sender
                .send(request)
                .await
                .map_err(|_| BridgeError::Disconnected("audio engine stopped".to_string()))?;
            reply_rx.await.map_err(|_| {
                BridgeError::Disconnected("audio engine dropped the request".to_string())
            })
        };

        tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| BridgeError::Timeout(self.timeout))?
    }

    async fn call_accepted(&self, command: EngineCommand) -> Result<bool> {
        match self.call(command).await? {
            EngineReply::Accepted(accepted) => Ok(accepted),
            other => Err(BridgeError::OperationFailed(format!(
                "unexpected engine reply: {:?}",
                other
            ))),
        }
    }
}

#[async_trait]
impl AudioOutput for EngineOutput {
    async fn play_uri(&self, uri: &str) -> Result<bool> {
        self.call_accepted(EngineCommand::PlayUri(uri.to_string()))
            .await
    }

    async fn set_state(&self, state: OutputState) -> Result<bool> {
        self.call_accepted(EngineCommand::SetState(state)).await
    }

    async fn set_position(&self, position: Duration) -> Result<bool> {
        self.call_accepted(EngineCommand::SetPosition(position))
            .await
    }

    async fn get_position(&self) -> Result<Duration> {
        match self.call(EngineCommand::GetPosition).await? {
            EngineReply::Position(position) => Ok(position),
            other => Err(BridgeError::OperationFailed(format!(
                "unexpected engine reply: {:?}",
                other
            ))),
        }
    }
}

/// Engine state that follows the transport without decoding anything.
#[derive(Debug)]
struct ClockEngine {
    uri: Option<String>,
    state: OutputState,
    offset: Duration,
    started_at: Option<Instant>,
}

impl ClockEngine {
    fn new() -> Self {
        Self {
            uri: None,
            state: OutputState::Null,
            offset: Duration::ZERO,
            started_at: None,
        }
    }

    fn position(&self) -> Duration {
        match self.started_at {
            Some(started) => self.offset + started.elapsed(),
            None => self.offset,
        }
    }

    fn handle(&mut self, command: EngineCommand) -> EngineReply {
        match command {
            EngineCommand::PlayUri(uri) => {
                if uri.is_empty() {
                    return EngineReply::Accepted(false);
                }
                self.uri = Some(uri);
                self.offset = Duration::ZERO;
                self.started_at = Some(Instant::now());
                self.state = OutputState::Playing;
                EngineReply::Accepted(true)
            }
            EngineCommand::SetState(state) => EngineReply::Accepted(self.transition(state)),
            EngineCommand::SetPosition(position) => {
                if self.uri.is_none() {
                    return EngineReply::Accepted(false);
                }
                self.offset = position;
                if self.started_at.is_some() {
                    self.started_at = Some(Instant::now());
                }
                EngineReply::Accepted(true)
            }
            EngineCommand::GetPosition => EngineReply::Position(self.position()),
        }
    }

    fn transition(&mut self, state: OutputState) -> bool {
        match state {
            OutputState::Playing => {
                if self.uri.is_none() {
                    return false;
                }
                if self.started_at.is_none() {
                    self.started_at = Some(Instant::now());
                }
            }
            OutputState::Paused => {
                self.offset = self.position();
                self.started_at = None;
            }
            OutputState::Ready => {
                self.offset = Duration::ZERO;
                self.started_at = None;
            }
            OutputState::Null => {
                self.uri = None;
                self.offset = Duration::ZERO;
                self.started_at = None;
            }
        }
        debug!(from = %self.state, to = %state, "Engine state change");
        self.state = state;
        true
    }
}

/// Spawn the clock engine worker and return a client stub bound to it.
///
/// The worker exits once every [`EngineOutput`] clone has been dropped.
pub fn spawn_clock_engine(timeout: Duration) -> (EngineOutput, JoinHandle<()>) {
    let (sender, mut receiver) = mpsc::channel::<EngineRequest>(ENGINE_QUEUE_DEPTH);

    let handle = tokio::spawn(async move {
        let mut engine = ClockEngine::new();
        while let Some(request) = receiver.recv().await {
            let reply = engine.handle(request.command);
            // The caller may have timed out and gone away.
            let _ = request.reply.send(reply);
        }
        debug!("Audio engine worker stopped");
    });

    (EngineOutput::new(sender, timeout), handle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn position_advances_only_while_playing() {
        let (output, _worker) = spawn_clock_engine(Duration::from_secs(1));

        assert!(output.play_uri("file:///music/a.mp3").await.unwrap());
        tokio::time::advance(Duration::from_secs(3)).await;
        let playing = output.get_position().await.unwrap();
        assert!(playing >= Duration::from_secs(3));

        assert!(output.set_state(OutputState::Paused).await.unwrap());
        let paused = output.get_position().await.unwrap();
        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(output.get_position().await.unwrap(), paused);

        assert!(output.set_state(OutputState::Playing).await.unwrap());
        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(output.get_position().await.unwrap() >= paused + Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn seek_and_ready_reset_position() {
        let (output, _worker) = spawn_clock_engine(Duration::from_secs(1));

        assert!(!output.set_position(Duration::from_secs(5)).await.unwrap());

        output.play_uri("file:///music/a.mp3").await.unwrap();
        output.set_state(OutputState::Paused).await.unwrap();
        assert!(output.set_position(Duration::from_secs(42)).await.unwrap());
        assert_eq!(output.get_position().await.unwrap(), Duration::from_secs(42));

        output.set_state(OutputState::Ready).await.unwrap();
        assert_eq!(output.get_position().await.unwrap(), Duration::ZERO);
    }

    #[tokio::test]
    async fn playing_without_uri_is_rejected() {
        let (output, _worker) = spawn_clock_engine(Duration::from_secs(1));
        assert!(!output.set_state(OutputState::Playing).await.unwrap());
        assert!(!output.play_uri("").await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn unresponsive_engine_times_out() {
        let (sender, _receiver) = mpsc::channel(1);
        let output = EngineOutput::new(sender, Duration::from_millis(200));

        let err = output.get_position().await.unwrap_err();
        assert!(matches!(err, BridgeError::Timeout(t) if t == Duration::from_millis(200)));
    }

    #[tokio::test]
    async fn stopped_engine_is_disconnected() {
        let (sender, receiver) = mpsc::channel(1);
        drop(receiver);
        let output = EngineOutput::new(sender, Duration::from_secs(1));

        let err = output.play_uri("file:///a.mp3").await.unwrap_err();
        assert!(matches!(err, BridgeError::Disconnected(_)));
    }
}

//! Audio output engine abstraction.
//!
//! The audio engine decodes and renders audio outside the core. The core only
//! ever hands it URIs and transport commands and asks it for the current
//! position. Implementations are expected to be thin client stubs over some
//! message-passing boundary (a channel to a worker thread, a pipe to another
//! process, a socket to another machine); the playback state machine is
//! unaffected by where the engine actually lives.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::error::Result;

/// Transport state requested from the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputState {
    /// Output resources released, nothing loaded.
    Null,
    /// Resources allocated, nothing playing.
    Ready,
    /// Holding the current position.
    Paused,
    /// Rendering audio.
    Playing,
}

impl fmt::Display for OutputState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputState::Null => "null",
            OutputState::Ready => "ready",
            OutputState::Paused => "paused",
            OutputState::Playing => "playing",
        };
        f.write_str(name)
    }
}

/// Audio output engine trait
///
/// Every method is a request/response exchange with the engine and may be
/// slow. Implementations must bound the wait and surface an error instead of
/// blocking forever.
///
/// The boolean results report whether the engine accepted the request; an
/// `Err` means the exchange itself failed (timeout, engine gone).
///
/// # Example
///
/// ```ignore
/// use bridge_traits::output::{AudioOutput, OutputState};
///
/// async fn restart(output: &dyn AudioOutput, uri: &str) -> bridge_traits::Result<bool> {
///     output.set_state(OutputState::Ready).await?;
///     output.play_uri(uri).await
/// }
/// ```
#[async_trait]
pub trait AudioOutput: Send + Sync {
    /// Load `uri` and start rendering it from the beginning.
    async fn play_uri(&self, uri: &str) -> Result<bool>;

    /// Move the engine to the given transport state.
    async fn set_state(&self, state: OutputState) -> Result<bool>;

    /// Seek within the loaded stream.
    async fn set_position(&self, position: Duration) -> Result<bool>;

    /// Current position within the loaded stream.
    ///
    /// Never cached by callers; the value changes continuously while playing.
    async fn get_position(&self) -> Result<Duration>;
}

//! # Playback Provider Trait
//!
//! The narrow capability every backend implements so that the playback state
//! machine can drive it without knowing where audio actually comes from (a
//! local decode/output engine, a streaming SDK's native player, or nothing
//! at all for the dummy backend).
//!
//! ## Contract
//!
//! - `Ok(true)` means the provider accepted the command.
//! - `Ok(false)` means the provider refused it (nothing loaded, unsupported).
//! - `Err(_)` means the exchange itself failed (engine gone, timeout).
//!
//! Providers never retry; the controller reports failures upward and leaves
//! the state machine stopped.

use crate::error::Result;
use async_trait::async_trait;
use core_library::models::Track;
use std::time::Duration;

#[async_trait]
pub trait PlaybackProvider: Send + Sync {
    /// Load `track` and start playing it from the beginning.
    async fn play(&self, track: &Track) -> Result<bool>;

    /// Continue from the held position.
    async fn resume(&self) -> Result<bool>;

    /// Hold the current position.
    async fn pause(&self) -> Result<bool>;

    /// Release output resources.
    async fn stop(&self) -> Result<bool>;

    /// Seek within the current track.
    async fn seek(&self, position: Duration) -> Result<bool>;

    /// Current position, read live.
    async fn get_position(&self) -> Result<Duration>;
}

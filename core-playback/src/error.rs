//! # Playback Error Types
//!
//! Errors raised by the tracklist and playback controllers.

use bridge_traits::error::BridgeError;
use core_library::error::LibraryError;
use thiserror::Error;

/// Errors that can occur during playback operations.
#[derive(Error, Debug)]
pub enum PlaybackError {
    /// `play` was called with nothing to play.
    #[error("No current track")]
    NoCurrentTrack,

    /// Seek target is negative, past the end of the track, or refused by the
    /// provider.
    #[error("Invalid seek: {0}")]
    InvalidSeek(String),

    /// The playback provider failed or refused a command. Playback is left
    /// stopped.
    #[error("Playback provider failed: {0}")]
    Provider(String),

    /// No tracklist entry with the given id or position.
    #[error("No such song: {0}")]
    NotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Library error: {0}")]
    Library(#[from] LibraryError),
}

impl From<BridgeError> for PlaybackError {
    fn from(err: BridgeError) -> Self {
        PlaybackError::Provider(err.to_string())
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;

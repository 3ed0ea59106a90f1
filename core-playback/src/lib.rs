//! # Playback & Tracklist Module
//!
//! The backend-agnostic half of the player: the current playlist and the
//! playback state machine that walks it.
//!
//! ## Overview
//!
//! This module handles:
//! - The versioned tracklist with its current-track cursor
//! - The `STOPPED` / `PLAYING` / `PAUSED` state machine
//! - The repeat / random / single / consume switches
//! - The [`PlaybackProvider`] seam every backend implements

pub mod controller;
pub mod error;
pub mod options;
pub mod tracklist;
pub mod traits;

pub use controller::{PlaybackController, PlaybackState, PlaybackStatus};
pub use error::{PlaybackError, Result};
pub use options::{PlaybackOption, PlaybackOptions};
pub use tracklist::{TlId, TlTrack, TracklistController};
pub use traits::PlaybackProvider;

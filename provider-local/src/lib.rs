//! # Local Backend Providers
//!
//! Plays music from a local archive described by an MPD tag cache.
//!
//! ## Overview
//!
//! This module provides:
//! - MPD tag cache parsing into tracks ([`tag_cache`])
//! - M3U playlist reading and writing ([`m3u`])
//! - [`LocalLibraryProvider`], [`LocalPlaybackProvider`] and
//!   [`M3uPlaylistsProvider`] for the generic controllers
//!
//! Every URI handled here uses the [`FILE_SCHEME`](uri::FILE_SCHEME) scheme.

pub mod error;
pub mod library;
pub mod m3u;
pub mod playback;
pub mod playlists;
pub mod tag_cache;
pub mod uri;

pub use error::{LocalError, Result};
pub use library::LocalLibraryProvider;
pub use playback::LocalPlaybackProvider;
pub use playlists::M3uPlaylistsProvider;
pub use uri::FILE_SCHEME;

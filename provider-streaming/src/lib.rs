//! # Streaming Backend Providers
//!
//! Plays music from a remote streaming catalog through the service's SDK.
//!
//! ## Overview
//!
//! This module provides:
//! - The [`CatalogSession`] seam the SDK is reached through
//! - Translation of SDK objects into value models ([`translator`])
//! - Library, playback and (read-only) stored playlist providers
//!
//! Every URI handled here uses the [`URI_SCHEME`] scheme.

pub mod error;
pub mod library;
pub mod playback;
pub mod playlists;
pub mod session;
pub mod translator;

pub use error::{Result, StreamingError};
pub use library::StreamingLibraryProvider;
pub use playback::StreamingPlaybackProvider;
pub use playlists::StreamingPlaylistsProvider;
pub use session::CatalogSession;
pub use translator::Translator;

pub const URI_SCHEME: &str = "spotify:";

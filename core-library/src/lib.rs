//! # Library Module
//!
//! Value models and the two catalog-facing controllers every backend plugs
//! into.
//!
//! ## Overview
//!
//! This module manages:
//! - Immutable value models (`Track`, `Album`, `Artist`, `Playlist`)
//! - Field queries with exact and substring matching
//! - The library controller (URI index, lookup, search, refresh)
//! - The stored playlists controller (CRUD over persisted playlists)

pub mod error;
pub mod library;
pub mod models;
pub mod playlists;
pub mod query;

pub use error::{LibraryError, Result};
pub use library::{LibraryController, LibraryProvider};
pub use models::{Album, Artist, Model, Playlist, Track};
pub use playlists::{PlaylistRecord, StoredPlaylistsController, StoredPlaylistsProvider};
pub use query::{MatchMode, Query, QueryField};

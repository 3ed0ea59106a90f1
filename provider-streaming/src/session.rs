//! Streaming service SDK seam.
//!
//! The service SDK is opaque to the server: everything it hands out goes
//! through the plain data types below, and everything the server asks of it
//! goes through [`CatalogSession`].

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Artist as reported by the SDK.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SdkArtist {
    pub link: String,
    pub name: String,
    pub loaded: bool,
}

/// Album as reported by the SDK. `year` is 0 when unknown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SdkAlbum {
    pub link: String,
    pub name: String,
    pub year: i32,
    pub loaded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SdkTrack {
    pub link: String,
    pub name: String,
    pub artists: Vec<SdkArtist>,
    pub album: SdkAlbum,
    /// Position on the album, 1-based.
    pub index: u32,
    pub duration_ms: u64,
    pub loaded: bool,
}

/// Kind of entry in the user's playlist container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SdkPlaylistKind {
    Playlist,
    FolderStart,
    FolderEnd,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SdkPlaylist {
    pub link: String,
    pub name: String,
    pub kind: SdkPlaylistKind,
    pub tracks: Vec<SdkTrack>,
    pub loaded: bool,
}

/// Logged-in session with the streaming service.
///
/// Playback happens inside the SDK: the server only loads a link and drives
/// the transport.
#[async_trait]
pub trait CatalogSession: Send + Sync {
    /// Tracks saved in the user's library.
    async fn saved_tracks(&self) -> Result<Vec<SdkTrack>>;

    /// The user's playlist container, folder markers included.
    async fn playlists(&self) -> Result<Vec<SdkPlaylist>>;

    /// Loads `link` into the SDK player. Returns `false` if the SDK refused.
    async fn load(&self, link: &str) -> Result<bool>;

    async fn play(&self) -> Result<bool>;

    async fn pause(&self) -> Result<bool>;

    /// Stops and unloads the current track.
    async fn unload(&self) -> Result<bool>;

    async fn seek(&self, position_ms: u64) -> Result<bool>;

    async fn position_ms(&self) -> Result<u64>;
}

#[cfg(test)]
mockall::mock! {
    pub CatalogSession {}

    #[async_trait]
    impl CatalogSession for CatalogSession {
        async fn saved_tracks(&self) -> Result<Vec<SdkTrack>>;
        async fn playlists(&self) -> Result<Vec<SdkPlaylist>>;
        async fn load(&self, link: &str) -> Result<bool>;
        async fn play(&self) -> Result<bool>;
        async fn pause(&self) -> Result<bool>;
        async fn unload(&self) -> Result<bool>;
        async fn seek(&self, position_ms: u64) -> Result<bool>;
        async fn position_ms(&self) -> Result<u64>;
    }
}

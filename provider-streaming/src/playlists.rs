//! Read-only stored playlists from the user's playlist container.

use crate::session::CatalogSession;
use crate::translator::Translator;
use async_trait::async_trait;
use core_library::error::{LibraryError, Result};
use core_library::models::Playlist;
use core_library::playlists::{PlaylistRecord, StoredPlaylistsProvider};
use std::sync::Arc;
use tracing::debug;

pub struct StreamingPlaylistsProvider {
    session: Arc<dyn CatalogSession>,
    translator: Translator,
}

impl StreamingPlaylistsProvider {
    pub fn new(session: Arc<dyn CatalogSession>, translator: Translator) -> Self {
        Self {
            session,
            translator,
        }
    }

    fn read_only(action: &str) -> LibraryError {
        LibraryError::Unsupported(format!(
            "cannot {} streaming playlists",
            action
        ))
    }
}

#[async_trait]
impl StoredPlaylistsProvider for StreamingPlaylistsProvider {
    async fn load_all(&self) -> Result<Vec<PlaylistRecord>> {
        let playlists = self.session.playlists().await?;

        let records: Vec<PlaylistRecord> = playlists
            .iter()
            .filter_map(|p| self.translator.to_playlist(p))
            .filter_map(|playlist| {
                let Some(uri) = playlist.uri else {
                    debug!(name = %playlist.name, "Skipping playlist still loading");
                    return None;
                };
                Some(PlaylistRecord {
                    uri,
                    name: playlist.name,
                    track_uris: playlist.tracks.into_iter().map(|t| t.uri).collect(),
                    last_modified: playlist.last_modified,
                })
            })
            .collect();

        Ok(records)
    }

    async fn save(&self, _playlist: &Playlist) -> Result<Playlist> {
        Err(Self::read_only("save"))
    }

    async fn delete(&self, _playlist: &Playlist) -> Result<()> {
        Err(Self::read_only("delete"))
    }

    async fn rename(&self, _playlist: &Playlist, _new_name: &str) -> Result<Playlist> {
        Err(Self::read_only("rename"))
    }
}

//! Streaming library: saved tracks plus every track in the user's playlists.

use crate::session::CatalogSession;
use crate::translator::Translator;
use async_trait::async_trait;
use core_library::error::Result;
use core_library::library::LibraryProvider;
use core_library::models::Track;
use std::sync::Arc;
use tracing::{debug, info};

pub struct StreamingLibraryProvider {
    session: Arc<dyn CatalogSession>,
    translator: Translator,
}

impl StreamingLibraryProvider {
    pub fn new(session: Arc<dyn CatalogSession>, translator: Translator) -> Self {
        Self {
            session,
            translator,
        }
    }
}

#[async_trait]
impl LibraryProvider for StreamingLibraryProvider {
    async fn refresh(&self, uri: Option<&str>) -> Result<Vec<Track>> {
        let saved = self.session.saved_tracks().await?;
        let playlists = self.session.playlists().await?;
        info!(
            saved = saved.len(),
            playlists = playlists.len(),
            "Loading streaming catalog"
        );

        let tracks: Vec<Track> = saved
            .iter()
            .chain(playlists.iter().flat_map(|p| p.tracks.iter()))
            .filter(|t| t.loaded)
            .map(|t| self.translator.to_track(t))
            .filter(|t| uri.map_or(true, |prefix| t.uri.starts_with(prefix)))
            .collect();

        debug!(count = tracks.len(), "Translated streaming tracks");
        Ok(tracks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{MockCatalogSession, SdkAlbum, SdkPlaylist, SdkPlaylistKind, SdkTrack};

    fn sdk_track(link: &str, loaded: bool) -> SdkTrack {
        SdkTrack {
            link: link.to_string(),
            name: link.to_string(),
            artists: Vec::new(),
            album: SdkAlbum {
                link: String::new(),
                name: "Album".to_string(),
                year: 2001,
                loaded: true,
            },
            index: 1,
            duration_ms: 1_000,
            loaded,
        }
    }

    #[tokio::test]
    async fn refresh_merges_saved_and_playlist_tracks() {
        let mut session = MockCatalogSession::new();
        session.expect_saved_tracks().returning(|| {
            Ok(vec![
                sdk_track("spotify:track:a", true),
                sdk_track("spotify:track:pending", false),
            ])
        });
        session.expect_playlists().returning(|| {
            Ok(vec![SdkPlaylist {
                link: "spotify:user:me:playlist:1".to_string(),
                name: "Mine".to_string(),
                kind: SdkPlaylistKind::Playlist,
                tracks: vec![sdk_track("spotify:track:b", true)],
                loaded: true,
            }])
        });

        let provider = StreamingLibraryProvider::new(Arc::new(session), Translator::new(false));
        let uris: Vec<String> = provider
            .refresh(None)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.uri)
            .collect();
        assert_eq!(uris, vec!["spotify:track:a", "spotify:track:b"]);
    }
}

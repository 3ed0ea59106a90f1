//! Backend composition.
//!
//! A [`Backend`] is the four generic controllers wired to one music source's
//! providers. The controllers never branch on which source that is; the only
//! backend-specific pieces are the [`BackendProviders`] and the URI schemes
//! the backend claims.

use crate::error::Result;
use core_library::library::{LibraryController, LibraryProvider};
use core_library::playlists::{StoredPlaylistsController, StoredPlaylistsProvider};
use core_playback::controller::PlaybackController;
use core_playback::tracklist::TracklistController;
use core_playback::traits::PlaybackProvider;
use core_runtime::events::EventBus;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// The capability set a music source supplies.
pub struct BackendProviders {
    pub library: Arc<dyn LibraryProvider>,
    pub playback: Arc<dyn PlaybackProvider>,
    pub stored_playlists: Arc<dyn StoredPlaylistsProvider>,
}

pub struct Backend {
    name: String,
    uri_schemes: Vec<String>,
    pub library: Arc<LibraryController>,
    pub stored_playlists: Arc<StoredPlaylistsController>,
    pub tracklist: Arc<TracklistController>,
    pub playback: Arc<PlaybackController>,
}

impl Backend {
    pub fn new(
        name: impl Into<String>,
        uri_schemes: Vec<String>,
        providers: BackendProviders,
        events: &EventBus,
    ) -> Self {
        let library = Arc::new(LibraryController::new(providers.library, events.clone()));
        let stored_playlists = Arc::new(StoredPlaylistsController::new(
            providers.stored_playlists,
            Arc::clone(&library),
            events.clone(),
        ));
        let tracklist = Arc::new(TracklistController::new(events.clone()));
        let playback = Arc::new(PlaybackController::new(
            providers.playback,
            Arc::clone(&tracklist),
            events.clone(),
        ));

        Self {
            name: name.into(),
            uri_schemes,
            library,
            stored_playlists,
            tracklist,
            playback,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn uri_schemes(&self) -> &[String] {
        &self.uri_schemes
    }

    /// Whether `uri` starts with one of this backend's schemes.
    pub fn handles(&self, uri: &str) -> bool {
        self.uri_schemes
            .iter()
            .any(|scheme| uri.starts_with(scheme.as_str()))
    }

    /// Loads the library and then the stored playlists, which resolve their
    /// tracks through it.
    pub async fn refresh(&self) -> Result<()> {
        let tracks = self.library.refresh(None).await?;
        let playlists = match self.stored_playlists.refresh().await {
            Ok(count) => count,
            Err(e) => {
                warn!(backend = %self.name, error = %e, "Stored playlists unavailable");
                0
            }
        };
        info!(backend = %self.name, tracks, playlists, "Backend ready");
        Ok(())
    }
}

impl fmt::Debug for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backend")
            .field("name", &self.name)
            .field("uri_schemes", &self.uri_schemes)
            .finish()
    }
}

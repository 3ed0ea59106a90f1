//! Stored playlists controller.
//!
//! Named playlists persisted by a backend-specific
//! [`StoredPlaylistsProvider`], independent of the current playlist. Track
//! URIs read from storage are resolved through the [`LibraryController`];
//! entries that no longer resolve are logged and skipped so that one stale
//! line never loses the rest of a playlist.

use crate::error::{LibraryError, Result};
use crate::library::LibraryController;
use crate::models::{Playlist, Track};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use core_runtime::events::{CoreEvent, EventBus, StoredPlaylistsEvent};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Playlist as stored: tracks are still unresolved URIs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistRecord {
    pub uri: String,
    pub name: String,
    pub track_uris: Vec<String>,
    pub last_modified: Option<DateTime<Utc>>,
}

/// Backend storage for named playlists.
#[async_trait]
pub trait StoredPlaylistsProvider: Send + Sync {
    /// Read every persisted playlist.
    async fn load_all(&self) -> Result<Vec<PlaylistRecord>>;

    /// Persist `playlist`, returning it as stored (URI assigned).
    async fn save(&self, playlist: &Playlist) -> Result<Playlist>;

    /// Remove `playlist` from storage.
    async fn delete(&self, playlist: &Playlist) -> Result<()>;

    /// Move `playlist` to `new_name`, returning the renamed playlist.
    async fn rename(&self, playlist: &Playlist, new_name: &str) -> Result<Playlist>;
}

#[derive(Debug, Default)]
struct PlaylistsState {
    playlists: Vec<Playlist>,
    loaded: bool,
}

impl PlaylistsState {
    fn position_of(&self, playlist: &Playlist) -> Option<usize> {
        self.playlists
            .iter()
            .position(|p| p.is_same_playlist(playlist))
    }
}

/// CRUD over one backend's stored playlists.
pub struct StoredPlaylistsController {
    provider: Arc<dyn StoredPlaylistsProvider>,
    library: Arc<LibraryController>,
    state: Mutex<PlaylistsState>,
    events: EventBus,
}

impl StoredPlaylistsController {
    pub fn new(
        provider: Arc<dyn StoredPlaylistsProvider>,
        library: Arc<LibraryController>,
        events: EventBus,
    ) -> Self {
        Self {
            provider,
            library,
            state: Mutex::new(PlaylistsState::default()),
            events,
        }
    }

    fn announce(&self, name: Option<&str>) {
        self.events
            .emit(CoreEvent::StoredPlaylists(StoredPlaylistsEvent::Changed {
                name: name.map(str::to_string),
            }))
            .ok();
    }

    /// Creates, persists and tracks an empty playlist.
    pub async fn create(&self, name: &str) -> Result<Playlist> {
        let mut state = self.state.lock().await;

        let draft = Playlist {
            last_modified: Some(Utc::now()),
            ..Playlist::new(name, Vec::new())
        };
        let stored = self.provider.save(&draft).await?;
        state.playlists.push(stored.clone());

        debug!(name, "Stored playlist created");
        self.announce(Some(name));
        Ok(stored)
    }

    /// Deletes a tracked playlist. Returns `false` if it was not tracked.
    pub async fn delete(&self, playlist: &Playlist) -> Result<bool> {
        let mut state = self.state.lock().await;
        let Some(position) = state.position_of(playlist) else {
            return Ok(false);
        };

        self.provider.delete(&state.playlists[position]).await?;
        let removed = state.playlists.remove(position);

        debug!(name = %removed.name, "Stored playlist deleted");
        self.announce(Some(&removed.name));
        Ok(true)
    }

    /// Renames a tracked playlist. Returns `None` if it was not tracked.
    pub async fn rename(&self, playlist: &Playlist, new_name: &str) -> Result<Option<Playlist>> {
        let mut state = self.state.lock().await;
        let Some(position) = state.position_of(playlist) else {
            return Ok(None);
        };

        let renamed = self
            .provider
            .rename(&state.playlists[position], new_name)
            .await?;
        state.playlists[position] = renamed.clone();

        debug!(from = %playlist.name, to = new_name, "Stored playlist renamed");
        self.announce(Some(new_name));
        Ok(Some(renamed))
    }

    /// Persists a new version of a tracked playlist. Returns `None` if it
    /// was not tracked.
    pub async fn save(&self, playlist: &Playlist) -> Result<Option<Playlist>> {
        let mut state = self.state.lock().await;
        let Some(position) = state.position_of(playlist) else {
            return Ok(None);
        };

        let stamped = Playlist {
            last_modified: Some(Utc::now()),
            ..playlist.clone()
        };
        let stored = self.provider.save(&stamped).await?;
        state.playlists[position] = stored.clone();

        self.announce(Some(&stored.name));
        Ok(Some(stored))
    }

    /// Reloads every playlist from storage, resolving tracks through the
    /// library. Returns the number of playlists loaded.
    pub async fn refresh(&self) -> Result<usize> {
        let mut state = self.state.lock().await;
        let records = self.provider.load_all().await?;

        let mut playlists = Vec::with_capacity(records.len());
        for record in records {
            let tracks: Vec<Track> = record
                .track_uris
                .iter()
                .filter_map(|uri| match self.library.lookup(uri) {
                    Ok(track) => Some(track),
                    Err(e) => {
                        warn!(playlist = %record.name, uri = %uri, error = %e, "Skipping unresolved playlist entry");
                        None
                    }
                })
                .collect();

            playlists.push(Playlist {
                uri: Some(record.uri),
                name: record.name,
                tracks,
                last_modified: record.last_modified,
            });
        }

        let count = playlists.len();
        state.playlists = playlists;
        state.loaded = true;

        info!(count, "Stored playlists loaded");
        self.announce(None);
        Ok(count)
    }

    /// Stored playlist by URI.
    pub async fn lookup(&self, uri: &str) -> Result<Playlist> {
        let state = self.state.lock().await;
        state
            .playlists
            .iter()
            .find(|p| p.uri.as_deref() == Some(uri))
            .cloned()
            .ok_or_else(|| LibraryError::not_found("playlist", uri))
    }

    /// Stored playlist by name.
    pub async fn get(&self, name: &str) -> Result<Playlist> {
        let state = self.state.lock().await;
        state
            .playlists
            .iter()
            .find(|p| p.name == name)
            .cloned()
            .ok_or_else(|| LibraryError::not_found("playlist", name))
    }

    pub async fn playlists(&self) -> Vec<Playlist> {
        self.state.lock().await.playlists.clone()
    }

    /// Whether [`refresh`](Self::refresh) has completed at least once.
    pub async fn is_loaded(&self) -> bool {
        self.state.lock().await.loaded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::LibraryProvider;
    use crate::models::Model;
    use mockall::mock;
    use mockall::predicate::always;

    mock! {
        Storage {}

        #[async_trait]
        impl StoredPlaylistsProvider for Storage {
            async fn load_all(&self) -> Result<Vec<PlaylistRecord>>;
            async fn save(&self, playlist: &Playlist) -> Result<Playlist>;
            async fn delete(&self, playlist: &Playlist) -> Result<()>;
            async fn rename(&self, playlist: &Playlist, new_name: &str) -> Result<Playlist>;
        }
    }

    struct FixedLibrary(Vec<Track>);

    #[async_trait]
    impl LibraryProvider for FixedLibrary {
        async fn refresh(&self, _uri: Option<&str>) -> Result<Vec<Track>> {
            Ok(self.0.clone())
        }
    }

    async fn library() -> Arc<LibraryController> {
        let library = LibraryController::new(
            Arc::new(FixedLibrary(vec![
                Track::new("dummy:1", "one"),
                Track::new("dummy:2", "two"),
            ])),
            EventBus::new(8),
        );
        library.refresh(None).await.unwrap();
        Arc::new(library)
    }

    fn assign_uri(playlist: &Playlist) -> Result<Playlist> {
        Ok(Playlist {
            uri: Some(format!("dummy:playlist:{}", playlist.name)),
            ..playlist.clone()
        })
    }

    #[tokio::test]
    async fn refresh_skips_unresolvable_uris() {
        let mut storage = MockStorage::new();
        storage.expect_load_all().returning(|| {
            Ok(vec![PlaylistRecord {
                uri: "dummy:playlist:mix".to_string(),
                name: "mix".to_string(),
                track_uris: vec![
                    "dummy:1".to_string(),
                    "dummy:missing".to_string(),
                    "dummy:2".to_string(),
                ],
                last_modified: None,
            }])
        });

        let controller =
            StoredPlaylistsController::new(Arc::new(storage), library().await, EventBus::new(8));
        assert!(!controller.is_loaded().await);
        assert_eq!(controller.refresh().await.unwrap(), 1);
        assert!(controller.is_loaded().await);

        let mix = controller.get("mix").await.unwrap();
        let uris: Vec<&str> = mix.tracks.iter().map(|t| t.uri.as_str()).collect();
        assert_eq!(uris, vec!["dummy:1", "dummy:2"]);
        assert_eq!(controller.lookup("dummy:playlist:mix").await.unwrap(), mix);
    }

    #[tokio::test]
    async fn create_persists_and_tracks() {
        let mut storage = MockStorage::new();
        storage.expect_save().times(1).returning(assign_uri);

        let events = EventBus::new(8);
        let mut rx = events.subscribe();
        let controller = StoredPlaylistsController::new(Arc::new(storage), library().await, events);

        let created = controller.create("new").await.unwrap();
        assert_eq!(created.uri.as_deref(), Some("dummy:playlist:new"));
        assert_eq!(created.length(), 0);
        assert!(created.last_modified.is_some());
        assert_eq!(controller.playlists().await, vec![created]);
        assert_eq!(
            rx.recv().await.unwrap(),
            CoreEvent::StoredPlaylists(StoredPlaylistsEvent::Changed {
                name: Some("new".to_string())
            })
        );
    }

    #[tokio::test]
    async fn untracked_playlists_are_ignored() {
        let mut storage = MockStorage::new();
        storage.expect_delete().never();
        storage.expect_rename().never();
        storage.expect_save().never();

        let controller =
            StoredPlaylistsController::new(Arc::new(storage), library().await, EventBus::new(8));
        let stranger = Playlist::new("stranger", vec![]);

        assert!(!controller.delete(&stranger).await.unwrap());
        assert!(controller.rename(&stranger, "x").await.unwrap().is_none());
        assert!(controller.save(&stranger).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn rename_and_delete_tracked_playlist() {
        let mut storage = MockStorage::new();
        storage.expect_save().returning(assign_uri);
        storage
            .expect_rename()
            .with(always(), mockall::predicate::eq("after"))
            .returning(|playlist, new_name| {
                let renamed = playlist.copy_with(serde_json::json!({ "name": new_name }))?;
                assign_uri(&renamed)
            });
        storage.expect_delete().times(1).returning(|_| Ok(()));

        let controller =
            StoredPlaylistsController::new(Arc::new(storage), library().await, EventBus::new(8));
        let created = controller.create("before").await.unwrap();

        let renamed = controller.rename(&created, "after").await.unwrap().unwrap();
        assert_eq!(renamed.name, "after");
        assert_eq!(created.name, "before");
        assert!(controller.get("before").await.is_err());

        assert!(controller.delete(&renamed).await.unwrap());
        assert!(controller.playlists().await.is_empty());
    }

    #[tokio::test]
    async fn save_replaces_tracked_version() {
        let mut storage = MockStorage::new();
        storage.expect_save().returning(assign_uri);

        let controller =
            StoredPlaylistsController::new(Arc::new(storage), library().await, EventBus::new(8));
        let created = controller.create("list").await.unwrap();

        let updated = Playlist {
            tracks: vec![Track::new("dummy:1", "one")],
            ..created
        };
        let saved = controller.save(&updated).await.unwrap().unwrap();
        assert_eq!(saved.length(), 1);
        assert_eq!(controller.get("list").await.unwrap().length(), 1);
    }

    #[tokio::test]
    async fn storage_failures_propagate() {
        let mut storage = MockStorage::new();
        storage
            .expect_load_all()
            .returning(|| Err(LibraryError::Storage("disk gone".to_string())));

        let controller =
            StoredPlaylistsController::new(Arc::new(storage), library().await, EventBus::new(8));
        assert!(matches!(
            controller.refresh().await,
            Err(LibraryError::Storage(_))
        ));
        assert!(!controller.is_loaded().await);
    }
}

//! In-memory backend for tests and for running without any music source.
//!
//! Everything lives in memory: the catalog is whatever was handed in, stored
//! playlists vanish with the process and playback merely keeps time.

use crate::backend::{Backend, BackendProviders};
use async_trait::async_trait;
use core_library::error::{LibraryError, Result as LibraryResult};
use core_library::library::LibraryProvider;
use core_library::models::{Playlist, Track};
use core_library::playlists::{PlaylistRecord, StoredPlaylistsProvider};
use core_playback::error::Result as PlaybackResult;
use core_playback::traits::PlaybackProvider;
use core_runtime::events::EventBus;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

pub const URI_SCHEME: &str = "dummy:";

/// Tracks named `dummy:<name>`, one per name, each one minute long.
pub fn tracks(names: &[&str]) -> Vec<Track> {
    names
        .iter()
        .map(|name| Track {
            length: Some(Duration::from_secs(60)),
            ..Track::new(format!("{}{}", URI_SCHEME, name), *name)
        })
        .collect()
}

/// Dummy backend serving `catalog`.
pub fn backend(catalog: Vec<Track>, events: &EventBus) -> Backend {
    Backend::new(
        "dummy",
        vec![URI_SCHEME.to_string()],
        BackendProviders {
            library: Arc::new(DummyLibraryProvider::new(catalog)),
            playback: Arc::new(DummyPlaybackProvider::default()),
            stored_playlists: Arc::new(DummyPlaylistsProvider::default()),
        },
        events,
    )
}

pub struct DummyLibraryProvider {
    tracks: Vec<Track>,
}

impl DummyLibraryProvider {
    pub fn new(tracks: Vec<Track>) -> Self {
        Self { tracks }
    }
}

#[async_trait]
impl LibraryProvider for DummyLibraryProvider {
    async fn refresh(&self, uri: Option<&str>) -> LibraryResult<Vec<Track>> {
        Ok(self
            .tracks
            .iter()
            .filter(|t| uri.map_or(true, |prefix| t.uri.starts_with(prefix)))
            .cloned()
            .collect())
    }
}

#[derive(Debug, Default)]
struct Clock {
    started: Option<Instant>,
    offset: Duration,
}

impl Clock {
    fn position(&self) -> Duration {
        self.offset + self.started.map(|s| s.elapsed()).unwrap_or_default()
    }
}

/// Accepts everything except tracks without a URI and keeps a position.
#[derive(Debug, Default)]
pub struct DummyPlaybackProvider {
    clock: Mutex<Clock>,
}

#[async_trait]
impl PlaybackProvider for DummyPlaybackProvider {
    async fn play(&self, track: &Track) -> PlaybackResult<bool> {
        if track.uri.is_empty() {
            return Ok(false);
        }
        *self.clock.lock() = Clock {
            started: Some(Instant::now()),
            offset: Duration::ZERO,
        };
        Ok(true)
    }

    async fn resume(&self) -> PlaybackResult<bool> {
        let mut clock = self.clock.lock();
        if clock.started.is_none() {
            clock.started = Some(Instant::now());
        }
        Ok(true)
    }

    async fn pause(&self) -> PlaybackResult<bool> {
        let mut clock = self.clock.lock();
        clock.offset = clock.position();
        clock.started = None;
        Ok(true)
    }

    async fn stop(&self) -> PlaybackResult<bool> {
        *self.clock.lock() = Clock::default();
        Ok(true)
    }

    async fn seek(&self, position: Duration) -> PlaybackResult<bool> {
        let mut clock = self.clock.lock();
        clock.offset = position;
        if clock.started.is_some() {
            clock.started = Some(Instant::now());
        }
        Ok(true)
    }

    async fn get_position(&self) -> PlaybackResult<Duration> {
        Ok(self.clock.lock().position())
    }
}

#[derive(Debug, Default)]
pub struct DummyPlaylistsProvider {
    playlists: Mutex<Vec<Playlist>>,
}

impl DummyPlaylistsProvider {
    fn uri_for(name: &str) -> String {
        format!("{}playlist:{}", URI_SCHEME, name)
    }
}

#[async_trait]
impl StoredPlaylistsProvider for DummyPlaylistsProvider {
    async fn load_all(&self) -> LibraryResult<Vec<PlaylistRecord>> {
        Ok(self
            .playlists
            .lock()
            .iter()
            .map(|p| PlaylistRecord {
                uri: p.uri.clone().unwrap_or_else(|| Self::uri_for(&p.name)),
                name: p.name.clone(),
                track_uris: p.tracks.iter().map(|t| t.uri.clone()).collect(),
                last_modified: p.last_modified,
            })
            .collect())
    }

    async fn save(&self, playlist: &Playlist) -> LibraryResult<Playlist> {
        let stored = Playlist {
            uri: Some(Self::uri_for(&playlist.name)),
            ..playlist.clone()
        };
        let mut playlists = self.playlists.lock();
        playlists.retain(|p| p.name != stored.name);
        playlists.push(stored.clone());
        Ok(stored)
    }

    async fn delete(&self, playlist: &Playlist) -> LibraryResult<()> {
        self.playlists.lock().retain(|p| p.name != playlist.name);
        Ok(())
    }

    async fn rename(&self, playlist: &Playlist, new_name: &str) -> LibraryResult<Playlist> {
        let mut playlists = self.playlists.lock();
        let stored = playlists
            .iter_mut()
            .find(|p| p.name == playlist.name)
            .ok_or_else(|| LibraryError::not_found("playlist", playlist.name.clone()))?;
        stored.name = new_name.to_string();
        stored.uri = Some(Self::uri_for(new_name));
        Ok(stored.clone())
    }
}

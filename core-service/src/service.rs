//! Service bootstrap.
//!
//! Builds the backends from a [`ServerConfig`], loads their catalogs and
//! starts the background tasks they need. The config is read once here and
//! handed down by reference; nothing below keeps a global copy.

use crate::backend::{Backend, BackendProviders};
use crate::error::Result;
use crate::router::BackendRouter;
use crate::watcher::{spawn_track_end_watcher, TRACK_END_POLL_INTERVAL};
use bridge_desktop::{spawn_clock_engine, TokioFileSystem};
use bridge_traits::storage::FileSystemAccess;
use core_runtime::config::ServerConfig;
use core_runtime::events::EventBus;
use provider_local::{LocalLibraryProvider, LocalPlaybackProvider, M3uPlaylistsProvider, FILE_SCHEME};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{info, warn};

#[cfg(feature = "streaming")]
use provider_streaming::{
    CatalogSession, StreamingLibraryProvider, StreamingPlaybackProvider,
    StreamingPlaylistsProvider, Translator,
};

/// Local archive backend playing through the desktop audio engine.
///
/// Must be called from within a tokio runtime; the engine worker is spawned
/// immediately and its handle returned alongside the backend.
pub fn local_backend(config: &ServerConfig, events: &EventBus) -> (Backend, JoinHandle<()>) {
    let fs: Arc<dyn FileSystemAccess> = Arc::new(TokioFileSystem::new());
    let (output, engine) = spawn_clock_engine(config.engine_timeout);

    let backend = Backend::new(
        "local",
        vec![FILE_SCHEME.to_string()],
        BackendProviders {
            library: Arc::new(LocalLibraryProvider::new(
                Arc::clone(&fs),
                &config.tag_cache_file,
                &config.music_path,
            )),
            playback: Arc::new(LocalPlaybackProvider::new(Arc::new(output))),
            stored_playlists: Arc::new(M3uPlaylistsProvider::new(fs, &config.playlist_path)),
        },
        events,
    );
    (backend, engine)
}

/// Streaming catalog backend over a logged-in SDK session.
#[cfg(feature = "streaming")]
pub fn streaming_backend(
    session: Arc<dyn CatalogSession>,
    config: &ServerConfig,
    events: &EventBus,
) -> Backend {
    let translator = Translator::new(config.streaming_high_bitrate);
    Backend::new(
        "streaming",
        vec![provider_streaming::URI_SCHEME.to_string()],
        BackendProviders {
            library: Arc::new(StreamingLibraryProvider::new(Arc::clone(&session), translator)),
            playback: Arc::new(StreamingPlaybackProvider::new(Arc::clone(&session))),
            stored_playlists: Arc::new(StreamingPlaylistsProvider::new(session, translator)),
        },
        events,
    )
}

/// Running server core: configuration, event bus and routed backends.
pub struct CoreService {
    config: ServerConfig,
    events: EventBus,
    router: BackendRouter,
    tasks: Vec<JoinHandle<()>>,
    started: Instant,
}

impl CoreService {
    /// Validates `config` and starts the local backend followed by the dummy
    /// backend.
    pub async fn bootstrap(config: &ServerConfig) -> Result<Self> {
        config.validate()?;
        let events = EventBus::new(config.event_buffer_size);

        let (local, engine) = local_backend(config, &events);
        let dummy = crate::dummy::backend(Vec::new(), &events);

        Self::start(config.clone(), events, vec![local, dummy], vec![engine]).await
    }

    /// Starts a service over `backends`, the first being the default.
    ///
    /// Every backend is refreshed; one that fails to load is logged and
    /// served with an empty catalog. `tasks` are owned by the service and
    /// aborted when it is dropped.
    pub async fn start(
        config: ServerConfig,
        events: EventBus,
        backends: Vec<Backend>,
        mut tasks: Vec<JoinHandle<()>>,
    ) -> Result<Self> {
        let router = BackendRouter::new(backends.into_iter().map(Arc::new).collect())?;

        for backend in router.all() {
            if let Err(e) = backend.refresh().await {
                warn!(backend = backend.name(), error = %e, "Backend failed to load");
            }
            tasks.push(spawn_track_end_watcher(
                Arc::clone(&backend.playback),
                TRACK_END_POLL_INTERVAL,
            ));
        }

        info!(
            backends = router.all().len(),
            default = router.default_backend().name(),
            "Core service started"
        );

        Ok(Self {
            config,
            events,
            router,
            tasks,
            started: Instant::now(),
        })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn router(&self) -> &BackendRouter {
        &self.router
    }

    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }

    /// Backend owning the tracklist and playback state.
    pub fn backend(&self) -> &Arc<Backend> {
        self.router.default_backend()
    }
}

impl Drop for CoreService {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(root: &std::path::Path) -> ServerConfig {
        ServerConfig::builder()
            .music_path(root.join("music"))
            .playlist_path(root.join("playlists"))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn bootstrap_survives_missing_tag_cache() {
        let dir = tempfile::tempdir().unwrap();
        let service = CoreService::bootstrap(&config(dir.path())).await.unwrap();

        assert_eq!(service.backend().name(), "local");
        assert!(service.backend().library.is_empty());
        assert_eq!(service.router().for_uri("dummy:x").unwrap().name(), "dummy");
    }

    #[tokio::test]
    async fn bootstrap_loads_local_archive() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        std::fs::create_dir_all(&config.music_path).unwrap();
        std::fs::write(
            &config.tag_cache_file,
            "songList begin\nkey: a.mp3\nfile: a.mp3\nTitle: A\nTime: 10\nsongList end\n",
        )
        .unwrap();

        let service = CoreService::bootstrap(&config).await.unwrap();
        let backend = service.backend();
        assert_eq!(backend.library.len(), 1);

        backend.tracklist.append(backend.library.tracks());
        backend.playback.play(None).await.unwrap();
        backend.playback.pause().await.unwrap();
        backend.playback.stop().await.unwrap();
    }

    #[tokio::test]
    async fn bootstrap_rejects_invalid_config() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        config.port = 0;
        assert!(CoreService::bootstrap(&config).await.is_err());
    }
}

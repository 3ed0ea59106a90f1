//! Library controller: URI lookup and field search over a backend catalog.
//!
//! The catalog comes from a pluggable [`LibraryProvider`]. The controller
//! keeps an index of the provider's tracks behind an `Arc` that is swapped as
//! a whole on refresh, so readers always see either the old or the new
//! catalog, never a half-built one.

use crate::error::{LibraryError, Result};
use crate::models::{Playlist, Track};
use crate::query::{MatchMode, Query};
use async_trait::async_trait;
use core_runtime::events::{CoreEvent, EventBus, LibraryEvent};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Backend-specific source of tracks.
///
/// # Example
///
/// ```ignore
/// struct TagCacheLibrary { path: PathBuf }
///
/// #[async_trait]
/// impl LibraryProvider for TagCacheLibrary {
///     async fn refresh(&self, uri: Option<&str>) -> Result<Vec<Track>> {
///         let tracks = parse_tag_cache(&self.path).await?;
///         Ok(filter_prefix(tracks, uri))
///     }
/// }
/// ```
#[async_trait]
pub trait LibraryProvider: Send + Sync {
    /// Read the catalog, or only the part whose URIs start with `uri`.
    async fn refresh(&self, uri: Option<&str>) -> Result<Vec<Track>>;
}

/// Immutable snapshot of the catalog.
#[derive(Debug, Default)]
struct LibraryIndex {
    tracks: Vec<Track>,
    by_uri: HashMap<String, usize>,
}

impl LibraryIndex {
    fn build(tracks: Vec<Track>) -> Self {
        let mut unique: Vec<Track> = Vec::with_capacity(tracks.len());
        let mut by_uri = HashMap::with_capacity(tracks.len());
        for track in tracks {
            // Later entries for the same URI replace earlier ones in place
            match by_uri.get(&track.uri) {
                Some(&position) => unique[position] = track,
                None => {
                    by_uri.insert(track.uri.clone(), unique.len());
                    unique.push(track);
                }
            }
        }
        Self {
            tracks: unique,
            by_uri,
        }
    }
}

/// Lookup and search over one backend's catalog.
pub struct LibraryController {
    provider: Arc<dyn LibraryProvider>,
    index: RwLock<Arc<LibraryIndex>>,
    refresh_lock: tokio::sync::Mutex<()>,
    events: EventBus,
}

impl LibraryController {
    /// Creates a controller with an empty index. Call [`refresh`](Self::refresh)
    /// to populate it.
    pub fn new(provider: Arc<dyn LibraryProvider>, events: EventBus) -> Self {
        Self {
            provider,
            index: RwLock::new(Arc::new(LibraryIndex::default())),
            refresh_lock: tokio::sync::Mutex::new(()),
            events,
        }
    }

    fn snapshot(&self) -> Arc<LibraryIndex> {
        Arc::clone(&self.index.read())
    }

    /// Re-reads the catalog from the provider and swaps in a new index.
    ///
    /// With `Some(uri)` only entries whose URI starts with `uri` are replaced;
    /// the rest of the catalog is kept. Returns the number of tracks the
    /// provider delivered.
    pub async fn refresh(&self, uri: Option<&str>) -> Result<usize> {
        let _guard = self.refresh_lock.lock().await;

        let fresh = self.provider.refresh(uri).await?;
        let fetched = fresh.len();

        let tracks = match uri {
            Some(prefix) => {
                let current = self.snapshot();
                current
                    .tracks
                    .iter()
                    .filter(|t| !t.uri.starts_with(prefix))
                    .cloned()
                    .chain(fresh)
                    .collect()
            }
            None => fresh,
        };

        let index = Arc::new(LibraryIndex::build(tracks));
        let total = index.tracks.len();
        *self.index.write() = index;

        info!(uri = ?uri, fetched, total, "Library refreshed");
        self.events
            .emit(CoreEvent::Library(LibraryEvent::Refreshed {
                uri: uri.map(str::to_string),
                track_count: total,
            }))
            .ok();

        Ok(fetched)
    }

    /// Exact URI lookup.
    pub fn lookup(&self, uri: &str) -> Result<Track> {
        let index = self.snapshot();
        index
            .by_uri
            .get(uri)
            .map(|&position| index.tracks[position].clone())
            .ok_or_else(|| LibraryError::not_found("track", uri))
    }

    /// Tracks whose fields equal the query values.
    pub fn find_exact(&self, query: &Query) -> Playlist {
        self.filter(query, MatchMode::Exact)
    }

    /// Tracks whose fields contain the query values, ignoring case.
    pub fn search(&self, query: &Query) -> Playlist {
        self.filter(query, MatchMode::Search)
    }

    fn filter(&self, query: &Query, mode: MatchMode) -> Playlist {
        let index = self.snapshot();
        let tracks: Vec<Track> = index
            .tracks
            .iter()
            .filter(|track| query.matches(track, mode))
            .cloned()
            .collect();
        debug!(?mode, criteria = query.criteria().len(), hits = tracks.len(), "Library query");
        Playlist::new("", tracks)
    }

    /// Whole catalog in provider order.
    pub fn tracks(&self) -> Vec<Track> {
        self.snapshot().tracks.clone()
    }

    pub fn len(&self) -> usize {
        self.snapshot().tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Album, Artist};
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    /// Provider replaying queued answers and recording the requested URIs.
    #[derive(Default)]
    struct ScriptedProvider {
        answers: Mutex<VecDeque<Result<Vec<Track>>>>,
        requests: Mutex<Vec<Option<String>>>,
    }

    impl ScriptedProvider {
        fn answering(answers: Vec<Result<Vec<Track>>>) -> Arc<Self> {
            Arc::new(Self {
                answers: Mutex::new(answers.into()),
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl LibraryProvider for ScriptedProvider {
        async fn refresh(&self, uri: Option<&str>) -> Result<Vec<Track>> {
            self.requests.lock().push(uri.map(str::to_string));
            self.answers
                .lock()
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    fn catalog() -> Vec<Track> {
        vec![
            Track {
                artists: vec![Artist::named("Artist One")],
                album: Some(Album::named("First Album")),
                ..Track::new("dummy:a/1", "Track One")
            },
            Track {
                artists: vec![Artist::named("Artist Two")],
                album: Some(Album::named("Second Album")),
                ..Track::new("dummy:b/2", "Track Two")
            },
        ]
    }

    async fn controller_with(tracks: Vec<Track>) -> LibraryController {
        let provider = ScriptedProvider::answering(vec![Ok(tracks)]);
        let controller = LibraryController::new(provider, EventBus::new(8));
        controller.refresh(None).await.unwrap();
        controller
    }

    #[tokio::test]
    async fn lookup_hits_and_misses() {
        let library = controller_with(catalog()).await;

        assert_eq!(library.lookup("dummy:a/1").unwrap().name, "Track One");
        let err = library.lookup("dummy:nope").unwrap_err();
        assert!(matches!(err, LibraryError::NotFound { ref id, .. } if id == "dummy:nope"));
    }

    #[tokio::test]
    async fn find_exact_and_search() {
        let library = controller_with(catalog()).await;

        let query = Query::from_pairs([("track", vec!["Track One"])]).unwrap();
        assert_eq!(library.find_exact(&query).length(), 1);

        let query = Query::from_pairs([("track", vec!["track"])]).unwrap();
        assert_eq!(library.find_exact(&query).length(), 0);
        assert_eq!(library.search(&query).length(), 2);

        let query =
            Query::from_pairs([("artist", vec!["two"]), ("album", vec!["second"])]).unwrap();
        let hits = library.search(&query);
        assert_eq!(hits.tracks[0].uri, "dummy:b/2");
    }

    #[tokio::test]
    async fn refresh_with_prefix_replaces_only_matching_entries() {
        let provider = ScriptedProvider::answering(vec![
            Ok(catalog()),
            Ok(vec![Track::new("dummy:b/3", "Track Three")]),
        ]);

        let library = LibraryController::new(provider.clone(), EventBus::new(8));
        library.refresh(None).await.unwrap();
        assert_eq!(library.refresh(Some("dummy:b")).await.unwrap(), 1);

        assert_eq!(
            *provider.requests.lock(),
            vec![None, Some("dummy:b".to_string())]
        );
        let uris: Vec<String> = library.tracks().into_iter().map(|t| t.uri).collect();
        assert_eq!(uris, vec!["dummy:a/1", "dummy:b/3"]);
        assert!(library.lookup("dummy:b/2").is_err());
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_index() {
        let provider = ScriptedProvider::answering(vec![
            Ok(catalog()),
            Err(LibraryError::Storage("tag cache unreadable".to_string())),
        ]);

        let library = LibraryController::new(provider, EventBus::new(8));
        library.refresh(None).await.unwrap();
        assert!(library.refresh(None).await.is_err());
        assert_eq!(library.len(), 2);
    }

    #[tokio::test]
    async fn refresh_emits_event() {
        let events = EventBus::new(8);
        let mut rx = events.subscribe();

        let library =
            LibraryController::new(ScriptedProvider::answering(vec![Ok(catalog())]), events);
        library.refresh(None).await.unwrap();

        assert_eq!(
            rx.recv().await.unwrap(),
            CoreEvent::Library(LibraryEvent::Refreshed {
                uri: None,
                track_count: 2
            })
        );
    }

    #[tokio::test]
    async fn duplicate_uris_collapse_to_last_entry() {
        let library = controller_with(vec![
            Track::new("dummy:x", "first"),
            Track::new("dummy:y", "other"),
            Track::new("dummy:x", "second"),
        ])
        .await;

        assert_eq!(library.len(), 2);
        assert_eq!(library.lookup("dummy:x").unwrap().name, "second");
        assert_eq!(library.tracks()[0].uri, "dummy:x");
    }
}

//! URI-scheme routing across backends.

use crate::backend::Backend;
use crate::error::{CoreError, Result};
use std::collections::HashSet;
use std::sync::Arc;

/// The configured backends, in priority order.
///
/// The first backend is the default one: it owns the tracklist and playback
/// state that clients see.
#[derive(Debug)]
pub struct BackendRouter {
    backends: Vec<Arc<Backend>>,
}

impl BackendRouter {
    /// # Errors
    ///
    /// `InitializationFailed` if `backends` is empty or two backends claim
    /// the same URI scheme.
    pub fn new(backends: Vec<Arc<Backend>>) -> Result<Self> {
        if backends.is_empty() {
            return Err(CoreError::InitializationFailed(
                "at least one backend is required".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for backend in &backends {
            for scheme in backend.uri_schemes() {
                if !seen.insert(scheme.as_str()) {
                    return Err(CoreError::InitializationFailed(format!(
                        "URI scheme {:?} is claimed by more than one backend",
                        scheme
                    )));
                }
            }
        }

        Ok(Self { backends })
    }

    pub fn default_backend(&self) -> &Arc<Backend> {
        &self.backends[0]
    }

    pub fn all(&self) -> &[Arc<Backend>] {
        &self.backends
    }

    /// Backend whose scheme prefixes `uri`.
    pub fn for_uri(&self, uri: &str) -> Result<&Arc<Backend>> {
        self.backends
            .iter()
            .find(|backend| backend.handles(uri))
            .ok_or_else(|| CoreError::NoBackend(uri.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendProviders;
    use crate::dummy::{self, DummyLibraryProvider, DummyPlaybackProvider, DummyPlaylistsProvider};
    use core_runtime::events::EventBus;

    fn backend_with_scheme(name: &str, scheme: &str) -> Arc<Backend> {
        Arc::new(Backend::new(
            name,
            vec![scheme.to_string()],
            BackendProviders {
                library: Arc::new(DummyLibraryProvider::new(Vec::new())),
                playback: Arc::new(DummyPlaybackProvider::default()),
                stored_playlists: Arc::new(DummyPlaylistsProvider::default()),
            },
            &EventBus::new(8),
        ))
    }

    #[test]
    fn routes_by_scheme() {
        let router = BackendRouter::new(vec![
            backend_with_scheme("local", "file://"),
            Arc::new(dummy::backend(Vec::new(), &EventBus::new(8))),
        ])
        .unwrap();

        assert_eq!(router.for_uri("dummy:x").unwrap().name(), "dummy");
        assert_eq!(router.for_uri("file:///a.mp3").unwrap().name(), "local");
        assert_eq!(router.default_backend().name(), "local");
        assert!(matches!(
            router.for_uri("spotify:track:1"),
            Err(CoreError::NoBackend(_))
        ));
    }

    #[test]
    fn rejects_empty_and_overlapping_configurations() {
        assert!(BackendRouter::new(Vec::new()).is_err());
        assert!(BackendRouter::new(vec![
            backend_with_scheme("one", "file://"),
            backend_with_scheme("two", "file://"),
        ])
        .is_err());
    }
}

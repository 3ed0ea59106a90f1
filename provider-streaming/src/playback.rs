//! Playback through the SDK's own player.

use crate::session::CatalogSession;
use async_trait::async_trait;
use core_library::models::Track;
use core_playback::error::Result;
use core_playback::traits::PlaybackProvider;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub struct StreamingPlaybackProvider {
    session: Arc<dyn CatalogSession>,
}

impl StreamingPlaybackProvider {
    pub fn new(session: Arc<dyn CatalogSession>) -> Self {
        Self { session }
    }
}

#[async_trait]
impl PlaybackProvider for StreamingPlaybackProvider {
    async fn play(&self, track: &Track) -> Result<bool> {
        if !self.session.load(&track.uri).await? {
            debug!(uri = %track.uri, "SDK refused to load track");
            return Ok(false);
        }
        Ok(self.session.play().await?)
    }

    async fn resume(&self) -> Result<bool> {
        Ok(self.session.play().await?)
    }

    async fn pause(&self) -> Result<bool> {
        Ok(self.session.pause().await?)
    }

    async fn stop(&self) -> Result<bool> {
        Ok(self.session.unload().await?)
    }

    async fn seek(&self, position: Duration) -> Result<bool> {
        Ok(self.session.seek(position.as_millis() as u64).await?)
    }

    async fn get_position(&self) -> Result<Duration> {
        Ok(Duration::from_millis(self.session.position_ms().await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StreamingError;
    use crate::session::MockCatalogSession;
    use core_playback::error::PlaybackError;
    use mockall::predicate::eq;

    #[tokio::test]
    async fn play_loads_then_starts() {
        let mut session = MockCatalogSession::new();
        session
            .expect_load()
            .withf(|link: &str| link == "spotify:track:1")
            .times(1)
            .returning(|_| Ok(true));
        session.expect_play().times(1).returning(|| Ok(true));
        session
            .expect_seek()
            .with(eq(90_000))
            .returning(|_| Ok(true));

        let provider = StreamingPlaybackProvider::new(Arc::new(session));
        assert!(provider.play(&Track::new("spotify:track:1", "x")).await.unwrap());
        assert!(provider.seek(Duration::from_secs(90)).await.unwrap());
    }

    #[tokio::test]
    async fn refused_load_does_not_play() {
        let mut session = MockCatalogSession::new();
        session.expect_load().returning(|_| Ok(false));
        session.expect_play().never();

        let provider = StreamingPlaybackProvider::new(Arc::new(session));
        assert!(!provider.play(&Track::new("spotify:track:1", "x")).await.unwrap());
    }

    #[tokio::test]
    async fn session_loss_is_a_provider_failure() {
        let mut session = MockCatalogSession::new();
        session
            .expect_pause()
            .returning(|| Err(StreamingError::SessionUnavailable("logged out".to_string())));

        let provider = StreamingPlaybackProvider::new(Arc::new(session));
        let err = provider.pause().await.unwrap_err();
        assert!(matches!(err, PlaybackError::Provider(_)));
    }
}

//! Local playback provider.
//!
//! Maps the playback transport onto the audio engine:
//!
//! | Provider call | Engine request          |
//! |---------------|-------------------------|
//! | `play`        | `play_uri(track.uri)`   |
//! | `pause`       | `set_state(Paused)`     |
//! | `resume`      | `set_state(Playing)`    |
//! | `stop`        | `set_state(Ready)`      |
//! | `seek`        | `set_position(pos)`     |

use async_trait::async_trait;
use bridge_traits::output::{AudioOutput, OutputState};
use core_library::models::Track;
use core_playback::error::Result;
use core_playback::traits::PlaybackProvider;
use std::sync::Arc;
use std::time::Duration;

pub struct LocalPlaybackProvider {
    output: Arc<dyn AudioOutput>,
}

impl LocalPlaybackProvider {
    pub fn new(output: Arc<dyn AudioOutput>) -> Self {
        Self { output }
    }
}

#[async_trait]
impl PlaybackProvider for LocalPlaybackProvider {
    async fn play(&self, track: &Track) -> Result<bool> {
        Ok(self.output.play_uri(&track.uri).await?)
    }

    async fn resume(&self) -> Result<bool> {
        Ok(self.output.set_state(OutputState::Playing).await?)
    }

    async fn pause(&self) -> Result<bool> {
        Ok(self.output.set_state(OutputState::Paused).await?)
    }

    async fn stop(&self) -> Result<bool> {
        Ok(self.output.set_state(OutputState::Ready).await?)
    }

    async fn seek(&self, position: Duration) -> Result<bool> {
        Ok(self.output.set_position(position).await?)
    }

    async fn get_position(&self) -> Result<Duration> {
        Ok(self.output.get_position().await?)
    }
}

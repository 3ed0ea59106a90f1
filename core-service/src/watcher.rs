//! Track-end detection.
//!
//! Engines report position, not completion, so a background task polls each
//! playing backend and calls [`PlaybackController::end_of_track`] once the
//! position reaches the track length.

use core_playback::controller::{PlaybackController, PlaybackState};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

pub const TRACK_END_POLL_INTERVAL: Duration = Duration::from_millis(250);

pub fn spawn_track_end_watcher(
    playback: Arc<PlaybackController>,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            if let Err(e) = check_track_end(&playback).await {
                warn!(error = %e, "Track end check failed");
            }
        }
    })
}

async fn check_track_end(playback: &PlaybackController) -> core_playback::Result<()> {
    let status = playback.status().await?;
    if status.state != PlaybackState::Playing {
        return Ok(());
    }
    let Some(current) = status.current else {
        return Ok(());
    };
    let Some(length) = current.track.length else {
        return Ok(());
    };
    if status.elapsed < length {
        return Ok(());
    }

    debug!(id = current.id, elapsed = ?status.elapsed, ?length, "Track reached its end");
    playback.end_of_track(current.id).await
}

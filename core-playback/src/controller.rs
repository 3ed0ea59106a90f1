//! # Playback Controller
//!
//! The `STOPPED` / `PLAYING` / `PAUSED` state machine. It asks the tracklist
//! what to play and drives a [`PlaybackProvider`] to actually play it.
//!
//! ## Transitions
//!
//! | Call           | From                | To        |
//! |----------------|---------------------|-----------|
//! | `play(id)`     | any                 | `PLAYING` |
//! | `play(None)`   | `PAUSED`            | `PLAYING` (resume) |
//! | `pause()`      | `PLAYING`           | `PAUSED`  |
//! | `resume()`     | `PAUSED`            | `PLAYING` |
//! | `stop()`       | `PLAYING`, `PAUSED` | `STOPPED` |
//!
//! Calls outside the listed source states are no-ops. A provider that fails
//! or refuses a command leaves the machine in `STOPPED`; nothing is retried.
//!
//! Transitions are serialized by one async mutex that is held across the
//! provider call, so two connections racing `play` and `stop` never observe
//! a state that disagrees with what the provider was last told.

use crate::error::{PlaybackError, Result};
use crate::options::{PlaybackOption, PlaybackOptions};
use crate::tracklist::{TlId, TlTrack, TracklistController};
use crate::traits::PlaybackProvider;
use core_runtime::events::{CoreEvent, EventBus, OptionsEvent, PlaybackEvent};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Playback state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

impl fmt::Display for PlaybackState {
    /// MPD spelling, as used in `status`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlaybackState::Stopped => "stop",
            PlaybackState::Playing => "play",
            PlaybackState::Paused => "pause",
        };
        f.write_str(name)
    }
}

/// Point-in-time view used by `status`.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackStatus {
    pub state: PlaybackState,
    pub current: Option<TlTrack>,
    pub position: Option<usize>,
    pub elapsed: Duration,
    pub options: PlaybackOptions,
    pub tracklist_version: u64,
    pub tracklist_length: usize,
}

pub struct PlaybackController {
    provider: Arc<dyn PlaybackProvider>,
    tracklist: Arc<TracklistController>,
    state: tokio::sync::Mutex<PlaybackState>,
    options: Mutex<PlaybackOptions>,
    events: EventBus,
}

impl PlaybackController {
    pub fn new(
        provider: Arc<dyn PlaybackProvider>,
        tracklist: Arc<TracklistController>,
        events: EventBus,
    ) -> Self {
        Self {
            provider,
            tracklist,
            state: tokio::sync::Mutex::new(PlaybackState::Stopped),
            options: Mutex::new(PlaybackOptions::default()),
            events,
        }
    }

    pub fn tracklist(&self) -> &Arc<TracklistController> {
        &self.tracklist
    }

    pub async fn state(&self) -> PlaybackState {
        *self.state.lock().await
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    /// Plays the entry with `id`, or continues with the current entry.
    ///
    /// Without an id: a paused track resumes, a playing track keeps playing,
    /// otherwise the current entry (or the first one) starts from the top.
    ///
    /// # Errors
    ///
    /// - `NoCurrentTrack` if there is nothing to play
    /// - `NotFound` if `id` is not in the tracklist
    /// - `Provider` if the provider failed or refused; state is `STOPPED`
    pub async fn play(&self, id: Option<TlId>) -> Result<()> {
        let mut state = self.state.lock().await;

        let target = match id {
            Some(id) => self.tracklist.get(id)?,
            None => match (*state, self.tracklist.current()) {
                (PlaybackState::Paused, Some(_)) => return self.resume_locked(&mut state).await,
                (PlaybackState::Playing, Some(_)) => return Ok(()),
                (_, Some(current)) => current,
                (_, None) => self
                    .tracklist
                    .at_position(0)
                    .map_err(|_| PlaybackError::NoCurrentTrack)?,
            },
        };

        self.play_locked(&mut state, target).await
    }

    pub async fn pause(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        if *state != PlaybackState::Playing {
            return Ok(());
        }
        let outcome = self.provider.pause().await;
        self.settle(&mut state, outcome, PlaybackState::Paused, "pause")
    }

    pub async fn resume(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        self.resume_locked(&mut state).await
    }

    pub async fn stop(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        self.stop_locked(&mut state).await
    }

    /// Skips to the following entry and plays it.
    ///
    /// At the end of the tracklist this stops when playing and does nothing
    /// otherwise. With `consume` the entry being left is removed.
    pub async fn next(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        let options = self.options();
        let leaving = self.tracklist.current();
        let target = self.tracklist.next_track(&options);
        self.advance(&mut state, leaving, target, options.consume)
            .await
    }

    /// Goes back to the preceding entry and plays it.
    pub async fn previous(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        let options = self.options();
        let target = self.tracklist.previous_track(&options);
        self.advance(&mut state, None, target, false).await
    }

    /// Called when the entry `ended` has played to its end.
    ///
    /// Stale notifications are ignored: the machine is no longer `PLAYING`,
    /// or a client moved on to another entry since `ended` was observed.
    pub async fn end_of_track(&self, ended: TlId) -> Result<()> {
        let mut state = self.state.lock().await;
        if *state != PlaybackState::Playing {
            return Ok(());
        }
        if self.tracklist.current().map(|t| t.id) != Some(ended) {
            debug!(ended, "Ignoring end of a track that is no longer current");
            return Ok(());
        }
        let options = self.options();
        let leaving = self.tracklist.current();
        let target = self.tracklist.track_after_end(&options);
        debug!(next = ?target.as_ref().map(|t| t.id), "End of track");
        self.advance(&mut state, leaving, target, options.consume)
            .await
    }

    /// Seeks within the current track to `position_ms` milliseconds.
    ///
    /// # Errors
    ///
    /// `InvalidSeek` when stopped, when the position is negative or past the
    /// track length, or when the provider refuses the seek. A provider
    /// failure stops playback.
    pub async fn seek(&self, position_ms: i64) -> Result<()> {
        let mut state = self.state.lock().await;
        if *state == PlaybackState::Stopped {
            return Err(PlaybackError::InvalidSeek(
                "not playing or paused".to_string(),
            ));
        }
        let position = u64::try_from(position_ms)
            .map(Duration::from_millis)
            .map_err(|_| PlaybackError::InvalidSeek(format!("negative position {}", position_ms)))?;

        let current = self
            .tracklist
            .current()
            .ok_or(PlaybackError::NoCurrentTrack)?;
        if let Some(length) = current.track.length {
            if position > length {
                return Err(PlaybackError::InvalidSeek(format!(
                    "position {}ms is past the end of the track ({}ms)",
                    position_ms,
                    length.as_millis()
                )));
            }
        }

        match self.provider.seek(position).await {
            Ok(true) => {
                debug!(position_ms, "Seeked");
                self.events
                    .emit(CoreEvent::Playback(PlaybackEvent::Seeked {
                        position_ms: position.as_millis() as u64,
                    }))
                    .ok();
                Ok(())
            }
            Ok(false) => Err(PlaybackError::InvalidSeek(
                "seek refused by provider".to_string(),
            )),
            Err(err) => {
                self.fail(&mut state, &err);
                Err(err)
            }
        }
    }

    // ========================================================================
    // Tracklist edits that can touch the playing entry
    // ========================================================================

    /// Removes the entry `id` from the tracklist.
    ///
    /// Removing the playing entry continues playback with the entry that
    /// takes its place; with nothing left to play, or while paused, the
    /// machine stops.
    pub async fn remove(&self, id: TlId) -> Result<TlTrack> {
        let mut state = self.state.lock().await;
        let was_current = self.tracklist.current().map(|t| t.id) == Some(id);
        let removed = self.tracklist.remove(id)?;
        if was_current {
            self.follow_removed_current(&mut state).await?;
        }
        Ok(removed)
    }

    /// Removes the entries at `range`, with the same policy as
    /// [`remove`](Self::remove).
    pub async fn remove_position(&self, range: Range<usize>) -> Result<Vec<TlTrack>> {
        let mut state = self.state.lock().await;
        let current = self.tracklist.current().map(|t| t.id);
        let removed = self.tracklist.remove_position(range)?;
        if current.is_some_and(|id| removed.iter().any(|t| t.id == id)) {
            self.follow_removed_current(&mut state).await?;
        }
        Ok(removed)
    }

    /// Empties the tracklist and stops.
    pub async fn clear(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        self.tracklist.clear();
        self.stop_locked(&mut state).await
    }

    // ========================================================================
    // Options & status
    // ========================================================================

    pub fn options(&self) -> PlaybackOptions {
        *self.options.lock()
    }

    pub fn set_option(&self, option: PlaybackOption, enabled: bool) {
        self.options.lock().set(option, enabled);
        debug!(%option, enabled, "Playback option changed");
        self.events
            .emit(CoreEvent::Options(OptionsEvent::Changed {
                option: option.to_string(),
                enabled,
            }))
            .ok();
    }

    /// Position within the current track, read live from the provider.
    /// Always zero when stopped.
    pub async fn time_position(&self) -> Result<Duration> {
        let state = self.state.lock().await;
        self.position_in(*state).await
    }

    pub async fn status(&self) -> Result<PlaybackStatus> {
        let state = self.state.lock().await;
        let elapsed = self.position_in(*state).await?;
        let current = self.tracklist.current();
        let position = current
            .as_ref()
            .and_then(|c| self.tracklist.position_of(c.id));

        Ok(PlaybackStatus {
            state: *state,
            current,
            position,
            elapsed,
            options: self.options(),
            tracklist_version: self.tracklist.version(),
            tracklist_length: self.tracklist.len(),
        })
    }

    // ========================================================================
    // Internals (caller holds the state lock)
    // ========================================================================

    async fn position_in(&self, state: PlaybackState) -> Result<Duration> {
        match state {
            PlaybackState::Stopped => Ok(Duration::ZERO),
            _ => self.provider.get_position().await,
        }
    }

    async fn play_locked(&self, state: &mut PlaybackState, target: TlTrack) -> Result<()> {
        self.tracklist.set_current(Some(target.id))?;
        debug!(id = target.id, uri = %target.track.uri, "Starting track");
        let outcome = self.provider.play(&target.track).await;
        self.settle(state, outcome, PlaybackState::Playing, "play")
    }

    async fn resume_locked(&self, state: &mut PlaybackState) -> Result<()> {
        if *state != PlaybackState::Paused {
            return Ok(());
        }
        let outcome = self.provider.resume().await;
        self.settle(state, outcome, PlaybackState::Playing, "resume")
    }

    async fn stop_locked(&self, state: &mut PlaybackState) -> Result<()> {
        if *state == PlaybackState::Stopped {
            return Ok(());
        }
        let outcome = self.provider.stop().await;
        self.transition(state, PlaybackState::Stopped);
        match outcome {
            Ok(true) => Ok(()),
            Ok(false) => Err(PlaybackError::Provider("stop refused".to_string())),
            Err(err) => Err(err),
        }
    }

    async fn follow_removed_current(&self, state: &mut PlaybackState) -> Result<()> {
        match (*state, self.tracklist.current()) {
            (PlaybackState::Playing, Some(next)) => {
                debug!(id = next.id, "Playing entry removed, moving on");
                self.play_locked(state, next).await
            }
            _ => self.stop_locked(state).await,
        }
    }

    async fn advance(
        &self,
        state: &mut PlaybackState,
        leaving: Option<TlTrack>,
        target: Option<TlTrack>,
        consume: bool,
    ) -> Result<()> {
        if consume && *state != PlaybackState::Stopped {
            if let Some(leaving) = leaving {
                if target.as_ref().map(|t| t.id) != Some(leaving.id) {
                    self.tracklist.remove(leaving.id)?;
                }
            }
        }

        match target {
            Some(target) => self.play_locked(state, target).await,
            None if *state == PlaybackState::Playing => self.stop_locked(state).await,
            None => Ok(()),
        }
    }

    /// Applies a provider answer: `to` on acceptance, `STOPPED` otherwise.
    fn settle(
        &self,
        state: &mut PlaybackState,
        outcome: Result<bool>,
        to: PlaybackState,
        action: &str,
    ) -> Result<()> {
        let err = match outcome {
            Ok(true) => {
                self.transition(state, to);
                return Ok(());
            }
            Ok(false) => PlaybackError::Provider(format!("{} refused by provider", action)),
            Err(err) => err,
        };
        self.fail(state, &err);
        Err(err)
    }

    fn fail(&self, state: &mut PlaybackState, err: &PlaybackError) {
        warn!(error = %err, "Playback provider failure");
        self.events
            .emit(CoreEvent::Playback(PlaybackEvent::Error {
                message: err.to_string(),
            }))
            .ok();
        self.transition(state, PlaybackState::Stopped);
    }

    fn transition(&self, state: &mut PlaybackState, to: PlaybackState) {
        let from = *state;
        if from == to {
            return;
        }
        *state = to;

        let track_uri = self.tracklist.current().map(|t| t.track.uri);
        debug!(%from, %to, track = ?track_uri, "Playback state changed");
        self.events
            .emit(CoreEvent::Playback(PlaybackEvent::StateChanged {
                old_state: from.to_string(),
                new_state: to.to_string(),
                track_uri,
            }))
            .ok();
    }
}

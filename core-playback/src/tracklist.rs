//! # Current Playlist (Tracklist) Controller
//!
//! An ordered, versioned queue of tracks plus a "current track" cursor.
//!
//! ## Versioning
//!
//! Every mutating call increments `version`, including calls that end up
//! changing nothing (an empty `add`, a shuffle of one entry). Read-only calls
//! and cursor moves never touch it. Each entry also remembers the version at
//! which it last changed position, which is what
//! [`changes_since`](TracklistController::changes_since) reports.
//!
//! ## Current track
//!
//! The cursor refers to an entry id, never to an index, so reordering the
//! queue never changes what is current. Removing the current entry moves the
//! cursor to the entry that took its place, or unsets it when no entry
//! follows.

use crate::error::{PlaybackError, Result};
use crate::options::PlaybackOptions;
use core_library::models::{Playlist, Track};
use core_runtime::events::{CoreEvent, EventBus, TracklistEvent};
use parking_lot::Mutex;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use tracing::debug;

/// Tracklist entry id. Ids are assigned from a counter starting at 1 and are
/// never reused.
pub type TlId = u32;

/// A track together with its tracklist id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlTrack {
    pub id: TlId,
    pub track: Track,
}

#[derive(Debug, Clone)]
struct Entry {
    tl_track: TlTrack,
    changed_at: u64,
}

#[derive(Debug)]
struct TracklistState {
    entries: Vec<Entry>,
    version: u64,
    current: Option<TlId>,
    next_id: TlId,
}

impl TracklistState {
    fn position_of(&self, id: TlId) -> Option<usize> {
        self.entries.iter().position(|e| e.tl_track.id == id)
    }

    /// Increments the version and stamps every entry from `from` onwards.
    fn bump(&mut self, from: usize) -> u64 {
        self.version += 1;
        let version = self.version;
        let from = from.min(self.entries.len());
        for entry in &mut self.entries[from..] {
            entry.changed_at = version;
        }
        version
    }

    fn check_range(&self, range: &Range<usize>) -> Result<()> {
        if range.start >= range.end || range.end > self.entries.len() {
            return Err(PlaybackError::NotFound(format!(
                "bad song index {}:{}",
                range.start, range.end
            )));
        }
        Ok(())
    }

    fn insert(&mut self, tracks: Vec<Track>, at: usize) -> Vec<TlTrack> {
        let added: Vec<TlTrack> = tracks
            .into_iter()
            .map(|track| {
                let id = self.next_id;
                self.next_id += 1;
                TlTrack { id, track }
            })
            .collect();

        let entries = added.iter().cloned().map(|tl_track| Entry {
            tl_track,
            changed_at: 0,
        });
        self.entries.splice(at..at, entries);
        added
    }

    fn remove_range(&mut self, range: Range<usize>) -> Vec<TlTrack> {
        let start = range.start;
        let removed: Vec<TlTrack> = self.entries.drain(range).map(|e| e.tl_track).collect();

        if let Some(current) = self.current {
            if removed.iter().any(|t| t.id == current) {
                self.current = self.entries.get(start).map(|e| e.tl_track.id);
            }
        }
        removed
    }
}

/// Owner of the current playlist.
pub struct TracklistController {
    state: Mutex<TracklistState>,
    events: EventBus,
}

impl TracklistController {
    pub fn new(events: EventBus) -> Self {
        Self {
            state: Mutex::new(TracklistState {
                entries: Vec::new(),
                version: 0,
                current: None,
                next_id: 1,
            }),
            events,
        }
    }

    fn announce(&self, version: u64) {
        debug!(version, "Tracklist changed");
        self.events
            .emit(CoreEvent::Tracklist(TracklistEvent::Changed { version }))
            .ok();
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Appends `tracks` at the end.
    pub fn append(&self, tracks: Vec<Track>) -> Vec<TlTrack> {
        let (added, version) = {
            let mut state = self.state.lock();
            let at = state.entries.len();
            let added = state.insert(tracks, at);
            (added, state.bump(at))
        };
        self.announce(version);
        added
    }

    /// Inserts `tracks` at `at_position`, or appends when `None`.
    pub fn add(&self, tracks: Vec<Track>, at_position: Option<usize>) -> Result<Vec<TlTrack>> {
        let (added, version) = {
            let mut state = self.state.lock();
            let at = at_position.unwrap_or(state.entries.len());
            if at > state.entries.len() {
                return Err(PlaybackError::InvalidArgument(format!(
                    "position {} is past the end of the tracklist",
                    at
                )));
            }
            let added = state.insert(tracks, at);
            (added, state.bump(at))
        };
        self.announce(version);
        Ok(added)
    }

    /// Removes the entry with `id`.
    pub fn remove(&self, id: TlId) -> Result<TlTrack> {
        let (removed, version) = {
            let mut state = self.state.lock();
            let position = state
                .position_of(id)
                .ok_or_else(|| PlaybackError::NotFound(format!("no entry with id {}", id)))?;
            let mut removed = state.remove_range(position..position + 1);
            (removed.remove(0), state.bump(position))
        };
        self.announce(version);
        Ok(removed)
    }

    /// Removes the entries in `range` (positions).
    pub fn remove_position(&self, range: Range<usize>) -> Result<Vec<TlTrack>> {
        let (removed, version) = {
            let mut state = self.state.lock();
            state.check_range(&range)?;
            let start = range.start;
            let removed = state.remove_range(range);
            (removed, state.bump(start))
        };
        self.announce(version);
        Ok(removed)
    }

    /// Moves the entry with `id` to `to`.
    pub fn move_track(&self, id: TlId, to: usize) -> Result<()> {
        let from = self
            .position_of(id)
            .ok_or_else(|| PlaybackError::NotFound(format!("no entry with id {}", id)))?;
        self.move_range(from..from + 1, to)
    }

    /// Moves the entries in `range` so that the first of them ends up at `to`.
    pub fn move_range(&self, range: Range<usize>, to: usize) -> Result<()> {
        let version = {
            let mut state = self.state.lock();
            state.check_range(&range)?;
            let count = range.end - range.start;
            if to.checked_add(count).map_or(true, |end| end > state.entries.len()) {
                return Err(PlaybackError::InvalidArgument(format!(
                    "cannot move {} entries to position {}",
                    count, to
                )));
            }
            let start = range.start;
            let moved: Vec<Entry> = state.entries.drain(range).collect();
            state.entries.splice(to..to, moved);
            state.bump(start.min(to))
        };
        self.announce(version);
        Ok(())
    }

    /// Removes every entry and unsets the cursor.
    pub fn clear(&self) {
        let version = {
            let mut state = self.state.lock();
            state.entries.clear();
            state.current = None;
            state.bump(0)
        };
        self.announce(version);
    }

    /// Shuffles the entries in `range`, or the whole list when `None`.
    pub fn shuffle(&self, range: Option<Range<usize>>) -> Result<()> {
        let version = {
            let mut state = self.state.lock();
            let range = range.unwrap_or(0..state.entries.len());
            if !range.is_empty() {
                state.check_range(&range)?;
            }
            let start = range.start;
            state.entries[range].shuffle(&mut rand::thread_rng());
            state.bump(start)
        };
        self.announce(version);
        Ok(())
    }

    /// Replaces the whole list with the tracks of `playlist`.
    pub fn load(&self, playlist: &Playlist) -> Vec<TlTrack> {
        let (added, version) = {
            let mut state = self.state.lock();
            state.entries.clear();
            state.current = None;
            let added = state.insert(playlist.tracks.clone(), 0);
            (added, state.bump(0))
        };
        self.announce(version);
        added
    }

    // ========================================================================
    // Reads
    // ========================================================================

    pub fn version(&self) -> u64 {
        self.state.lock().version
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn tracks(&self) -> Vec<TlTrack> {
        self.state
            .lock()
            .entries
            .iter()
            .map(|e| e.tl_track.clone())
            .collect()
    }

    pub fn get(&self, id: TlId) -> Result<TlTrack> {
        let state = self.state.lock();
        state
            .position_of(id)
            .map(|position| state.entries[position].tl_track.clone())
            .ok_or_else(|| PlaybackError::NotFound(format!("no entry with id {}", id)))
    }

    pub fn at_position(&self, position: usize) -> Result<TlTrack> {
        self.state
            .lock()
            .entries
            .get(position)
            .map(|e| e.tl_track.clone())
            .ok_or_else(|| PlaybackError::NotFound(format!("bad song index {}", position)))
    }

    pub fn position_of(&self, id: TlId) -> Option<usize> {
        self.state.lock().position_of(id)
    }

    /// Entries whose position changed after `version`, with their positions.
    pub fn changes_since(&self, version: u64) -> Vec<(usize, TlTrack)> {
        self.state
            .lock()
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.changed_at > version)
            .map(|(position, e)| (position, e.tl_track.clone()))
            .collect()
    }

    // ========================================================================
    // Cursor
    // ========================================================================

    pub fn current(&self) -> Option<TlTrack> {
        let state = self.state.lock();
        state
            .current
            .and_then(|id| state.position_of(id))
            .map(|position| state.entries[position].tl_track.clone())
    }

    /// Points the cursor at `id`, or unsets it. Does not change the version.
    pub fn set_current(&self, id: Option<TlId>) -> Result<()> {
        let mut state = self.state.lock();
        if let Some(id) = id {
            if state.position_of(id).is_none() {
                return Err(PlaybackError::NotFound(format!("no entry with id {}", id)));
            }
        }
        state.current = id;
        Ok(())
    }

    /// Entry that follows the current one under `options`.
    pub fn next_track(&self, options: &PlaybackOptions) -> Option<TlTrack> {
        let state = self.state.lock();
        if state.entries.is_empty() {
            return None;
        }

        let current = state.current.and_then(|id| state.position_of(id));
        let pick = match current {
            None if options.random => Some(rand::thread_rng().gen_range(0..state.entries.len())),
            None => Some(0),
            Some(position) if options.single && options.repeat => Some(position),
            Some(position) if options.random => {
                let others: Vec<usize> = (0..state.entries.len())
                    .filter(|&p| p != position)
                    .collect();
                match others.choose(&mut rand::thread_rng()) {
                    Some(&other) => Some(other),
                    None if options.repeat => Some(position),
                    None => None,
                }
            }
            Some(position) if position + 1 < state.entries.len() => Some(position + 1),
            Some(_) if options.repeat => Some(0),
            Some(_) => None,
        };

        pick.map(|position| state.entries[position].tl_track.clone())
    }

    /// Entry that precedes the current one under `options`.
    pub fn previous_track(&self, options: &PlaybackOptions) -> Option<TlTrack> {
        let state = self.state.lock();
        let position = state.current.and_then(|id| state.position_of(id))?;

        let pick = match position {
            _ if options.single && options.repeat => Some(position),
            0 if options.repeat => state.entries.len().checked_sub(1),
            0 => None,
            p => Some(p - 1),
        };

        pick.map(|position| state.entries[position].tl_track.clone())
    }

    /// Entry to continue with once the current track has played to the end.
    pub fn track_after_end(&self, options: &PlaybackOptions) -> Option<TlTrack> {
        if options.single && !options.repeat {
            return None;
        }
        self.next_track(options)
    }
}

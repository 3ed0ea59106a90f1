//! Playback mode switches.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the four MPD playback mode switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackOption {
    /// Wrap around at the end of the tracklist.
    Repeat,
    /// Pick the next track at random.
    Random,
    /// Stop after the current track (or loop it with `Repeat`).
    Single,
    /// Remove tracks from the tracklist once they have been played.
    Consume,
}

impl fmt::Display for PlaybackOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlaybackOption::Repeat => "repeat",
            PlaybackOption::Random => "random",
            PlaybackOption::Single => "single",
            PlaybackOption::Consume => "consume",
        };
        f.write_str(name)
    }
}

/// Current value of every playback switch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackOptions {
    pub repeat: bool,
    pub random: bool,
    pub single: bool,
    pub consume: bool,
}

impl PlaybackOptions {
    pub fn get(&self, option: PlaybackOption) -> bool {
        match option {
            PlaybackOption::Repeat => self.repeat,
            PlaybackOption::Random => self.random,
            PlaybackOption::Single => self.single,
            PlaybackOption::Consume => self.consume,
        }
    }

    pub fn set(&mut self, option: PlaybackOption, enabled: bool) {
        match option {
            PlaybackOption::Repeat => self.repeat = enabled,
            PlaybackOption::Random => self.random = enabled,
            PlaybackOption::Single => self.single = enabled,
            PlaybackOption::Consume => self.consume = enabled,
        }
    }
}

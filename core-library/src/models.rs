//! Value models for the music library
//!
//! Immutable records shared by every controller and backend. Equality and
//! hashing cover every field; the `artists` collections of [`Album`] and
//! [`Track`] compare as sets, so insertion order never affects equality while
//! iteration still yields the original order. A [`Playlist`]'s `tracks` are
//! order-significant.
//!
//! Updates never happen in place: [`Model::copy_with`] produces a new
//! instance with some fields overridden and leaves the source untouched.

use crate::error::{LibraryError, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};
use std::time::Duration;

// =============================================================================
// Copy With Overrides
// =============================================================================

/// Behaviour shared by all value models.
pub trait Model: Clone + Serialize + DeserializeOwned {
    /// Returns a new instance with the fields named in `overrides` replaced.
    ///
    /// `overrides` must be a JSON object whose keys are existing field names.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::InvalidInput` when a key does not name a field
    /// or a value does not fit the field's type.
    ///
    /// ```ignore
    /// let renamed = playlist.copy_with(json!({ "name": "Road trip" }))?;
    /// ```
    fn copy_with(&self, overrides: serde_json::Value) -> Result<Self> {
        let serde_json::Value::Object(overrides) = overrides else {
            return Err(LibraryError::InvalidInput {
                field: "overrides".to_string(),
                message: "expected an object of field overrides".to_string(),
            });
        };

        let mut fields = match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(fields)) => fields,
            Ok(_) => {
                return Err(LibraryError::InvalidInput {
                    field: "overrides".to_string(),
                    message: "model does not serialize to an object".to_string(),
                })
            }
            Err(e) => {
                return Err(LibraryError::InvalidInput {
                    field: "overrides".to_string(),
                    message: e.to_string(),
                })
            }
        };

        for (field, value) in overrides {
            if !fields.contains_key(&field) {
                return Err(LibraryError::InvalidInput {
                    message: format!("unknown field '{}'", field),
                    field,
                });
            }

            // Check each override on its own so the error names the field
            let mut candidate = fields.clone();
            candidate.insert(field.clone(), value.clone());
            if let Err(e) = serde_json::from_value::<Self>(serde_json::Value::Object(candidate)) {
                return Err(LibraryError::InvalidInput {
                    field,
                    message: e.to_string(),
                });
            }
            fields.insert(field, value);
        }

        serde_json::from_value(serde_json::Value::Object(fields)).map_err(|e| {
            LibraryError::InvalidInput {
                field: "overrides".to_string(),
                message: e.to_string(),
            }
        })
    }
}

/// Artist set used for order-independent equality and hashing.
fn artist_set(artists: &[Artist]) -> BTreeSet<&Artist> {
    artists.iter().collect()
}

// =============================================================================
// Artist
// =============================================================================

/// Performing artist.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(deny_unknown_fields)]
pub struct Artist {
    pub uri: Option<String>,
    pub name: Option<String>,
    pub musicbrainz_id: Option<String>,
}

impl Artist {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }
}

impl Model for Artist {}

// =============================================================================
// Album
// =============================================================================

/// Album with its (set-compared) artists.
#[derive(Debug, Clone, Default, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Album {
    pub uri: Option<String>,
    pub name: Option<String>,
    pub artists: Vec<Artist>,
    pub num_tracks: Option<u32>,
    pub musicbrainz_id: Option<String>,
}

impl Album {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }
}

impl PartialEq for Album {
    fn eq(&self, other: &Self) -> bool {
        self.uri == other.uri
            && self.name == other.name
            && artist_set(&self.artists) == artist_set(&other.artists)
            && self.num_tracks == other.num_tracks
            && self.musicbrainz_id == other.musicbrainz_id
    }
}

impl Hash for Album {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.uri.hash(state);
        self.name.hash(state);
        artist_set(&self.artists).hash(state);
        self.num_tracks.hash(state);
        self.musicbrainz_id.hash(state);
    }
}

impl Model for Album {}

// =============================================================================
// Track
// =============================================================================

/// A playable track.
#[derive(Debug, Clone, Default, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Track {
    pub uri: String,
    pub name: String,
    pub artists: Vec<Artist>,
    pub album: Option<Album>,
    pub track_no: Option<u32>,
    pub date: Option<NaiveDate>,
    /// Track length, serialized as whole milliseconds.
    #[serde(default, with = "duration_ms")]
    pub length: Option<Duration>,
    /// Bitrate in kbit/s.
    pub bitrate: Option<u32>,
    pub musicbrainz_id: Option<String>,
}

impl Track {
    pub fn new(uri: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Artist names in iteration order, skipping unnamed artists.
    pub fn artist_names(&self) -> impl Iterator<Item = &str> {
        self.artists.iter().filter_map(|a| a.name.as_deref())
    }

    pub fn album_name(&self) -> Option<&str> {
        self.album.as_ref().and_then(|a| a.name.as_deref())
    }
}

impl PartialEq for Track {
    fn eq(&self, other: &Self) -> bool {
        self.uri == other.uri
            && self.name == other.name
            && artist_set(&self.artists) == artist_set(&other.artists)
            && self.album == other.album
            && self.track_no == other.track_no
            && self.date == other.date
            && self.length == other.length
            && self.bitrate == other.bitrate
            && self.musicbrainz_id == other.musicbrainz_id
    }
}

impl Hash for Track {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.uri.hash(state);
        self.name.hash(state);
        artist_set(&self.artists).hash(state);
        self.album.hash(state);
        self.track_no.hash(state);
        self.date.hash(state);
        self.length.hash(state);
        self.bitrate.hash(state);
        self.musicbrainz_id.hash(state);
    }
}

impl Model for Track {}

// =============================================================================
// Playlist
// =============================================================================

/// Ordered list of tracks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Playlist {
    /// Assigned by storage; `None` until the playlist has been persisted.
    pub uri: Option<String>,
    pub name: String,
    pub tracks: Vec<Track>,
    pub last_modified: Option<DateTime<Utc>>,
}

impl Playlist {
    pub fn new(name: impl Into<String>, tracks: Vec<Track>) -> Self {
        Self {
            name: name.into(),
            tracks,
            ..Default::default()
        }
    }

    /// Number of tracks.
    pub fn length(&self) -> usize {
        self.tracks.len()
    }

    /// Whether `other` refers to the same stored playlist.
    ///
    /// URIs decide when both sides have one; otherwise names do.
    pub fn is_same_playlist(&self, other: &Playlist) -> bool {
        match (&self.uri, &other.uri) {
            (Some(a), Some(b)) => a == b,
            _ => self.name == other.name,
        }
    }
}

impl Model for Playlist {}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => serializer.serialize_some(&(d.as_millis() as u64)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
    }
}

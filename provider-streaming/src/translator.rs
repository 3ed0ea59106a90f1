//! SDK objects to value models.

use crate::session::{SdkAlbum, SdkArtist, SdkPlaylist, SdkPlaylistKind, SdkTrack};
use chrono::NaiveDate;
use core_library::models::{Album, Artist, Playlist, Track};
use std::time::Duration;
use tracing::warn;

/// Name given to objects the SDK has not finished loading.
pub const LOADING: &str = "[loading...]";

pub const HIGH_BITRATE: u32 = 320;
pub const NORMAL_BITRATE: u32 = 160;

#[derive(Debug, Clone, Copy)]
pub struct Translator {
    bitrate: u32,
}

impl Translator {
    pub fn new(high_bitrate: bool) -> Self {
        Self {
            bitrate: if high_bitrate {
                HIGH_BITRATE
            } else {
                NORMAL_BITRATE
            },
        }
    }

    pub fn to_artist(&self, artist: &SdkArtist) -> Artist {
        if !artist.loaded {
            return Artist::named(LOADING);
        }
        Artist {
            uri: Some(artist.link.clone()),
            ..Artist::named(artist.name.clone())
        }
    }

    pub fn to_album(&self, album: &SdkAlbum) -> Album {
        if !album.loaded {
            return Album::named(LOADING);
        }
        Album::named(album.name.clone())
    }

    pub fn to_track(&self, track: &SdkTrack) -> Track {
        if !track.loaded {
            return Track::new("", LOADING);
        }
        Track {
            artists: track.artists.iter().map(|a| self.to_artist(a)).collect(),
            album: Some(self.to_album(&track.album)),
            track_no: Some(track.index),
            date: year_to_date(track.album.year),
            length: Some(Duration::from_millis(track.duration_ms)),
            bitrate: Some(self.bitrate),
            ..Track::new(track.link.clone(), track.name.clone())
        }
    }

    /// `None` for folder markers in the playlist container.
    pub fn to_playlist(&self, playlist: &SdkPlaylist) -> Option<Playlist> {
        if playlist.kind != SdkPlaylistKind::Playlist {
            warn!(
                name = %playlist.name,
                kind = ?playlist.kind,
                "Skipping playlist folder boundary"
            );
            return None;
        }
        if !playlist.loaded {
            return Some(Playlist::new(LOADING, Vec::new()));
        }
        Some(Playlist {
            uri: Some(playlist.link.clone()),
            ..Playlist::new(
                playlist.name.clone(),
                playlist.tracks.iter().map(|t| self.to_track(t)).collect(),
            )
        })
    }
}

/// January 1st of `year`, if it is a valid calendar year.
fn year_to_date(year: i32) -> Option<NaiveDate> {
    if !(1..=9999).contains(&year) {
        return None;
    }
    NaiveDate::from_ymd_opt(year, 1, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artist() -> SdkArtist {
        SdkArtist {
            link: "spotify:artist:1".to_string(),
            name: "Artist".to_string(),
            loaded: true,
        }
    }

    fn track(year: i32) -> SdkTrack {
        SdkTrack {
            link: "spotify:track:1".to_string(),
            name: "Song".to_string(),
            artists: vec![artist()],
            album: SdkAlbum {
                link: "spotify:album:1".to_string(),
                name: "Record".to_string(),
                year,
                loaded: true,
            },
            index: 4,
            duration_ms: 215_000,
            loaded: true,
        }
    }

    #[test]
    fn translates_loaded_track() {
        let translated = Translator::new(true).to_track(&track(2009));
        assert_eq!(translated.uri, "spotify:track:1");
        assert_eq!(translated.name, "Song");
        assert_eq!(translated.artists[0].uri.as_deref(), Some("spotify:artist:1"));
        assert_eq!(translated.album_name(), Some("Record"));
        assert_eq!(translated.track_no, Some(4));
        assert_eq!(translated.date, NaiveDate::from_ymd_opt(2009, 1, 1));
        assert_eq!(translated.length, Some(Duration::from_millis(215_000)));
        assert_eq!(translated.bitrate, Some(HIGH_BITRATE));
    }

    #[test]
    fn invalid_year_has_no_date() {
        let translator = Translator::new(false);
        assert_eq!(translator.to_track(&track(0)).date, None);
        assert_eq!(translator.to_track(&track(10_000)).date, None);
        assert_eq!(translator.to_track(&track(0)).bitrate, Some(NORMAL_BITRATE));
    }

    #[test]
    fn unloaded_objects_are_placeholders() {
        let translator = Translator::new(false);
        let unloaded = SdkTrack {
            loaded: false,
            ..track(2000)
        };
        assert_eq!(translator.to_track(&unloaded).name, LOADING);

        let unloaded = SdkArtist {
            loaded: false,
            ..artist()
        };
        assert_eq!(translator.to_artist(&unloaded), Artist::named(LOADING));
    }

    #[test]
    fn folder_boundaries_are_skipped() {
        let translator = Translator::new(false);
        let folder = SdkPlaylist {
            link: String::new(),
            name: "Folder".to_string(),
            kind: SdkPlaylistKind::FolderStart,
            tracks: Vec::new(),
            loaded: true,
        };
        assert!(translator.to_playlist(&folder).is_none());

        let playlist = SdkPlaylist {
            link: "spotify:user:me:playlist:1".to_string(),
            name: "Mine".to_string(),
            kind: SdkPlaylistKind::Playlist,
            tracks: vec![track(1999)],
            loaded: true,
        };
        let translated = translator.to_playlist(&playlist).unwrap();
        assert_eq!(translated.uri.as_deref(), Some("spotify:user:me:playlist:1"));
        assert_eq!(translated.length(), 1);
    }
}

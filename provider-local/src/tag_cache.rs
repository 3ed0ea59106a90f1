//! MPD tag cache parser.
//!
//! The tag cache is MPD's own database dump: a header, then nested
//! `directory:`/`begin:`/`end:` blocks each holding a `songList begin` ..
//! `songList end` section. Inside a song list every `key:` line opens a new
//! song and the following `Tag: value` lines describe it.
//!
//! ```text
//! songList begin
//! key: song1.mp3
//! file: subdir/song1.mp3
//! Time: 4
//! Artist: name
//! Title: trackname
//! Album: albumname
//! Track: 1/2
//! Date: 2006
//! songList end
//! ```

use crate::error::{LocalError, Result};
use crate::uri::path_to_uri_in;
use chrono::NaiveDate;
use core_library::models::{Album, Artist, Track};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

const SONG_LIST_BEGIN: &str = "songList begin";
const SONG_LIST_END: &str = "songList end";

type Song<'a> = HashMap<&'a str, &'a str>;

/// Parses `contents` into tracks whose URIs point below `music_path`.
///
/// Songs without a `file` tag are skipped with a warning. A line inside a
/// song list that is not a `key: value` pair fails the whole parse.
pub fn parse_tag_cache(contents: &str, music_path: &Path) -> Result<Vec<Track>> {
    let mut tracks = Vec::new();
    let mut in_song_list = false;
    let mut song: Option<Song<'_>> = None;

    for (index, raw) in contents.lines().enumerate() {
        let line = raw.trim_end_matches('\r');

        match line {
            SONG_LIST_BEGIN => {
                in_song_list = true;
                continue;
            }
            SONG_LIST_END => {
                flush(song.take(), music_path, &mut tracks);
                in_song_list = false;
                continue;
            }
            "" => continue,
            _ if !in_song_list => continue,
            _ => {}
        }

        let (key, value) = line
            .split_once(':')
            .map(|(key, value)| (key, value.strip_prefix(' ').unwrap_or(value)))
            .ok_or_else(|| LocalError::MalformedTagCache {
                line: index + 1,
                content: line.to_string(),
            })?;

        if key == "key" {
            flush(song.replace(Song::new()), music_path, &mut tracks);
        } else if let Some(song) = song.as_mut() {
            song.insert(key, value);
        }
    }

    flush(song, music_path, &mut tracks);
    Ok(tracks)
}

fn flush(song: Option<Song<'_>>, music_path: &Path, tracks: &mut Vec<Track>) {
    if let Some(song) = song {
        match song_to_track(&song, music_path) {
            Some(track) => tracks.push(track),
            None => warn!(?song, "Skipping tag cache entry without file"),
        }
    }
}

fn song_to_track(song: &Song<'_>, music_path: &Path) -> Option<Track> {
    let file = song.get("file")?;
    let tag = |name: &str| song.get(name).map(|v| v.to_string());

    let (track_no, num_tracks) = song
        .get("Track")
        .map(|value| parse_track_number(value))
        .unwrap_or((None, None));

    let artists = tag("Artist")
        .map(|name| {
            vec![Artist {
                musicbrainz_id: tag("MUSICBRAINZ_ARTISTID"),
                ..Artist::named(name)
            }]
        })
        .unwrap_or_default();

    let album_artists = tag("AlbumArtist")
        .map(|name| {
            vec![Artist {
                musicbrainz_id: tag("MUSICBRAINZ_ALBUMARTISTID"),
                ..Artist::named(name)
            }]
        })
        .unwrap_or_default();

    let album = match tag("Album") {
        None if album_artists.is_empty() && num_tracks.is_none() => None,
        name => Some(Album {
            uri: None,
            name,
            artists: album_artists,
            num_tracks,
            musicbrainz_id: tag("MUSICBRAINZ_ALBUMID"),
        }),
    };

    Some(Track {
        uri: path_to_uri_in(music_path, file),
        name: tag("Title").unwrap_or_default(),
        artists,
        album,
        track_no,
        date: song.get("Date").and_then(|value| parse_year(value)),
        length: song
            .get("Time")
            .and_then(|value| value.trim().parse::<u64>().ok())
            .map(Duration::from_secs),
        bitrate: None,
        musicbrainz_id: tag("MUSICBRAINZ_TRACKID"),
    })
}

/// `"3"` or `"3/12"`.
fn parse_track_number(value: &str) -> (Option<u32>, Option<u32>) {
    match value.split_once('/') {
        Some((number, total)) => (number.trim().parse().ok(), total.trim().parse().ok()),
        None => (value.trim().parse().ok(), None),
    }
}

/// Only the year is kept; `"2006-05-01"` and `"2006"` both become 2006-01-01.
fn parse_year(value: &str) -> Option<NaiveDate> {
    let year: i32 = value.get(..4)?.parse().ok()?;
    NaiveDate::from_ymd_opt(year, 1, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TAG_CACHE: &str = "\
info_begin
mpd_version: 0.15.4
fs_charset: UTF-8
info_end
directory: subdir1
begin: subdir1
songList begin
key: song4.mp3
file: subdir1/song4.mp3
Time: 5
Artist: name
AlbumArtist: album artist
Title: trackname
Album: albumname
Track: 01/02
Date: 2006-03-01
MUSICBRAINZ_TRACKID: 0f6f6fdc
mtime: 1288121370
songList end
end: subdir1
songList begin
key: song1.mp3
file: /song1.mp3
Time: 4
mtime: 1288121370
key: orphan.mp3
Time: 4
songList end
";

    #[test]
    fn parses_songs_across_directories() {
        let tracks = parse_tag_cache(TAG_CACHE, Path::new("/music")).unwrap();
        assert_eq!(tracks.len(), 2);

        let song = &tracks[0];
        assert_eq!(song.uri, "file:///music/subdir1/song4.mp3");
        assert_eq!(song.name, "trackname");
        assert_eq!(song.artist_names().collect::<Vec<_>>(), vec!["name"]);
        assert_eq!(song.album_name(), Some("albumname"));
        assert_eq!(song.track_no, Some(1));
        assert_eq!(song.length, Some(Duration::from_secs(5)));
        assert_eq!(song.date, NaiveDate::from_ymd_opt(2006, 1, 1));
        assert_eq!(song.musicbrainz_id.as_deref(), Some("0f6f6fdc"));

        let album = song.album.as_ref().unwrap();
        assert_eq!(album.num_tracks, Some(2));
        assert_eq!(album.artists, vec![Artist::named("album artist")]);
    }

    #[test]
    fn sparse_song_has_no_album() {
        let tracks = parse_tag_cache(TAG_CACHE, Path::new("/music")).unwrap();
        let song = &tracks[1];
        assert_eq!(song.uri, "file:///song1.mp3");
        assert_eq!(song.name, "");
        assert!(song.album.is_none());
        assert!(song.artists.is_empty());
    }

    #[test]
    fn malformed_line_reports_position() {
        let err = parse_tag_cache("songList begin\nkey: a\nnonsense\n", Path::new("/"))
            .unwrap_err();
        assert!(matches!(err, LocalError::MalformedTagCache { line: 3, .. }));
    }

    #[test]
    fn empty_cache_has_no_tracks() {
        assert!(parse_tag_cache("", Path::new("/")).unwrap().is_empty());
        assert!(parse_tag_cache("info_begin\ninfo_end\n", Path::new("/"))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn track_and_date_formats() {
        assert_eq!(parse_track_number("3"), (Some(3), None));
        assert_eq!(parse_track_number("3/12"), (Some(3), Some(12)));
        assert_eq!(parse_track_number("x"), (None, None));
        assert_eq!(parse_year("1999"), NaiveDate::from_ymd_opt(1999, 1, 1));
        assert_eq!(parse_year("99"), None);
    }
}

//! Response formatting.
//!
//! Turns models and controller snapshots into MPD `key: value` lines.

use chrono::{DateTime, Datelike, SecondsFormat, Utc};
use core_library::models::{Playlist, Track};
use core_playback::controller::PlaybackStatus;
use core_playback::tracklist::TlTrack;

fn flag(enabled: bool) -> &'static str {
    if enabled {
        "1"
    } else {
        "0"
    }
}

/// Song block for a track outside the tracklist.
pub fn track_lines(track: &Track) -> Vec<String> {
    let mut lines = vec![format!("file: {}", track.uri)];

    if let Some(length) = track.length {
        lines.push(format!("Time: {}", length.as_secs()));
    }
    let artists: Vec<&str> = track.artist_names().collect();
    if !artists.is_empty() {
        lines.push(format!("Artist: {}", artists.join(", ")));
    }
    lines.push(format!("Title: {}", track.name));
    if let Some(album) = track.album_name() {
        lines.push(format!("Album: {}", album));
    }
    if let Some(track_no) = track.track_no {
        match track.album.as_ref().and_then(|a| a.num_tracks) {
            Some(total) => lines.push(format!("Track: {}/{}", track_no, total)),
            None => lines.push(format!("Track: {}", track_no)),
        }
    }
    if let Some(date) = track.date {
        lines.push(format!("Date: {}", date.year()));
    }
    if let Some(id) = &track.musicbrainz_id {
        lines.push(format!("MUSICBRAINZ_TRACKID: {}", id));
    }
    if let Some(id) = track.album.as_ref().and_then(|a| a.musicbrainz_id.as_ref()) {
        lines.push(format!("MUSICBRAINZ_ALBUMID: {}", id));
    }
    if let Some(id) = track.artists.iter().find_map(|a| a.musicbrainz_id.as_ref()) {
        lines.push(format!("MUSICBRAINZ_ARTISTID: {}", id));
    }
    lines
}

/// Song block for a tracklist entry at `position`.
pub fn tl_track_lines(tl_track: &TlTrack, position: usize) -> Vec<String> {
    let mut lines = track_lines(&tl_track.track);
    lines.push(format!("Pos: {}", position));
    lines.push(format!("Id: {}", tl_track.id));
    lines
}

pub fn tracks_lines<'a>(tracks: impl IntoIterator<Item = &'a Track>) -> Vec<String> {
    tracks.into_iter().flat_map(track_lines).collect()
}

pub fn status_lines(status: &PlaybackStatus) -> Vec<String> {
    let options = &status.options;
    let mut lines = vec![
        "volume: -1".to_string(),
        format!("repeat: {}", flag(options.repeat)),
        format!("random: {}", flag(options.random)),
        format!("single: {}", flag(options.single)),
        format!("consume: {}", flag(options.consume)),
        format!("playlist: {}", status.tracklist_version),
        format!("playlistlength: {}", status.tracklist_length),
        format!("state: {}", status.state),
    ];

    if let (Some(current), Some(position)) = (&status.current, status.position) {
        lines.push(format!("song: {}", position));
        lines.push(format!("songid: {}", current.id));

        let elapsed = status.elapsed;
        let total = current.track.length.map(|l| l.as_secs()).unwrap_or(0);
        lines.push(format!("time: {}:{}", elapsed.as_secs(), total));
        lines.push(format!("elapsed: {:.3}", elapsed.as_secs_f64()));
        if let Some(bitrate) = current.track.bitrate {
            lines.push(format!("bitrate: {}", bitrate));
        }
    }
    lines
}

pub fn stored_playlist_lines(playlist: &Playlist) -> Vec<String> {
    let mut lines = vec![format!("playlist: {}", playlist.name)];
    if let Some(modified) = playlist.last_modified {
        lines.push(format!("Last-Modified: {}", iso8601(modified)));
    }
    lines
}

fn iso8601(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use core_library::models::{Album, Artist};
    use core_playback::controller::PlaybackState;
    use std::time::Duration;

    fn track() -> Track {
        Track {
            artists: vec![Artist::named("Low")],
            album: Some(Album {
                num_tracks: Some(12),
                ..Album::named("Things We Lost")
            }),
            track_no: Some(3),
            date: NaiveDate::from_ymd_opt(2001, 1, 22),
            length: Some(Duration::from_secs(245)),
            ..Track::new("file:///music/low.mp3", "Sunflower")
        }
    }

    #[test]
    fn formats_song_block() {
        let lines = tl_track_lines(&TlTrack { id: 7, track: track() }, 2);
        assert_eq!(
            lines,
            vec![
                "file: file:///music/low.mp3",
                "Time: 245",
                "Artist: Low",
                "Title: Sunflower",
                "Album: Things We Lost",
                "Track: 3/12",
                "Date: 2001",
                "Pos: 2",
                "Id: 7",
            ]
        );
    }

    #[test]
    fn status_includes_song_only_when_current() {
        let mut status = PlaybackStatus {
            state: PlaybackState::Stopped,
            current: None,
            position: None,
            elapsed: Duration::ZERO,
            options: Default::default(),
            tracklist_version: 4,
            tracklist_length: 0,
        };
        let lines = status_lines(&status);
        assert!(lines.contains(&"state: stop".to_string()));
        assert!(lines.contains(&"playlist: 4".to_string()));
        assert!(!lines.iter().any(|l| l.starts_with("song:")));

        status.state = PlaybackState::Playing;
        status.current = Some(TlTrack { id: 1, track: track() });
        status.position = Some(0);
        status.elapsed = Duration::from_millis(1500);
        let lines = status_lines(&status);
        assert!(lines.contains(&"songid: 1".to_string()));
        assert!(lines.contains(&"time: 1:245".to_string()));
        assert!(lines.contains(&"elapsed: 1.500".to_string()));
    }

    #[test]
    fn stored_playlist_timestamp_is_utc() {
        let playlist = Playlist {
            last_modified: Some(Utc.with_ymd_and_hms(2011, 3, 4, 5, 6, 7).unwrap()),
            ..Playlist::new("mix", Vec::new())
        };
        assert_eq!(
            stored_playlist_lines(&playlist),
            vec!["playlist: mix", "Last-Modified: 2011-03-04T05:06:07Z"]
        );
    }
}

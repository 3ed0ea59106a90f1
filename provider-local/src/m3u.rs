//! Plain M3U playlists.

use crate::uri::{path_to_uri, path_to_uri_in, FILE_SCHEME};
use core_library::models::Track;
use std::path::Path;

/// Reads the entries of an M3U file as track URIs.
///
/// Comments and blank lines are skipped. `file://` URIs are kept as they are,
/// absolute paths get the scheme prefixed and relative paths are resolved
/// against `folder`, the directory holding the playlist.
pub fn parse_m3u(contents: &str, folder: &Path) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| {
            if line.starts_with(FILE_SCHEME) {
                line.to_string()
            } else if Path::new(line).is_absolute() {
                path_to_uri(Path::new(line))
            } else {
                path_to_uri_in(folder, line)
            }
        })
        .collect()
}

/// Serializes `tracks` one per line, local files as bare paths.
pub fn write_m3u(tracks: &[Track]) -> String {
    tracks
        .iter()
        .map(|track| {
            let entry = track.uri.strip_prefix(FILE_SCHEME).unwrap_or(&track.uri);
            format!("{}\n", entry)
        })
        .collect()
}

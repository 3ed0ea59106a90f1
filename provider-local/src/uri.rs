//! `file://` URI helpers.
//!
//! URIs are the plain absolute path behind the scheme, without
//! percent-encoding, so tag cache entries and playlist entries written by
//! hand resolve to the same string.

use std::path::{Path, PathBuf};

pub const FILE_SCHEME: &str = "file://";

pub fn path_to_uri(path: &Path) -> String {
    format!("{}{}", FILE_SCHEME, path.display())
}

/// URI for `relative` inside `folder`. Absolute `relative` paths win.
pub fn path_to_uri_in(folder: &Path, relative: &str) -> String {
    path_to_uri(&folder.join(relative))
}

pub fn uri_to_path(uri: &str) -> Option<PathBuf> {
    uri.strip_prefix(FILE_SCHEME).map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_relative_paths() {
        assert_eq!(
            path_to_uri_in(Path::new("/music"), "a/b.mp3"),
            "file:///music/a/b.mp3"
        );
        assert_eq!(
            path_to_uri_in(Path::new("/music"), "/elsewhere/c.mp3"),
            "file:///elsewhere/c.mp3"
        );
    }

    #[test]
    fn strips_scheme() {
        assert_eq!(
            uri_to_path("file:///music/a.mp3"),
            Some(PathBuf::from("/music/a.mp3"))
        );
        assert_eq!(uri_to_path("spotify:track:1"), None);
    }
}

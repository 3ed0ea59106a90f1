//! Stored playlists as `<name>.m3u` files in one folder.

use crate::error::LocalError;
use crate::m3u::{parse_m3u, write_m3u};
use crate::uri::path_to_uri;
use async_trait::async_trait;
use bridge_traits::storage::FileSystemAccess;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use core_library::error::Result;
use core_library::models::Playlist;
use core_library::playlists::{PlaylistRecord, StoredPlaylistsProvider};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

const EXTENSION: &str = "m3u";

pub struct M3uPlaylistsProvider {
    fs: Arc<dyn FileSystemAccess>,
    folder: PathBuf,
}

impl M3uPlaylistsProvider {
    pub fn new(fs: Arc<dyn FileSystemAccess>, folder: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            folder: folder.into(),
        }
    }

    fn path_for(&self, name: &str) -> std::result::Result<PathBuf, LocalError> {
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            return Err(LocalError::InvalidPlaylistName(name.to_string()));
        }
        Ok(self.folder.join(format!("{}.{}", name, EXTENSION)))
    }

    fn is_playlist_file(path: &Path) -> bool {
        path.extension().is_some_and(|ext| ext == EXTENSION)
    }
}

#[async_trait]
impl StoredPlaylistsProvider for M3uPlaylistsProvider {
    async fn load_all(&self) -> Result<Vec<PlaylistRecord>> {
        info!(folder = ?self.folder, "Loading playlists");

        if !self.fs.exists(&self.folder).await? {
            return Ok(Vec::new());
        }

        let mut records = Vec::new();
        for path in self.fs.list_directory(&self.folder).await? {
            if !Self::is_playlist_file(&path) {
                continue;
            }
            let Some(name) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
                continue;
            };

            let contents = self.fs.read_to_string(&path).await?;
            let last_modified = self
                .fs
                .metadata(&path)
                .await?
                .modified_at
                .and_then(|secs| DateTime::from_timestamp(secs, 0));
            records.push(PlaylistRecord {
                uri: path_to_uri(&path),
                name,
                track_uris: parse_m3u(&contents, &self.folder),
                last_modified,
            });
        }

        debug!(count = records.len(), "Read playlist files");
        Ok(records)
    }

    async fn save(&self, playlist: &Playlist) -> Result<Playlist> {
        let path = self.path_for(&playlist.name)?;
        self.fs.create_dir_all(&self.folder).await?;
        self.fs
            .write_file(&path, Bytes::from(write_m3u(&playlist.tracks)))
            .await?;

        Ok(Playlist {
            uri: Some(path_to_uri(&path)),
            last_modified: Some(Utc::now()),
            ..playlist.clone()
        })
    }

    async fn delete(&self, playlist: &Playlist) -> Result<()> {
        let path = self.path_for(&playlist.name)?;
        if self.fs.exists(&path).await? {
            self.fs.delete_file(&path).await?;
        }
        Ok(())
    }

    async fn rename(&self, playlist: &Playlist, new_name: &str) -> Result<Playlist> {
        let from = self.path_for(&playlist.name)?;
        let to = self.path_for(new_name)?;
        if self.fs.exists(&from).await? {
            self.fs.rename(&from, &to).await?;
        }

        Ok(Playlist {
            uri: Some(path_to_uri(&to)),
            name: new_name.to_string(),
            ..playlist.clone()
        })
    }
}

//! Local library provider backed by an MPD tag cache.

use crate::tag_cache::parse_tag_cache;
use async_trait::async_trait;
use bridge_traits::storage::FileSystemAccess;
use core_library::error::Result;
use core_library::library::LibraryProvider;
use core_library::models::Track;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Reads the catalog from `tag_cache_file`, resolving paths below
/// `music_path`.
pub struct LocalLibraryProvider {
    fs: Arc<dyn FileSystemAccess>,
    tag_cache_file: PathBuf,
    music_path: PathBuf,
}

impl LocalLibraryProvider {
    pub fn new(
        fs: Arc<dyn FileSystemAccess>,
        tag_cache_file: impl Into<PathBuf>,
        music_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            fs,
            tag_cache_file: tag_cache_file.into(),
            music_path: music_path.into(),
        }
    }
}

#[async_trait]
impl LibraryProvider for LocalLibraryProvider {
    #[instrument(skip(self), fields(tag_cache = ?self.tag_cache_file))]
    async fn refresh(&self, uri: Option<&str>) -> Result<Vec<Track>> {
        info!(
            music_path = ?self.music_path,
            "Loading songs from tag cache"
        );

        let contents = self.fs.read_to_string(&self.tag_cache_file).await?;
        let mut tracks = parse_tag_cache(&contents, &self.music_path)?;

        if let Some(prefix) = uri {
            tracks.retain(|track| track.uri.starts_with(prefix));
        }

        debug!(count = tracks.len(), "Parsed tag cache");
        Ok(tracks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use bridge_traits::storage::FileMetadata;
    use bytes::Bytes;
    use core_library::error::LibraryError;
    use mockall::mock;
    use std::path::Path;

    mock! {
        FileSystem {}

        #[async_trait]
        impl FileSystemAccess for FileSystem {
            async fn exists(&self, path: &Path) -> BridgeResult<bool>;
            async fn metadata(&self, path: &Path) -> BridgeResult<FileMetadata>;
            async fn create_dir_all(&self, path: &Path) -> BridgeResult<()>;
            async fn read_file(&self, path: &Path) -> BridgeResult<Bytes>;
            async fn write_file(&self, path: &Path, data: Bytes) -> BridgeResult<()>;
            async fn delete_file(&self, path: &Path) -> BridgeResult<()>;
            async fn rename(&self, from: &Path, to: &Path) -> BridgeResult<()>;
            async fn list_directory(&self, path: &Path) -> BridgeResult<Vec<PathBuf>>;
        }
    }

    const TAG_CACHE: &str = "\
songList begin
key: a.mp3
file: a.mp3
Title: A
key: b.mp3
file: sub/b.mp3
Title: B
songList end
";

    fn provider(fs: MockFileSystem) -> LocalLibraryProvider {
        LocalLibraryProvider::new(Arc::new(fs), "/music/tag_cache", "/music")
    }

    #[tokio::test]
    async fn refresh_reads_tag_cache() {
        let mut fs = MockFileSystem::new();
        fs.expect_read_file()
            .withf(|path: &Path| path == Path::new("/music/tag_cache"))
            .returning(|_| Ok(Bytes::from_static(TAG_CACHE.as_bytes())));

        let tracks = provider(fs).refresh(None).await.unwrap();
        let uris: Vec<&str> = tracks.iter().map(|t| t.uri.as_str()).collect();
        assert_eq!(uris, vec!["file:///music/a.mp3", "file:///music/sub/b.mp3"]);
    }

    #[tokio::test]
    async fn refresh_filters_by_prefix() {
        let mut fs = MockFileSystem::new();
        fs.expect_read_file()
            .returning(|_| Ok(Bytes::from_static(TAG_CACHE.as_bytes())));

        let tracks = provider(fs)
            .refresh(Some("file:///music/sub"))
            .await
            .unwrap();
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].name, "B");
    }

    #[tokio::test]
    async fn unreadable_tag_cache_is_an_error() {
        let mut fs = MockFileSystem::new();
        fs.expect_read_file().returning(|_| {
            Err(BridgeError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "missing",
            )))
        });

        let err = provider(fs).refresh(None).await.unwrap_err();
        assert!(matches!(err, LibraryError::Bridge(_)));
    }
}

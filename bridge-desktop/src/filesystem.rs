//! File System Access Implementation using Tokio

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::{FileMetadata, FileSystemAccess},
};
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Tokio-based file system implementation
///
/// Every operation goes through `tokio::fs`, so reading a large tag cache
/// never blocks the connection tasks sharing the runtime.
#[derive(Debug, Clone, Default)]
pub struct TokioFileSystem;

impl TokioFileSystem {
    /// Create a new file system accessor
    pub fn new() -> Self {
        Self
    }

    /// Convert std::io::Error to BridgeError
    fn map_io_error(e: std::io::Error) -> BridgeError {
        BridgeError::Io(e)
    }
}

#[async_trait]
impl FileSystemAccess for TokioFileSystem {
    async fn exists(&self, path: &Path) -> Result<bool> {
        fs::try_exists(path).await.map_err(Self::map_io_error)
    }

    async fn metadata(&self, path: &Path) -> Result<FileMetadata> {
        let metadata = fs::metadata(path).await.map_err(Self::map_io_error)?;

        Ok(FileMetadata {
            size: metadata.len(),
            modified_at: metadata
                .modified()
                .ok()
                .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
                .and_then(|d| i64::try_from(d.as_secs()).ok()),
            is_directory: metadata.is_dir(),
        })
    }

    async fn create_dir_all(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path)
            .await
            .map_err(Self::map_io_error)?;
        debug!(path = ?path, "Created directory");
        Ok(())
    }

    async fn read_file(&self, path: &Path) -> Result<Bytes> {
        let data = fs::read(path).await.map_err(Self::map_io_error)?;
        debug!(path = ?path, size = data.len(), "Read file");
        Ok(Bytes::from(data))
    }

    async fn write_file(&self, path: &Path, data: Bytes) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                self.create_dir_all(parent).await?;
            }
        }

        fs::write(path, data.as_ref())
            .await
            .map_err(Self::map_io_error)?;
        debug!(path = ?path, size = data.len(), "Wrote file");
        Ok(())
    }

    async fn delete_file(&self, path: &Path) -> Result<()> {
        fs::remove_file(path).await.map_err(Self::map_io_error)?;
        debug!(path = ?path, "Deleted file");
        Ok(())
    }

    async fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        fs::rename(from, to).await.map_err(Self::map_io_error)?;
        debug!(from = ?from, to = ?to, "Renamed file");
        Ok(())
    }

    async fn list_directory(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let mut entries = Vec::new();
        let mut read_dir = fs::read_dir(path).await.map_err(Self::map_io_error)?;

        while let Some(entry) = read_dir
            .next_entry()
            .await
            .map_err(Self::map_io_error)?
        {
            entries.push(entry.path());
        }

        entries.sort();
        debug!(path = ?path, count = entries.len(), "Listed directory");
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_and_read() {
        let dir = tempfile::tempdir().unwrap();
        let fs = TokioFileSystem::new();
        let test_file = dir.path().join("nested").join("test-file.txt");

        let data = Bytes::from("Hello, World!");
        fs.write_file(&test_file, data.clone()).await.unwrap();

        let read_data = fs.read_file(&test_file).await.unwrap();
        assert_eq!(data, read_data);
        assert_eq!(fs.read_to_string(&test_file).await.unwrap(), "Hello, World!");
    }

    #[tokio::test]
    async fn test_rename_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let fs = TokioFileSystem::new();
        let from = dir.path().join("a.m3u");
        let to = dir.path().join("b.m3u");

        fs.write_file(&from, Bytes::from("x")).await.unwrap();
        fs.rename(&from, &to).await.unwrap();
        assert!(!fs.exists(&from).await.unwrap());
        assert!(fs.exists(&to).await.unwrap());

        fs.delete_file(&to).await.unwrap();
        assert!(!fs.exists(&to).await.unwrap());
    }

    #[tokio::test]
    async fn test_metadata_reports_size_and_mtime() {
        let dir = tempfile::tempdir().unwrap();
        let fs = TokioFileSystem::new();
        let file = dir.path().join("mix.m3u");
        fs.write_file(&file, Bytes::from("abc")).await.unwrap();

        let metadata = fs.metadata(&file).await.unwrap();
        assert_eq!(metadata.size, 3);
        assert!(!metadata.is_directory);
        assert!(metadata.modified_at.is_some());

        assert!(fs.metadata(dir.path()).await.unwrap().is_directory);
    }

    #[tokio::test]
    async fn test_list_directory_is_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let fs = TokioFileSystem::new();
        for name in ["c.m3u", "a.m3u", "b.m3u"] {
            fs.write_file(&dir.path().join(name), Bytes::new())
                .await
                .unwrap();
        }

        let entries = fs.list_directory(dir.path()).await.unwrap();
        let names: Vec<_> = entries
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.m3u", "b.m3u", "c.m3u"]);
    }

    #[tokio::test]
    async fn test_read_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let fs = TokioFileSystem::new();
        let err = fs.read_file(&dir.path().join("missing")).await.unwrap_err();
        assert!(matches!(err, BridgeError::Io(_)));
    }
}

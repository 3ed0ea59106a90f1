//! Storage and File System Abstractions
//!
//! Provides a platform-agnostic trait for the file I/O the backends need:
//! reading tag caches, reading and writing playlist files.

use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// File metadata information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    pub size: u64,
    /// Seconds since the Unix epoch.
    pub modified_at: Option<i64>,
    pub is_directory: bool,
}

/// File system access trait
///
/// Abstracts file I/O so that backends can be exercised against a temporary
/// directory in tests and against the real music archive in production.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::FileSystemAccess;
///
/// async fn save_lines(fs: &dyn FileSystemAccess, path: &Path, lines: &[String]) -> Result<()> {
///     fs.write_file(path, lines.join("\n").into()).await
/// }
/// ```
#[async_trait]
pub trait FileSystemAccess: Send + Sync {
    /// Check if a file or directory exists
    async fn exists(&self, path: &Path) -> Result<bool>;

    /// Get metadata for a file or directory
    async fn metadata(&self, path: &Path) -> Result<FileMetadata>;

    /// Create a directory and all parent directories if they don't exist
    async fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Read entire file contents into memory
    async fn read_file(&self, path: &Path) -> Result<Bytes>;

    /// Read a file and decode it as UTF-8, replacing invalid sequences
    async fn read_to_string(&self, path: &Path) -> Result<String> {
        let data = self.read_file(path).await?;
        Ok(String::from_utf8_lossy(&data).into_owned())
    }

    /// Write data to a file, creating it if it doesn't exist
    async fn write_file(&self, path: &Path, data: Bytes) -> Result<()>;

    /// Delete a file
    async fn delete_file(&self, path: &Path) -> Result<()>;

    /// Rename (move) a file
    async fn rename(&self, from: &Path, to: &Path) -> Result<()>;

    /// List all entries in a directory
    async fn list_directory(&self, path: &Path) -> Result<Vec<PathBuf>>;
}

//! Error types for the local backend

use core_library::error::LibraryError;
use thiserror::Error;

/// Local backend errors
#[derive(Error, Debug)]
pub enum LocalError {
    /// Tag cache line that is not a `key: value` pair
    #[error("Malformed tag cache line {line}: {content:?}")]
    MalformedTagCache { line: usize, content: String },

    /// Playlist name that cannot be used as a file name
    #[error("Invalid playlist name: {0:?}")]
    InvalidPlaylistName(String),

    /// Bridge error
    #[error(transparent)]
    Bridge(#[from] bridge_traits::error::BridgeError),
}

/// Result type for local backend operations
pub type Result<T> = std::result::Result<T, LocalError>;

impl From<LocalError> for LibraryError {
    fn from(error: LocalError) -> Self {
        match error {
            LocalError::MalformedTagCache { .. } => LibraryError::Storage(error.to_string()),
            LocalError::InvalidPlaylistName(name) => LibraryError::InvalidInput {
                field: "name".to_string(),
                message: format!("{:?} cannot be used as a playlist file name", name),
            },
            LocalError::Bridge(e) => LibraryError::Bridge(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = LocalError::MalformedTagCache {
            line: 7,
            content: "garbage".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Malformed tag cache line 7: \"garbage\""
        );
    }

    #[test]
    fn test_error_conversion() {
        let error: LibraryError = LocalError::InvalidPlaylistName("a/b".to_string()).into();
        assert!(matches!(error, LibraryError::InvalidInput { ref field, .. } if field == "name"));

        let error: LibraryError = LocalError::MalformedTagCache {
            line: 1,
            content: String::new(),
        }
        .into();
        assert!(matches!(error, LibraryError::Storage(_)));
    }
}

//! Error types for the streaming provider

use core_library::error::LibraryError;
use core_playback::error::PlaybackError;
use thiserror::Error;

/// Streaming provider errors
#[derive(Error, Debug)]
pub enum StreamingError {
    /// Session is not logged in or was dropped by the service
    #[error("Streaming session unavailable: {0}")]
    SessionUnavailable(String),

    /// The service rejected a request
    #[error("Streaming service error: {0}")]
    Service(String),

    /// Link does not name anything the service knows
    #[error("Unknown link: {0}")]
    UnknownLink(String),

    /// Bridge error
    #[error(transparent)]
    Bridge(#[from] bridge_traits::error::BridgeError),
}

/// Result type for streaming operations
pub type Result<T> = std::result::Result<T, StreamingError>;

impl From<StreamingError> for LibraryError {
    fn from(error: StreamingError) -> Self {
        match error {
            StreamingError::UnknownLink(link) => LibraryError::not_found("track", link),
            StreamingError::Bridge(e) => LibraryError::Bridge(e),
            other => LibraryError::Storage(other.to_string()),
        }
    }
}

impl From<StreamingError> for PlaybackError {
    fn from(error: StreamingError) -> Self {
        match error {
            StreamingError::UnknownLink(link) => PlaybackError::NotFound(link),
            other => PlaybackError::Provider(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = StreamingError::SessionUnavailable("logged out".to_string());
        assert_eq!(
            error.to_string(),
            "Streaming session unavailable: logged out"
        );
    }

    #[test]
    fn test_error_conversion() {
        let error: LibraryError = StreamingError::UnknownLink("spotify:track:x".to_string()).into();
        assert!(matches!(error, LibraryError::NotFound { .. }));

        let error: PlaybackError = StreamingError::Service("503".to_string()).into();
        assert!(matches!(error, PlaybackError::Provider(_)));
    }
}

use bridge_traits::error::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Invalid input: {field} - {message}")]
    InvalidInput { field: String, message: String },

    /// Empty or blank query value, or an unknown query field.
    #[error("{0}")]
    InvalidQuery(String),

    #[error("Operation not supported: {0}")]
    Unsupported(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl LibraryError {
    pub fn not_found(entity_type: &str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.to_string(),
            id: id.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LibraryError>;

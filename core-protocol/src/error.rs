//! # Protocol Error Types
//!
//! Every failure a command can report, and its rendering as an MPD `ACK`
//! line. This is the only place domain errors become wire text.

use core_library::LibraryError;
use core_playback::PlaybackError;
use core_service::CoreError;
use std::fmt;
use thiserror::Error;

/// Numeric error kinds of the `ACK` frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AckCode {
    NotList = 1,
    Arg = 2,
    Password = 3,
    Permission = 4,
    Unknown = 5,
    NoExist = 50,
    System = 52,
    PlayerSync = 55,
    Exist = 56,
}

impl AckCode {
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("unknown command \"{0}\"")]
    UnknownCommand(String),

    #[error("{0}")]
    InvalidArgument(String),

    #[error("{0}")]
    InvalidQuery(String),

    #[error("incorrect password")]
    IncorrectPassword,

    #[error("you don't have permission for \"{0}\"")]
    PermissionDenied(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    NotList(String),

    #[error("{0}")]
    PlayerSync(String),

    #[error("{0}")]
    Exist(String),

    #[error("{0}")]
    System(String),

    /// A handler panicked.
    #[error("internal error")]
    Internal,

    #[error("pattern {0:?} is already registered")]
    DuplicatePattern(String),

    #[error("invalid command pattern {pattern:?}: {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProtocolError {
    pub fn code(&self) -> AckCode {
        match self {
            ProtocolError::UnknownCommand(_) => AckCode::Unknown,
            ProtocolError::InvalidArgument(_) | ProtocolError::InvalidQuery(_) => AckCode::Arg,
            ProtocolError::IncorrectPassword => AckCode::Password,
            ProtocolError::PermissionDenied(_) => AckCode::Permission,
            ProtocolError::NotFound(_) => AckCode::NoExist,
            ProtocolError::NotList(_) => AckCode::NotList,
            ProtocolError::PlayerSync(_) => AckCode::PlayerSync,
            ProtocolError::Exist(_) => AckCode::Exist,
            ProtocolError::System(_)
            | ProtocolError::Internal
            | ProtocolError::DuplicatePattern(_)
            | ProtocolError::InvalidPattern { .. }
            | ProtocolError::Io(_) => AckCode::System,
        }
    }

    /// Renders the error as the `ACK` frame for the command at `index` of a
    /// command list (0 outside one).
    pub fn to_ack(&self, index: usize, command: &str) -> Ack {
        // Unknown commands are reported with an empty command name.
        let command = match self {
            ProtocolError::UnknownCommand(_) => "",
            _ => command,
        };
        Ack {
            code: self.code(),
            index,
            command: command.to_string(),
            message: self.to_string(),
        }
    }
}

/// One `ACK [code@index] {command} message` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ack {
    pub code: AckCode,
    pub index: usize,
    pub command: String,
    pub message: String,
}

impl fmt::Display for Ack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ACK [{}@{}] {{{}}} {}",
            self.code.as_u8(),
            self.index,
            self.command,
            self.message
        )
    }
}

impl From<LibraryError> for ProtocolError {
    fn from(err: LibraryError) -> Self {
        match err {
            LibraryError::NotFound { .. } => ProtocolError::NotFound(err.to_string()),
            LibraryError::InvalidQuery(message) => ProtocolError::InvalidQuery(message),
            LibraryError::InvalidInput { .. } => ProtocolError::InvalidArgument(err.to_string()),
            other => ProtocolError::System(other.to_string()),
        }
    }
}

impl From<PlaybackError> for ProtocolError {
    fn from(err: PlaybackError) -> Self {
        match err {
            PlaybackError::NoCurrentTrack => ProtocolError::PlayerSync(err.to_string()),
            PlaybackError::InvalidSeek(_) | PlaybackError::InvalidArgument(_) => {
                ProtocolError::InvalidArgument(err.to_string())
            }
            PlaybackError::NotFound(_) => ProtocolError::NotFound(err.to_string()),
            PlaybackError::Library(inner) => inner.into(),
            PlaybackError::Provider(_) => ProtocolError::System(err.to_string()),
        }
    }
}

impl From<CoreError> for ProtocolError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NoBackend(_) => ProtocolError::NotFound(err.to_string()),
            CoreError::Library(inner) => inner.into(),
            CoreError::Playback(inner) => inner.into(),
            other => ProtocolError::System(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, ProtocolError>;

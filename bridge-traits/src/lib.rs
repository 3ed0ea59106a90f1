//! # Host Bridge Traits
//!
//! Capability traits the core requires but that are implemented outside of
//! it.
//!
//! ## Overview
//!
//! This crate defines the contract between the backend controllers and the
//! host environment. Each trait represents a capability that must be
//! implemented differently depending on where the server runs.
//!
//! ## Traits
//!
//! - [`AudioOutput`](output::AudioOutput) - Out-of-process audio engine
//!   (decode + render), reached over a request/response boundary
//! - [`FileSystemAccess`](storage::FileSystemAccess) - File I/O for tag caches
//!   and playlist files
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type.
//! Implementations should:
//!
//! - Convert platform-specific errors to `BridgeError`
//! - Report slow collaborators as [`BridgeError::Timeout`] rather than block
//! - Include error context (e.g., file paths)
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync`: every client connection runs on
//! its own task and they all share the same backend.

pub mod error;
pub mod output;
pub mod storage;

pub use error::{BridgeError, Result};

pub use output::{AudioOutput, OutputState};
pub use storage::{FileMetadata, FileSystemAccess};

//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop and server hosts.
//!
//! ## Overview
//!
//! - `FileSystemAccess` using `tokio::fs`
//! - `AudioOutput` as a channel client stub ([`EngineOutput`]) with a bounded
//!   wait, plus a position-tracking engine worker ([`spawn_clock_engine`])
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{spawn_clock_engine, TokioFileSystem};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let fs = TokioFileSystem::new();
//!     let (output, _engine) = spawn_clock_engine(Duration::from_secs(5));
//!
//!     // Hand both to the local backend providers
//! }
//! ```

mod filesystem;
mod output;

pub use filesystem::TokioFileSystem;
pub use output::{spawn_clock_engine, EngineCommand, EngineOutput, EngineReply, EngineRequest};

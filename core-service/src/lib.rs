//! Core service façade and bootstrap helpers.
//!
//! This crate composes the generic controllers into backends, routes URIs to
//! the backend that owns their scheme and starts everything the server needs
//! from a single [`ServerConfig`](core_runtime::config::ServerConfig). Hosts
//! with a streaming SDK session enable the `streaming` feature and pass the
//! extra backend to [`CoreService::start`].

pub mod backend;
pub mod dummy;
pub mod error;
pub mod router;
pub mod service;
pub mod watcher;

pub use backend::{Backend, BackendProviders};
pub use error::{CoreError, Result};
pub use router::BackendRouter;
pub use service::{local_backend, CoreService};

#[cfg(feature = "streaming")]
pub use service::streaming_backend;

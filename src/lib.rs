//! Workspace placeholder crate.
//!
//! This crate exposes feature flags that map to the individual workspace
//! crates (`core-service`, `core-protocol`). Host applications can depend on
//! `mpd-workspace` and enable the `server` feature (default) to get the backend
//! composition and the protocol dispatcher re-exported from one place, or the
//! `streaming` feature to add the streaming catalog backend.

#[cfg(feature = "server")]
pub use core_protocol as protocol;
#[cfg(feature = "server")]
pub use core_service as service;

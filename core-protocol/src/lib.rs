//! # MPD Protocol Front End
//!
//! Line-based MPD protocol on top of [`core_service`]. A [`CommandRegistry`]
//! maps request patterns to handlers, a per-connection [`Dispatcher`] turns
//! each request into its `OK`/`ACK` reply, and [`Server`] runs one session
//! task per TCP client.
//!
//! ```ignore
//! use core_protocol::Server;
//! use core_runtime::config::ServerConfig;
//! use core_service::CoreService;
//! use std::sync::Arc;
//!
//! let config = ServerConfig::builder()
//!     .music_path("/srv/music")
//!     .playlist_path("/srv/playlists")
//!     .build()?;
//! let core = Arc::new(CoreService::bootstrap(&config).await?);
//! Server::bind(core).await?.serve().await?;
//! ```

pub mod args;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod format;
mod handlers;
pub mod registry;
pub mod server;
pub mod session;

pub use args::Args;
pub use context::Context;
pub use dispatcher::{Dispatcher, Reply, SessionAction};
pub use error::{Ack, AckCode, ProtocolError, Result};
pub use registry::{CommandRegistry, Handler, HandlerFuture, Response};
pub use server::Server;
pub use session::{run_session, GREETING};

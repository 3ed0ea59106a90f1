//! # Server Configuration Module
//!
//! Provides the explicit configuration struct for the music server.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a
//! `ServerConfig` that is created once at startup and passed by reference into
//! backend construction. There is no process-wide settings object; whatever a
//! component needs is read from the struct it was handed.
//!
//! ## Required Settings
//!
//! - `music_path` - Root of the local music archive
//! - `playlist_path` - Folder holding stored `.m3u` playlists
//!
//! ## Defaults
//!
//! - `hostname` - `127.0.0.1`
//! - `port` - `6600`
//! - `tag_cache_file` - `<music_path>/tag_cache`
//! - `engine_timeout` - 5 seconds
//! - `event_buffer_size` - 100 events
//! - `streaming_high_bitrate` - `false` (160 kbps)
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::ServerConfig;
//!
//! let config = ServerConfig::builder()
//!     .music_path("/srv/music")
//!     .playlist_path("/srv/playlists")
//!     .password("secret")
//!     .build()
//!     .expect("Failed to build config");
//! ```
//!
//! ## Error Handling
//!
//! `build()` validates every field and names the offending one:
//!
//! ```should_panic
//! use core_runtime::config::ServerConfig;
//!
//! let config = ServerConfig::builder()
//!     .music_path("/srv/music")
//!     .build()
//!     .expect("Should fail - missing playlist_path");
//! ```

use crate::error::{Error, Result};
use crate::events::DEFAULT_EVENT_BUFFER_SIZE;
use std::path::PathBuf;
use std::time::Duration;

/// Default listen address.
pub const DEFAULT_HOSTNAME: &str = "127.0.0.1";

/// Default MPD port.
pub const DEFAULT_PORT: u16 = 6600;

/// Default bounded wait for a reply from the audio engine.
pub const DEFAULT_ENGINE_TIMEOUT: Duration = Duration::from_secs(5);

const MIN_ENGINE_TIMEOUT: Duration = Duration::from_millis(1);
const MAX_ENGINE_TIMEOUT: Duration = Duration::from_secs(60);

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address the protocol listener binds to.
    pub hostname: String,
    /// Port the protocol listener binds to.
    pub port: u16,
    /// Connection password; `None` disables authentication.
    pub password: Option<String>,
    /// Root of the local music archive.
    pub music_path: PathBuf,
    /// Folder holding stored playlists.
    pub playlist_path: PathBuf,
    /// MPD tag cache describing the local archive.
    pub tag_cache_file: PathBuf,
    /// Maximum time to wait for the audio engine to answer a command.
    pub engine_timeout: Duration,
    /// Per-subscriber buffer of the event bus.
    pub event_buffer_size: usize,
    /// Request the high streaming bitrate (320 kbps instead of 160 kbps).
    pub streaming_high_bitrate: bool,
}

impl ServerConfig {
    /// Creates a new builder for constructing a `ServerConfig`.
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }

    /// `hostname:port` suitable for `TcpListener::bind`.
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.hostname, self.port)
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Hostname and paths are not empty
    /// - Port is not zero
    /// - Engine timeout lies within 1 ms..=60 s
    /// - Event buffer is not empty
    pub fn validate(&self) -> Result<()> {
        if self.hostname.trim().is_empty() {
            return Err(Error::Config("hostname cannot be empty".to_string()));
        }

        if self.port == 0 {
            return Err(Error::Config("port must be greater than 0".to_string()));
        }

        if self.music_path.as_os_str().is_empty() {
            return Err(Error::Config("music_path cannot be empty".to_string()));
        }

        if self.playlist_path.as_os_str().is_empty() {
            return Err(Error::Config("playlist_path cannot be empty".to_string()));
        }

        if self.tag_cache_file.as_os_str().is_empty() {
            return Err(Error::Config("tag_cache_file cannot be empty".to_string()));
        }

        if self.engine_timeout < MIN_ENGINE_TIMEOUT || self.engine_timeout > MAX_ENGINE_TIMEOUT {
            return Err(Error::Config(format!(
                "engine_timeout must be between {:?} and {:?}, got {:?}",
                MIN_ENGINE_TIMEOUT, MAX_ENGINE_TIMEOUT, self.engine_timeout
            )));
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "event_buffer_size must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for [`ServerConfig`].
#[derive(Debug, Default)]
pub struct ServerConfigBuilder {
    hostname: Option<String>,
    port: Option<u16>,
    password: Option<String>,
    music_path: Option<PathBuf>,
    playlist_path: Option<PathBuf>,
    tag_cache_file: Option<PathBuf>,
    engine_timeout: Option<Duration>,
    event_buffer_size: Option<usize>,
    streaming_high_bitrate: bool,
}

impl ServerConfigBuilder {
    pub fn hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Require clients to send `password` before any other command.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn music_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.music_path = Some(path.into());
        self
    }

    pub fn playlist_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.playlist_path = Some(path.into());
        self
    }

    pub fn tag_cache_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.tag_cache_file = Some(path.into());
        self
    }

    pub fn engine_timeout(mut self, timeout: Duration) -> Self {
        self.engine_timeout = Some(timeout);
        self
    }

    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    pub fn streaming_high_bitrate(mut self, enabled: bool) -> Self {
        self.streaming_high_bitrate = enabled;
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` naming the field if a required setting is
    /// missing or a value is out of range.
    pub fn build(self) -> Result<ServerConfig> {
        let music_path = self.music_path.ok_or_else(|| {
            Error::Config("music_path is required. Use .music_path() to set it.".to_string())
        })?;

        let playlist_path = self.playlist_path.ok_or_else(|| {
            Error::Config(
                "playlist_path is required. Use .playlist_path() to set it.".to_string(),
            )
        })?;

        let tag_cache_file = self
            .tag_cache_file
            .unwrap_or_else(|| music_path.join("tag_cache"));

        let config = ServerConfig {
            hostname: self
                .hostname
                .unwrap_or_else(|| DEFAULT_HOSTNAME.to_string()),
            port: self.port.unwrap_or(DEFAULT_PORT),
            password: self.password,
            music_path,
            playlist_path,
            tag_cache_file,
            engine_timeout: self.engine_timeout.unwrap_or(DEFAULT_ENGINE_TIMEOUT),
            event_buffer_size: self.event_buffer_size.unwrap_or(DEFAULT_EVENT_BUFFER_SIZE),
            streaming_high_bitrate: self.streaming_high_bitrate,
        };

        config.validate()?;

        Ok(config)
    }
}

//! Per-connection handler context.

use crate::registry::CommandRegistry;
use core_service::{Backend, CoreService};
use std::sync::Arc;

/// Commands that need no password.
pub const ALWAYS_ALLOWED: &[&str] = &["close", "commands", "notcommands", "password", "ping"];

/// What a command handler may reach: the shared service, the registry it was
/// dispatched from and the connection's own state.
pub struct Context {
    core: Arc<CoreService>,
    registry: Arc<CommandRegistry>,
    authenticated: bool,
}

impl Context {
    /// Connections start authenticated unless a password is configured.
    pub fn new(core: Arc<CoreService>, registry: Arc<CommandRegistry>) -> Self {
        let authenticated = core.config().password.is_none();
        Self {
            core,
            registry,
            authenticated,
        }
    }

    pub fn core(&self) -> &CoreService {
        &self.core
    }

    /// Backend owning the tracklist and playback.
    pub fn backend(&self) -> &Arc<Backend> {
        self.core.backend()
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Whether `command` may run on this connection right now.
    pub fn is_allowed(&self, command: &str) -> bool {
        self.authenticated || ALWAYS_ALLOWED.contains(&command)
    }

    /// Checks `password` against the configured one and, on a match,
    /// unlocks every command for the rest of the connection.
    pub fn authenticate(&mut self, password: &str) -> bool {
        let matches = self.core.config().password.as_deref() == Some(password);
        if matches {
            self.authenticated = true;
        }
        matches
    }
}

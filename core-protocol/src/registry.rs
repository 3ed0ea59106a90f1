//! # Command Registry
//!
//! Maps request patterns to handlers. A pattern is a regular expression,
//! matched against the whole request line, whose named capture groups become
//! the handler's [`Args`]. Patterns are tried in registration order and the
//! first full match wins, so patterns must not overlap.

use crate::args::{self, Args};
use crate::context::Context;
use crate::error::{ProtocolError, Result};
use futures::future::BoxFuture;
use regex::Regex;
use std::fmt;
use std::sync::Arc;

/// What a handler asks of the connection once it returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Output lines, followed by `OK`.
    Lines(Vec<String>),
    /// Wait for changes in the listed subsystems (all when empty).
    Idle(Vec<String>),
    /// End the session without a reply.
    Close,
}

impl Response {
    pub fn ok() -> Self {
        Response::Lines(Vec::new())
    }
}

impl From<Vec<String>> for Response {
    fn from(lines: Vec<String>) -> Self {
        Response::Lines(lines)
    }
}

pub type HandlerFuture<'a> = BoxFuture<'a, Result<Response>>;

pub type Handler = Arc<dyn for<'a> Fn(&'a mut Context, Args) -> HandlerFuture<'a> + Send + Sync>;

struct Command {
    name: String,
    pattern: String,
    regex: Regex,
    handler: Handler,
}

#[derive(Default)]
pub struct CommandRegistry {
    commands: Vec<Command>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in command.
    pub fn with_builtins() -> Result<Self> {
        let mut registry = Self::new();
        crate::handlers::register_all(&mut registry)?;
        Ok(registry)
    }

    /// # Errors
    ///
    /// `DuplicatePattern` if `pattern` is already registered, whatever its
    /// handler; `InvalidPattern` if it is not a valid regular expression.
    pub fn register<F>(&mut self, pattern: &str, handler: F) -> Result<()>
    where
        F: for<'a> Fn(&'a mut Context, Args) -> HandlerFuture<'a> + Send + Sync + 'static,
    {
        if self.commands.iter().any(|c| c.pattern == pattern) {
            return Err(ProtocolError::DuplicatePattern(pattern.to_string()));
        }

        let regex = Regex::new(&format!("^(?:{})$", pattern)).map_err(|e| {
            ProtocolError::InvalidPattern {
                pattern: pattern.to_string(),
                message: e.to_string(),
            }
        })?;
        let name = pattern
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
            .collect();

        self.commands.push(Command {
            name,
            pattern: pattern.to_string(),
            regex,
            handler: Arc::new(handler),
        });
        Ok(())
    }

    /// Handler for `request` and the arguments captured from it.
    ///
    /// # Errors
    ///
    /// `UnknownCommand` carrying the request's first word when no pattern
    /// matches.
    pub fn find_handler(&self, request: &str) -> Result<(Handler, Args)> {
        self.commands
            .iter()
            .find_map(|command| {
                command.regex.captures(request).map(|captures| {
                    (
                        Arc::clone(&command.handler),
                        Args::from_captures(&command.regex, &captures),
                    )
                })
            })
            .ok_or_else(|| ProtocolError::UnknownCommand(args::command_name(request).to_string()))
    }

    /// Distinct command names, sorted.
    pub fn command_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.commands.iter().map(|c| c.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("commands", &self.commands.len())
            .finish()
    }
}

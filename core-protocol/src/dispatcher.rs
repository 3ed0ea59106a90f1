//! # Request Dispatcher
//!
//! Turns one request line into its wire reply. A dispatcher belongs to a
//! single connection: it carries the connection's [`Context`] and the
//! command list being collected, if any.
//!
//! ## Replies
//!
//! - success: the handler's lines followed by `OK`
//! - failure: a single `ACK [code@index] {command} message` line
//!
//! Inside `command_list_begin` / `command_list_end` the collected requests
//! run in order when the list ends. The first failure stops the list; what
//! already ran stays applied. `command_list_ok_begin` adds `list_OK` after
//! each successful command.

use crate::args::command_name;
use crate::context::Context;
use crate::error::{Ack, ProtocolError};
use crate::registry::{CommandRegistry, Response};
use core_runtime::logging::redact_if_sensitive;
use core_service::CoreService;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error};

const LIST_BEGIN: &str = "command_list_begin";
const LIST_OK_BEGIN: &str = "command_list_ok_begin";
const LIST_END: &str = "command_list_end";

/// What the session does after writing a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    Idle(Vec<String>),
    Close,
}

/// Wire reply for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reply {
    pub lines: Vec<String>,
    pub action: Option<SessionAction>,
}

impl Reply {
    fn lines(lines: Vec<String>) -> Self {
        Self {
            lines,
            action: None,
        }
    }

    fn action(action: SessionAction) -> Self {
        Self {
            lines: Vec::new(),
            action: Some(action),
        }
    }
}

#[derive(Debug)]
struct CommandList {
    list_ok: bool,
    requests: Vec<String>,
}

pub struct Dispatcher {
    context: Context,
    command_list: Option<CommandList>,
}

impl Dispatcher {
    pub fn new(core: Arc<CoreService>, registry: Arc<CommandRegistry>) -> Self {
        Self {
            context: Context::new(core, registry),
            command_list: None,
        }
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn in_command_list(&self) -> bool {
        self.command_list.is_some()
    }

    pub async fn handle_request(&mut self, request: &str) -> Reply {
        if let Some(list) = self.command_list.as_mut() {
            if request != LIST_END {
                list.requests.push(request.to_string());
                return Reply::default();
            }
            let list = self.command_list.take();
            return match list {
                Some(list) => self.run_command_list(list).await,
                None => Reply::default(),
            };
        }

        match request {
            LIST_BEGIN | LIST_OK_BEGIN => {
                self.command_list = Some(CommandList {
                    list_ok: request == LIST_OK_BEGIN,
                    requests: Vec::new(),
                });
                return Reply::default();
            }
            LIST_END => {
                let err = ProtocolError::NotList("not in command list".to_string());
                return Reply::lines(vec![self.ack(err, 0, request).to_string()]);
            }
            _ => {}
        }

        match self.dispatch(request, 0).await {
            Ok(Response::Lines(mut lines)) => {
                lines.push("OK".to_string());
                Reply::lines(lines)
            }
            Ok(Response::Idle(subsystems)) => Reply::action(SessionAction::Idle(subsystems)),
            Ok(Response::Close) => Reply::action(SessionAction::Close),
            Err(ack) => Reply::lines(vec![ack.to_string()]),
        }
    }

    async fn run_command_list(&mut self, list: CommandList) -> Reply {
        debug!(commands = list.requests.len(), list_ok = list.list_ok, "Running command list");
        let mut lines = Vec::new();

        for (index, request) in list.requests.iter().enumerate() {
            match self.dispatch(request, index).await {
                Ok(Response::Lines(output)) => {
                    lines.extend(output);
                    if list.list_ok {
                        lines.push("list_OK".to_string());
                    }
                }
                Ok(Response::Close) => return Reply::action(SessionAction::Close),
                Ok(Response::Idle(_)) => {
                    let err = ProtocolError::InvalidArgument(
                        "idle is not allowed in command lists".to_string(),
                    );
                    lines.push(self.ack(err, index, request).to_string());
                    return Reply::lines(lines);
                }
                Err(ack) => {
                    lines.push(ack.to_string());
                    return Reply::lines(lines);
                }
            }
        }

        lines.push("OK".to_string());
        Reply::lines(lines)
    }

    async fn dispatch(&mut self, request: &str, index: usize) -> Result<Response, Ack> {
        let command = command_name(request);
        debug!(request = %redact_if_sensitive(command, request), index, "Handling request");

        if !self.context.is_allowed(command) {
            let err = ProtocolError::PermissionDenied(command.to_string());
            return Err(self.ack(err, index, request));
        }

        let (handler, args) = self
            .context
            .registry()
            .find_handler(request)
            .map_err(|e| self.ack(e, index, request))?;

        match AssertUnwindSafe(handler(&mut self.context, args))
            .catch_unwind()
            .await
        {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => Err(self.ack(e, index, request)),
            Err(_) => {
                error!(command, "Command handler panicked");
                Err(self.ack(ProtocolError::Internal, index, request))
            }
        }
    }

    fn ack(&self, err: ProtocolError, index: usize, request: &str) -> Ack {
        let command = command_name(request);
        let ack = err.to_ack(index, command);
        debug!(
            request = %redact_if_sensitive(command, request),
            ack = %ack,
            "Command failed"
        );
        ack
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::Args;
    use crate::registry::HandlerFuture;
    use core_runtime::config::ServerConfig;
    use core_runtime::events::EventBus;
    use core_service::dummy;

    async fn core(password: Option<&str>) -> Arc<CoreService> {
        let mut builder = ServerConfig::builder()
            .music_path("/srv/music")
            .playlist_path("/srv/playlists");
        if let Some(password) = password {
            builder = builder.password(password);
        }
        let events = EventBus::new(64);
        let backend = dummy::backend(dummy::tracks(&["a", "b", "c"]), &events);
        Arc::new(
            CoreService::start(builder.build().unwrap(), events, vec![backend], Vec::new())
                .await
                .unwrap(),
        )
    }

    fn echo(_ctx: &mut Context, args: Args) -> HandlerFuture<'_> {
        let arg1 = args.get("arg1").unwrap_or_default().to_string();
        async move { Ok(Response::Lines(vec![format!("arg1: {}", arg1)])) }.boxed()
    }

    fn boom(_ctx: &mut Context, _args: Args) -> HandlerFuture<'_> {
        async {
            if true {
                panic!("handler bug");
            }
            Ok(Response::ok())
        }
        .boxed()
    }

    async fn dispatcher(password: Option<&str>) -> Dispatcher {
        let mut registry = CommandRegistry::with_builtins().unwrap();
        registry.register("known_command (?P<arg1>.+)", echo).unwrap();
        registry.register("boom", boom).unwrap();
        Dispatcher::new(core(password).await, Arc::new(registry))
    }

    #[tokio::test]
    async fn unknown_command_is_acked_with_empty_name() {
        let mut dispatcher = dispatcher(None).await;
        let reply = dispatcher.handle_request("foo bar baz").await;
        assert_eq!(reply.lines, vec!["ACK [5@0] {} unknown command \"foo\""]);
        assert_eq!(reply.action, None);
    }

    #[tokio::test]
    async fn known_command_output_ends_with_ok() {
        let mut dispatcher = dispatcher(None).await;
        let reply = dispatcher.handle_request("known_command xyz").await;
        assert_eq!(reply.lines, vec!["arg1: xyz", "OK"]);
    }

    #[tokio::test]
    async fn command_list_stops_at_first_failure() {
        let mut dispatcher = dispatcher(None).await;
        for request in ["command_list_begin", "add dummy:a", "foo", "add dummy:b"] {
            assert_eq!(dispatcher.handle_request(request).await, Reply::default());
        }
        assert!(dispatcher.in_command_list());

        let reply = dispatcher.handle_request("command_list_end").await;
        assert_eq!(reply.lines, vec!["ACK [5@1] {} unknown command \"foo\""]);
        assert!(!dispatcher.in_command_list());
        assert_eq!(dispatcher.context().backend().tracklist.len(), 1);
    }

    #[tokio::test]
    async fn ok_command_list_separates_results() {
        let mut dispatcher = dispatcher(None).await;
        for request in ["command_list_ok_begin", "ping", "known_command a"] {
            dispatcher.handle_request(request).await;
        }
        let reply = dispatcher.handle_request("command_list_end").await;
        assert_eq!(reply.lines, vec!["list_OK", "arg1: a", "list_OK", "OK"]);
    }

    #[tokio::test]
    async fn list_end_outside_a_list_is_rejected() {
        let mut dispatcher = dispatcher(None).await;
        let reply = dispatcher.handle_request("command_list_end").await;
        assert_eq!(
            reply.lines,
            vec!["ACK [1@0] {command_list_end} not in command list"]
        );
    }

    #[tokio::test]
    async fn password_gates_commands() {
        let mut dispatcher = dispatcher(Some("secret")).await;

        assert_eq!(dispatcher.handle_request("ping").await.lines, vec!["OK"]);
        assert_eq!(
            dispatcher.handle_request("status").await.lines,
            vec!["ACK [4@0] {status} you don't have permission for \"status\""]
        );
        assert_eq!(
            dispatcher.handle_request("password wrong").await.lines,
            vec!["ACK [3@0] {password} incorrect password"]
        );

        assert_eq!(dispatcher.handle_request("password secret").await.lines, vec!["OK"]);
        assert!(dispatcher.context().is_authenticated());
        assert_eq!(
            dispatcher.handle_request("status").await.lines.last().map(String::as_str),
            Some("OK")
        );
    }

    #[tokio::test]
    async fn handler_panic_becomes_system_error() {
        let mut dispatcher = dispatcher(None).await;
        let reply = dispatcher.handle_request("boom").await;
        assert_eq!(reply.lines, vec!["ACK [52@0] {boom} internal error"]);

        assert_eq!(dispatcher.handle_request("ping").await.lines, vec!["OK"]);
    }

    #[tokio::test]
    async fn oversized_numbers_are_argument_errors() {
        let mut dispatcher = dispatcher(None).await;
        for uri in ["dummy:a", "dummy:b"] {
            dispatcher.handle_request(&format!("add {}", uri)).await;
        }

        let max = usize::MAX;
        for request in [
            format!("delete {}", max),
            format!("move 0 {}", max),
            format!("playlistinfo {}", max),
        ] {
            let reply = dispatcher.handle_request(&request).await;
            assert_eq!(reply.lines.len(), 1, "{}", request);
            assert!(reply.lines[0].starts_with("ACK [2@0] {"), "{:?}", reply.lines);
        }
        assert_eq!(dispatcher.context().backend().tracklist.len(), 2);

        assert_eq!(dispatcher.handle_request("play 0").await.lines, vec!["OK"]);
        assert_eq!(dispatcher.handle_request("seek 0 1").await.lines, vec!["OK"]);
        assert_eq!(
            dispatcher
                .handle_request("seekcur +9223372036854775807")
                .await
                .lines,
            vec!["ACK [2@0] {seekcur} Bad time: +9223372036854775807"]
        );
    }

    #[tokio::test]
    async fn idle_and_close_are_session_actions() {
        let mut dispatcher = dispatcher(None).await;
        assert_eq!(
            dispatcher.handle_request("idle player playlist").await.action,
            Some(SessionAction::Idle(vec!["player".to_string(), "playlist".to_string()]))
        );
        assert_eq!(
            dispatcher.handle_request("idle bogus").await.lines,
            vec!["ACK [2@0] {idle} Unrecognized idle event: bogus"]
        );
        assert_eq!(
            dispatcher.handle_request("close").await.action,
            Some(SessionAction::Close)
        );
    }
}

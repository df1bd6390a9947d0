//! Command handlers
//!
//! Routes decoded commands from the command socket to the handler for their
//! verb and wraps the outcome in a `Response`. Handler failures become error
//! responses; nothing here tears down the connection.

mod basic;
mod cursorless;
mod editor;
mod navigation;

use tracing::{debug, warn};

use talonbridge_protocol::{Command, CommandResponse, DecodedCommand, Response};
use talonbridge_utils::BridgeError;

use crate::config::ConfigHandle;
use crate::cursorless::SyncError;
use crate::host::HostHandle;

pub use navigation::NavigationKind;

/// Failure of a single command
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("invalid command: {0}")]
    UnknownCommand(String),

    #[error("missing argument: {0}")]
    MissingArgument(&'static str),

    #[error("invalid {name}: {value}")]
    InvalidArgument { name: &'static str, value: String },

    #[error("{0}")]
    Bridge(#[from] BridgeError),

    #[error("{0}")]
    Sync(#[from] SyncError),
}

/// Result string of a command, or why it failed
pub type HandlerResult = Result<String, HandlerError>;

/// Shared state for handling commands
#[derive(Clone)]
pub struct HandlerContext {
    pub pid: u32,
    /// Product banner put on every response
    pub product: String,
    pub host: HostHandle,
    pub config: ConfigHandle,
}

impl HandlerContext {
    pub fn new(pid: u32, product: impl Into<String>, host: HostHandle, config: ConfigHandle) -> Self {
        Self {
            pid,
            product: product.into(),
            host,
            config,
        }
    }

    /// Handle one request from the socket
    pub async fn route(&self, request: DecodedCommand) -> Response {
        let command = match request {
            Ok(command) => command,
            Err(malformed) => {
                warn!("Rejecting malformed command: {}", malformed.reason);
                return Response::error(self.pid, &self.product, Some(malformed.raw), malformed.reason);
            }
        };

        let received = serde_json::to_string(&command).ok();
        debug!("Dispatching {}", command.command);

        match self.dispatch(&command).await {
            Ok(result) => Response::ok(
                self.pid,
                &self.product,
                CommandResponse::result(result),
                received,
            ),
            Err(e) => {
                warn!("Command {} failed: {}", command.command, e);
                Response::error(self.pid, &self.product, received, e.to_string())
            }
        }
    }

    /// Run the handler for `command`'s verb
    pub async fn dispatch(&self, command: &Command) -> HandlerResult {
        match command.command.as_str() {
            "ping" => Ok(self.handle_ping()),
            "state" => self.handle_state().await,
            "serializeState" => self.handle_serialize_state().await,
            "notify" => self.handle_notify(command).await,
            "content" => self.handle_content().await,

            "cursorless" => self.handle_cursorless(command).await,

            "action" => self.handle_action(command).await,
            "find" => self.handle_find(command).await,
            "openFile" => self.handle_open_file(command).await,
            "goto" => self.handle_goto(command).await,
            "insertAtCursors" => self.handle_insert_at_cursors(command).await,
            "openProject" => self.handle_open_project(command).await,

            "navigateHistory" => self.handle_navigate_history(command).await,
            "navigateFileBack" => self.navigate(false, NavigationKind::File).await,
            "navigateFileForward" => self.navigate(true, NavigationKind::File).await,
            "navigateFunctionBack" => self.navigate(false, NavigationKind::Function).await,
            "navigateFunctionForward" => self.navigate(true, NavigationKind::Function).await,

            other => Err(HandlerError::UnknownCommand(other.to_string())),
        }
    }
}

/// Argument at `index`, or a `MissingArgument` error naming it
fn required<'a>(command: &'a Command, index: usize, name: &'static str) -> Result<&'a str, HandlerError> {
    command.arg(index).ok_or(HandlerError::MissingArgument(name))
}

/// Parse a 1-based line or column into a 0-based one, clamping at zero
fn one_based(value: &str, name: &'static str) -> Result<u32, HandlerError> {
    let n: i64 = value.trim().parse().map_err(|_| HandlerError::InvalidArgument {
        name,
        value: value.to_string(),
    })?;
    Ok(u32::try_from((n - 1).max(0)).unwrap_or(u32::MAX))
}

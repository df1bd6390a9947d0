//! Wire messages
//!
//! Two peers speak JSON with this process: the automation layer over the
//! command socket (`Command` in, `Response` out) and the cursorless sidecar
//! (`SidecarCommand` out, `CursorlessResponse`/`SidecarState` in). Every
//! optional field defaults to absent on decode and unknown fields are
//! ignored, since both ends evolve independently.

use serde::{Deserialize, Serialize};

// ==================== Command Socket ====================

/// Request received on the command socket
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Command {
    /// Verb to dispatch (e.g. "ping", "cursorless", "goto")
    pub command: String,
    /// Positional arguments, verb specific
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<String>>,
}

impl Command {
    /// Create a command without arguments
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: None,
        }
    }

    /// Create a command with arguments
    pub fn with_args<I, S>(command: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            command: command.into(),
            args: Some(args.into_iter().map(Into::into).collect()),
        }
    }

    /// Arguments as a slice (empty when absent)
    pub fn args(&self) -> &[String] {
        self.args.as_deref().unwrap_or(&[])
    }

    /// Argument at `index`, if present
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args().get(index).map(String::as_str)
    }
}

/// Result payload of a successfully dispatched command
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommandResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<String>>,
}

impl CommandResponse {
    /// Response carrying a single result string
    pub fn result(result: impl Into<String>) -> Self {
        Self {
            result: Some(result.into()),
            args: None,
        }
    }
}

/// Envelope written back on the command socket
///
/// Always carries either `response` or `error`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub pid: u32,
    /// Product banner, e.g. "IntelliJ IDEA 2024.1"
    pub product: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<CommandResponse>,
    /// Echo of the received command
    #[serde(default)]
    pub received_command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    /// Successful response
    pub fn ok(
        pid: u32,
        product: impl Into<String>,
        response: CommandResponse,
        received_command: Option<String>,
    ) -> Self {
        Self {
            pid,
            product: product.into(),
            response: Some(response),
            received_command,
            error: None,
        }
    }

    /// Error response
    pub fn error(
        pid: u32,
        product: impl Into<String>,
        received_command: Option<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            pid,
            product: product.into(),
            response: None,
            received_command,
            error: Some(error.into()),
        }
    }

    /// Whether this response reports an error
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// The result string, if any
    pub fn result(&self) -> Option<&str> {
        self.response.as_ref().and_then(|r| r.result.as_deref())
    }
}

// ==================== Sidecar ====================

/// Ask the sidecar to pull the primary editor state file
pub const SIDECAR_APPLY_PRIMARY_EDITOR_STATE: &str = "applyPrimaryEditorState";
/// Ask the sidecar for its view of the document, with contents
pub const SIDECAR_STATE_WITH_CONTENTS: &str = "stateWithContents";
/// Run a cursorless edit command
pub const SIDECAR_CURSORLESS: &str = "cursorless";

/// Request sent to the sidecar
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SidecarCommand {
    pub command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_args: Option<Vec<String>>,
    /// Opaque cursorless payload, forwarded verbatim
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursorless_args: Option<String>,
}

impl SidecarCommand {
    /// Bare verb
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            command_id: None,
            command_args: None,
            cursorless_args: None,
        }
    }

    /// `applyPrimaryEditorState`
    pub fn apply_primary_editor_state() -> Self {
        Self::new(SIDECAR_APPLY_PRIMARY_EDITOR_STATE)
    }

    /// `stateWithContents`
    pub fn state_with_contents() -> Self {
        Self::new(SIDECAR_STATE_WITH_CONTENTS)
    }

    /// `cursorless` with the opaque payload
    pub fn cursorless(payload: impl Into<String>) -> Self {
        Self {
            cursorless_args: Some(payload.into()),
            ..Self::new(SIDECAR_CURSORLESS)
        }
    }
}

/// Position as the sidecar reports it
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SidecarPosition {
    #[serde(default)]
    pub line: u32,
    #[serde(default)]
    pub character: u32,
}

impl SidecarPosition {
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

/// Selection as the sidecar reports it (anchor/active plus start/end)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SidecarSelection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<SidecarPosition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<SidecarPosition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<SidecarPosition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<SidecarPosition>,
}

/// The sidecar's view of one document
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SidecarState {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub cursors: Vec<SidecarSelection>,
    /// File holding the document contents as the sidecar sees them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contents_path: Option<String>,
}

/// Sidecar reply to a `cursorless` command
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CursorlessResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_state: Option<SidecarState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_state: Option<SidecarState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_result: Option<String>,
    /// The sidecar rejected the command (logic error, not a race)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_exception: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

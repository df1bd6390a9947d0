//! Host editor abstraction
//!
//! The bridge never touches an editor directly. Everything it needs (text,
//! carets, viewport, project metadata, navigation history, notifications)
//! goes through [`EditorHost`]. All calls happen on the host actor thread.

pub mod actor;
pub mod memory;
pub mod text;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use talonbridge_protocol::{Cursor, ProjectState};
use talonbridge_utils::Result;

pub use actor::{spawn_host_actor, ChangeNotifier, HostContext, HostHandle};
pub use memory::MemoryHost;

/// Identifies an open editor (buffer) within the host
pub type EditorId = u64;

/// One caret, optionally with a selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caret {
    pub position: Cursor,
    /// `(start, end)` with `start <= end`
    pub selection: Option<(Cursor, Cursor)>,
}

impl Caret {
    /// Caret without a selection
    pub fn at(position: Cursor) -> Self {
        Self {
            position,
            selection: None,
        }
    }

    /// Caret with a selection; the bounds are put in order
    pub fn selecting(position: Cursor, a: Cursor, b: Cursor) -> Self {
        let (start, end) = if a <= b { (a, b) } else { (b, a) };
        Self {
            position,
            selection: (start != end).then_some((start, end)),
        }
    }

    /// Selection bounds, collapsing to the caret when nothing is selected
    pub fn range(&self) -> (Cursor, Cursor) {
        self.selection.unwrap_or((self.position, self.position))
    }
}

/// Notification severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

/// A user-visible notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    pub body: String,
}

impl Notification {
    pub fn new(level: NotificationLevel, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            level,
            title: title.into(),
            body: body.into(),
        }
    }

    pub fn info(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Info, title, body)
    }

    pub fn warning(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Warning, title, body)
    }

    pub fn error(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Error, title, body)
    }
}

/// Result of running a host action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Performed,
    Rejected,
    /// No action with that id
    Unknown,
}

/// Result of `open_project`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectOutcome {
    AlreadyOpen(String),
    Opened(String),
}

/// What the bridge needs from a text-editing host
///
/// Implementations report change events (typing, caret moves, focus and
/// viewport changes) through the [`ChangeNotifier`] handed to them by the
/// host actor.
pub trait EditorHost: Send + 'static {
    /// Receive the channel used to report host changes
    fn set_change_notifier(&mut self, notifier: ChangeNotifier);

    /// Product name, e.g. "IntelliJ IDEA"
    fn product(&self) -> String;

    /// Product version
    fn version(&self) -> String;

    /// Version of the bridge integration, if known
    fn plugin_version(&self) -> Option<String> {
        None
    }

    /// Recently used projects, name -> path
    fn recent_projects(&self) -> BTreeMap<String, String>;

    /// The focused editor
    fn active_editor(&self) -> Option<EditorId>;

    /// One editor per visible split, in layout order
    fn visible_editors(&self) -> Vec<EditorId>;

    // ==================== Per-editor reads ====================

    fn file_path(&self, editor: EditorId) -> Option<PathBuf>;

    fn text(&self, editor: EditorId) -> Option<String>;

    /// Carets in caret order
    fn carets(&self, editor: EditorId) -> Vec<Caret>;

    /// First and last visible line
    fn visible_lines(&self, editor: EditorId) -> (u32, u32);

    fn project(&self, editor: EditorId) -> Option<ProjectState>;

    /// Files open in the editor's window, most recently selected first
    fn open_files(&self, editor: EditorId) -> Vec<String>;

    /// Recently opened files, most recent first
    fn recent_files(&self, editor: EditorId) -> Vec<String>;

    // ==================== Mutations ====================

    /// Replace the whole document text as one edit
    fn set_text(&mut self, editor: EditorId, text: &str) -> Result<()>;

    /// Replace all carets; an empty slice is rejected
    fn set_carets(&mut self, editor: EditorId, carets: &[Caret]) -> Result<()>;

    /// Open (or focus) a file, making it the active editor
    fn open_file(&mut self, path: &Path) -> Result<EditorId>;

    /// Focus an open project or open a new one
    fn open_project(&mut self, path: &Path) -> Result<ProjectOutcome>;

    /// Run a named host action against the active editor
    fn run_action(&mut self, action_id: &str) -> ActionOutcome;

    // ==================== Navigation history ====================

    fn history_available(&self, forward: bool) -> bool;

    /// Step once through the history; false if nothing to step to
    fn history_step(&mut self, forward: bool) -> bool;

    /// Name of the function containing the active caret
    fn function_at_caret(&self) -> Option<String>;

    /// Language of the active caret
    fn language_at_caret(&self) -> Option<String>;

    // ==================== Notifications ====================

    fn notify(&mut self, notification: Notification);

    /// Notifications posted so far, for hosts that keep them
    fn recent_notifications(&self) -> Vec<Notification> {
        Vec::new()
    }
}

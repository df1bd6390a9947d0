//! Editor state snapshot types
//!
//! These are published to disk as JSON for the sidecar and the automation
//! layer. A snapshot is rebuilt in full on every publish.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::messages::SidecarPosition;

/// Top-level snapshot of the host
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OverallState {
    pub pid: u32,
    /// Change counter at the time of the snapshot
    pub serial: u64,
    pub ide_product: String,
    pub ide_version: String,
    #[serde(default)]
    pub plugin_version: Option<String>,
    /// The focused editor (also present in `editors` with `active = true`)
    #[serde(default)]
    pub active_editor: Option<EditorState>,
    /// One entry per visible split/window
    #[serde(default)]
    pub editors: Vec<EditorState>,
    /// Recently used project name -> path
    #[serde(default)]
    pub recent_projects: BTreeMap<String, String>,
}

/// State of one open editor
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EditorState {
    /// Source file; absent for unsaved/virtual buffers
    #[serde(default)]
    pub path: Option<String>,
    /// Private mirror of the in-memory buffer
    #[serde(default)]
    pub temporary_file_path: Option<String>,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub project: Option<ProjectState>,
    #[serde(default)]
    pub first_visible_line: u32,
    #[serde(default)]
    pub last_visible_line: u32,
    /// Caret order, not spatially sorted
    #[serde(default)]
    pub cursors: Vec<Cursor>,
    /// Same order as `cursors`
    #[serde(default)]
    pub selections: Vec<Selection>,
    #[serde(default)]
    pub open_files: Vec<String>,
    #[serde(default)]
    pub recent_files: Vec<String>,
}

/// Project owning an editor
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectState {
    pub name: String,
    #[serde(default)]
    pub base_path: Option<String>,
    /// VCS roots (a project can have several)
    #[serde(default)]
    pub repos: Vec<RepoState>,
}

/// A VCS root within a project
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RepoState {
    pub root: String,
    /// Lowercase VCS name, e.g. "git"
    pub vcs_type: String,
}

/// Zero-based logical position
///
/// `column` counts Unicode scalar values with no tab expansion.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cursor {
    pub line: u32,
    pub column: u32,
}

impl Cursor {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl From<SidecarPosition> for Cursor {
    fn from(p: SidecarPosition) -> Self {
        Cursor::new(p.line, p.character)
    }
}

impl From<Cursor> for SidecarPosition {
    fn from(c: Cursor) -> Self {
        SidecarPosition::new(c.line, c.column)
    }
}

impl std::fmt::Display for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A selection with its directionality spelled out
///
/// Unlike VS Code there is no requirement that the caret sits on either end
/// of the selection, so `active`/`anchor` are derived.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    #[serde(default)]
    pub start: Option<Cursor>,
    #[serde(default)]
    pub end: Option<Cursor>,
    #[serde(default)]
    pub cursor_position: Option<Cursor>,
    /// The end the user is moving
    #[serde(default)]
    pub active: Option<Cursor>,
    /// The fixed end
    #[serde(default)]
    pub anchor: Option<Cursor>,
}

impl Selection {
    /// Build a selection from its range and the caret position
    ///
    /// If the caret sits on neither end, anchor = start and active = end.
    pub fn new(start: Option<Cursor>, end: Option<Cursor>, caret: Option<Cursor>) -> Self {
        // Caret on the end and caret elsewhere both read as a forward selection.
        let (active, anchor) = match caret {
            Some(c) if start == Some(c) => (start, end),
            _ => (end, start),
        };

        Self {
            start,
            end,
            cursor_position: caret,
            active,
            anchor,
        }
    }

    /// Whether the selection spans at least one character
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

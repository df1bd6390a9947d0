//! Headless in-memory host
//!
//! Buffers are plain strings loaded from disk. The host keeps carets,
//! splits, projects, a recently-used file list and a back/forward
//! navigation history, which is enough to drive every bridge command
//! without a GUI editor attached.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, error, info, warn};

use talonbridge_protocol::{Cursor, ProjectState, RepoState};
use talonbridge_utils::{BridgeError, Result};

use super::text;
use super::{
    ActionOutcome, Caret, ChangeNotifier, EditorHost, EditorId, Notification, NotificationLevel,
    ProjectOutcome,
};
use crate::config::HostConfig;

/// Lines shown in one viewport
const VIEWPORT_LINES: u32 = 50;

/// Entries kept in the recent files list
const MAX_RECENT_FILES: usize = 50;

/// Entries kept in the back history
const MAX_HISTORY: usize = 100;
const MAX_NOTIFICATIONS: usize = 100;

lazy_static! {
    static ref FUNCTION_REGEX: Regex = Regex::new(
        r"^\s*(?:(?:pub(?:\([^)]*\))?|async|export|static|private|public|protected|override|suspend|def|fn|fun|func|function)\s+)+(?:\([^)]*\)\s*)?([A-Za-z_][A-Za-z0-9_]*)\s*[(<]"
    )
    .unwrap();
}

#[derive(Debug)]
struct Buffer {
    path: Option<PathBuf>,
    text: String,
    carets: Vec<Caret>,
    first_visible_line: u32,
    modified: bool,
}

impl Buffer {
    fn new(path: Option<PathBuf>, text: String) -> Self {
        Self {
            path,
            text,
            carets: vec![Caret::at(Cursor::default())],
            first_visible_line: 0,
            modified: false,
        }
    }

    fn primary_caret(&self) -> Cursor {
        self.carets
            .first()
            .map(|c| c.position)
            .unwrap_or_default()
    }

    /// Scroll so `line` is visible
    fn scroll_to(&mut self, line: u32) {
        let last = self.first_visible_line + VIEWPORT_LINES - 1;
        if line < self.first_visible_line || line > last {
            self.first_visible_line = line.saturating_sub(VIEWPORT_LINES / 2);
        }
    }
}

/// A position in the navigation history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Place {
    editor: EditorId,
    caret: Cursor,
}

/// In-memory [`EditorHost`]
pub struct MemoryHost {
    product: String,
    version: String,
    buffers: BTreeMap<EditorId, Buffer>,
    next_id: EditorId,
    /// Editor shown in each split
    splits: Vec<EditorId>,
    active_split: usize,
    /// Editors, most recently selected first
    selection_history: Vec<EditorId>,
    recent_files: Vec<String>,
    projects: Vec<ProjectState>,
    current_project: Option<usize>,
    recent_projects: BTreeMap<String, String>,
    back: Vec<Place>,
    forward: Vec<Place>,
    notifications: Vec<Notification>,
    notifier: Option<ChangeNotifier>,
}

impl MemoryHost {
    pub fn new(product: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            product: product.into(),
            version: version.into(),
            buffers: BTreeMap::new(),
            next_id: 1,
            splits: Vec::new(),
            active_split: 0,
            selection_history: Vec::new(),
            recent_files: Vec::new(),
            projects: Vec::new(),
            current_project: None,
            recent_projects: BTreeMap::new(),
            back: Vec::new(),
            forward: Vec::new(),
            notifications: Vec::new(),
            notifier: None,
        }
    }

    /// Build a host from config, opening its projects and files
    pub fn from_config(config: &HostConfig) -> Result<Self> {
        let mut host = Self::new(&config.product, &config.version);
        for project in &config.projects {
            host.open_project(project)?;
        }
        for file in &config.open {
            host.open_file(file)?;
        }
        Ok(host)
    }

    /// Open a buffer with the given contents and focus it
    ///
    /// A buffer already open for `path` is focused and its text replaced.
    pub fn open_buffer(&mut self, path: Option<PathBuf>, text: impl Into<String>) -> EditorId {
        let text = text.into();
        if let Some(id) = path.as_deref().and_then(|p| self.find_buffer(p)) {
            if let Some(buffer) = self.buffers.get_mut(&id) {
                buffer.text = text;
                clamp_carets(buffer);
            }
            self.navigate_to(id);
            self.changed("buffer replaced");
            return id;
        }

        let id = self.next_id;
        self.next_id += 1;
        self.buffers.insert(id, Buffer::new(path, text));
        self.navigate_to(id);
        self.changed("buffer opened");
        id
    }

    /// Show the active editor in a new split and focus it
    pub fn split_active(&mut self) {
        if let Some(id) = self.active_editor() {
            self.splits.push(id);
            self.active_split = self.splits.len() - 1;
            self.changed("split");
        }
    }

    fn changed(&self, reason: &str) {
        if let Some(notifier) = &self.notifier {
            notifier.notify(reason);
        }
    }

    fn find_buffer(&self, path: &Path) -> Option<EditorId> {
        self.buffers
            .iter()
            .find(|(_, b)| b.path.as_deref() == Some(path))
            .map(|(id, _)| *id)
    }

    fn buffer(&self, editor: EditorId) -> Result<&Buffer> {
        self.buffers.get(&editor).ok_or(BridgeError::EditorNotFound)
    }

    fn buffer_mut(&mut self, editor: EditorId) -> Result<&mut Buffer> {
        self.buffers.get_mut(&editor).ok_or(BridgeError::EditorNotFound)
    }

    fn current_place(&self) -> Option<Place> {
        let editor = self.active_editor()?;
        let caret = self.buffers.get(&editor)?.primary_caret();
        Some(Place { editor, caret })
    }

    /// Remember where we are before jumping somewhere else
    fn record_departure(&mut self) {
        if let Some(place) = self.current_place() {
            if self.back.last() != Some(&place) {
                self.back.push(place);
                if self.back.len() > MAX_HISTORY {
                    self.back.remove(0);
                }
            }
            self.forward.clear();
        }
    }

    /// Focus an editor, recording history when the editor changes
    fn navigate_to(&mut self, editor: EditorId) {
        if self.active_editor() != Some(editor) {
            self.record_departure();
        }
        self.focus(editor);
    }

    /// Show `editor` in the active split
    fn focus(&mut self, editor: EditorId) {
        if self.splits.is_empty() {
            self.splits.push(editor);
            self.active_split = 0;
        } else {
            self.splits[self.active_split] = editor;
        }

        self.selection_history.retain(|id| *id != editor);
        self.selection_history.insert(0, editor);

        if let Some(path) = self.buffers.get(&editor).and_then(|b| b.path.as_ref()) {
            let path = path.to_string_lossy().into_owned();
            self.recent_files.retain(|p| *p != path);
            self.recent_files.insert(0, path);
            self.recent_files.truncate(MAX_RECENT_FILES);
        }
    }

    /// Jump to a history place without recording it
    fn restore(&mut self, place: Place) {
        self.focus(place.editor);
        if let Some(buffer) = self.buffers.get_mut(&place.editor) {
            let caret = text::clamp(&buffer.text, place.caret);
            buffer.carets = vec![Caret::at(caret)];
            buffer.scroll_to(caret.line);
        }
    }

    fn close_editor(&mut self, editor: EditorId) {
        self.buffers.remove(&editor);
        self.selection_history.retain(|id| *id != editor);
        self.back.retain(|p| p.editor != editor);
        self.forward.retain(|p| p.editor != editor);

        let fallback = self.selection_history.first().copied();
        let mut splits = Vec::with_capacity(self.splits.len());
        for (i, id) in self.splits.iter().enumerate() {
            match (*id == editor, fallback) {
                (false, _) => splits.push(*id),
                (true, Some(other)) => splits.push(other),
                (true, None) => {
                    if i < self.active_split {
                        self.active_split -= 1;
                    }
                }
            }
        }
        self.splits = splits;
        self.active_split = self.active_split.min(self.splits.len().saturating_sub(1));

        // Stepping back onto where we already are is not a step
        let current = self.current_place();
        while current.is_some() && self.back.last() == current.as_ref() {
            self.back.pop();
        }
    }

    fn save_all(&mut self) -> std::io::Result<usize> {
        let mut saved = 0;
        for buffer in self.buffers.values_mut() {
            if let (Some(path), true) = (&buffer.path, buffer.modified) {
                std::fs::write(path, &buffer.text)?;
                buffer.modified = false;
                saved += 1;
            }
        }
        Ok(saved)
    }
}

/// Keep carets on existing positions after the text changed
fn clamp_carets(buffer: &mut Buffer) {
    let text = &buffer.text;
    for caret in &mut buffer.carets {
        let position = text::clamp(text, caret.position);
        *caret = match caret.selection {
            Some((start, end)) => {
                Caret::selecting(position, text::clamp(text, start), text::clamp(text, end))
            }
            None => Caret::at(position),
        };
    }
}

/// Language name for a file extension
fn language_for_extension(extension: &str) -> Option<&'static str> {
    let language = match extension.to_ascii_lowercase().as_str() {
        "rs" => "Rust",
        "py" => "Python",
        "kt" | "kts" => "Kotlin",
        "java" => "Java",
        "js" | "mjs" | "cjs" => "JavaScript",
        "ts" | "tsx" => "TypeScript",
        "go" => "Go",
        "c" | "h" => "C",
        "cc" | "cpp" | "hpp" => "C++",
        "rb" => "Ruby",
        "md" => "Markdown",
        "toml" => "TOML",
        "json" => "JSON",
        "yaml" | "yml" => "YAML",
        "sh" | "bash" => "Shell Script",
        "talon" => "Talon",
        "txt" => "Plain text",
        _ => return None,
    };
    Some(language)
}

/// VCS roots directly at `path`
fn detect_repos(path: &Path) -> Vec<RepoState> {
    [(".git", "git"), (".hg", "hg"), (".svn", "svn")]
        .into_iter()
        .filter(|(marker, _)| path.join(marker).exists())
        .map(|(_, vcs)| RepoState {
            root: path.to_string_lossy().into_owned(),
            vcs_type: vcs.into(),
        })
        .collect()
}

impl EditorHost for MemoryHost {
    fn set_change_notifier(&mut self, notifier: ChangeNotifier) {
        self.notifier = Some(notifier);
    }

    fn product(&self) -> String {
        self.product.clone()
    }

    fn version(&self) -> String {
        self.version.clone()
    }

    fn plugin_version(&self) -> Option<String> {
        Some(env!("CARGO_PKG_VERSION").into())
    }

    fn recent_projects(&self) -> BTreeMap<String, String> {
        self.recent_projects.clone()
    }

    fn active_editor(&self) -> Option<EditorId> {
        self.splits.get(self.active_split).copied()
    }

    fn visible_editors(&self) -> Vec<EditorId> {
        self.splits.clone()
    }

    fn file_path(&self, editor: EditorId) -> Option<PathBuf> {
        self.buffers.get(&editor).and_then(|b| b.path.clone())
    }

    fn text(&self, editor: EditorId) -> Option<String> {
        self.buffers.get(&editor).map(|b| b.text.clone())
    }

    fn carets(&self, editor: EditorId) -> Vec<Caret> {
        self.buffers
            .get(&editor)
            .map(|b| b.carets.clone())
            .unwrap_or_default()
    }

    fn visible_lines(&self, editor: EditorId) -> (u32, u32) {
        match self.buffers.get(&editor) {
            Some(buffer) => {
                let last_line = text::line_count(&buffer.text) - 1;
                let first = buffer.first_visible_line.min(last_line);
                let last = (first + VIEWPORT_LINES - 1).min(last_line);
                (first, last)
            }
            None => (0, 0),
        }
    }

    fn project(&self, editor: EditorId) -> Option<ProjectState> {
        let path = self.buffers.get(&editor).and_then(|b| b.path.as_deref());
        path.and_then(|path| {
            self.projects.iter().find(|p| {
                p.base_path
                    .as_deref()
                    .map(|base| path.starts_with(base))
                    .unwrap_or(false)
            })
        })
        .or_else(|| self.current_project.and_then(|i| self.projects.get(i)))
        .cloned()
    }

    fn open_files(&self, _editor: EditorId) -> Vec<String> {
        self.selection_history
            .iter()
            .filter_map(|id| self.buffers.get(id)?.path.as_ref())
            .map(|p| p.to_string_lossy().into_owned())
            .collect()
    }

    fn recent_files(&self, _editor: EditorId) -> Vec<String> {
        self.recent_files.clone()
    }

    fn set_text(&mut self, editor: EditorId, text: &str) -> Result<()> {
        let buffer = self.buffer_mut(editor)?;
        if buffer.text != text {
            buffer.text = text.to_string();
            buffer.modified = true;
            clamp_carets(buffer);
            self.changed("document changed");
        }
        Ok(())
    }

    fn set_carets(&mut self, editor: EditorId, carets: &[Caret]) -> Result<()> {
        if carets.is_empty() {
            return Err(BridgeError::invalid_argument("at least one caret is required"));
        }

        let old_line = self.buffer(editor)?.primary_caret().line;
        let is_active = self.active_editor() == Some(editor);
        if is_active && carets[0].position.line != old_line {
            self.record_departure();
        }

        let buffer = self.buffer_mut(editor)?;
        buffer.carets = carets.to_vec();
        clamp_carets(buffer);
        let line = buffer.primary_caret().line;
        buffer.scroll_to(line);
        self.changed("caret moved");
        Ok(())
    }

    fn open_file(&mut self, path: &Path) -> Result<EditorId> {
        if let Some(id) = self.find_buffer(path) {
            self.navigate_to(id);
            self.changed("file focused");
            return Ok(id);
        }

        let text = std::fs::read_to_string(path).map_err(|e| BridgeError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        debug!("Opened {:?} ({} bytes)", path, text.len());
        Ok(self.open_buffer(Some(path.to_path_buf()), text))
    }

    fn open_project(&mut self, path: &Path) -> Result<ProjectOutcome> {
        let base = path.to_string_lossy().into_owned();
        if let Some(i) = self
            .projects
            .iter()
            .position(|p| p.base_path.as_deref() == Some(base.as_str()))
        {
            self.current_project = Some(i);
            self.changed("project focused");
            return Ok(ProjectOutcome::AlreadyOpen(self.projects[i].name.clone()));
        }

        if !path.is_dir() {
            return Err(BridgeError::invalid_argument(format!(
                "not a project directory: {}",
                path.display()
            )));
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| base.clone());
        self.projects.push(ProjectState {
            name: name.clone(),
            base_path: Some(base.clone()),
            repos: detect_repos(path),
        });
        self.current_project = Some(self.projects.len() - 1);
        self.recent_projects.insert(name.clone(), base);
        self.changed("project opened");
        Ok(ProjectOutcome::Opened(name))
    }

    fn run_action(&mut self, action_id: &str) -> ActionOutcome {
        let Some(editor) = self.active_editor() else {
            warn!("No editor found");
            return ActionOutcome::Rejected;
        };

        let performed = match action_id {
            "EditorEscape" => {
                let position = self.carets(editor).first().map(|c| c.position);
                position
                    .map(|p| self.set_carets(editor, &[Caret::at(p)]).is_ok())
                    .unwrap_or(false)
            }
            "$SelectAll" => {
                let text = self.text(editor).unwrap_or_default();
                let end = text::cursor_at(&text, text.chars().count());
                self.set_carets(editor, &[Caret::selecting(end, Cursor::default(), end)])
                    .is_ok()
            }
            "SaveAll" => match self.save_all() {
                Ok(saved) => {
                    info!("Saved {} file(s)", saved);
                    true
                }
                Err(e) => {
                    warn!("Save failed: {}", e);
                    false
                }
            },
            "SplitVertically" | "SplitHorizontally" => {
                self.split_active();
                true
            }
            "Unsplit" => {
                self.splits = vec![editor];
                self.active_split = 0;
                self.changed("unsplit");
                true
            }
            "CloseEditor" => {
                self.close_editor(editor);
                self.changed("editor closed");
                true
            }
            "Back" => self.history_step(false),
            "Forward" => self.history_step(true),
            _ => return ActionOutcome::Unknown,
        };

        if performed {
            ActionOutcome::Performed
        } else {
            ActionOutcome::Rejected
        }
    }

    fn history_available(&self, forward: bool) -> bool {
        if forward {
            !self.forward.is_empty()
        } else {
            !self.back.is_empty()
        }
    }

    fn history_step(&mut self, forward: bool) -> bool {
        let target = if forward {
            self.forward.pop()
        } else {
            self.back.pop()
        };
        let Some(target) = target else {
            return false;
        };

        if let Some(current) = self.current_place() {
            if forward {
                self.back.push(current);
            } else {
                self.forward.push(current);
            }
        }
        self.restore(target);
        self.changed("navigated");
        true
    }

    fn function_at_caret(&self) -> Option<String> {
        let buffer = self.buffers.get(&self.active_editor()?)?;
        let line = buffer.primary_caret().line as usize;

        buffer
            .text
            .split('\n')
            .take(line + 1)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .find_map(|l| FUNCTION_REGEX.captures(l))
            .map(|caps| caps[1].to_string())
    }

    fn language_at_caret(&self) -> Option<String> {
        let buffer = self.buffers.get(&self.active_editor()?)?;
        let extension = buffer.path.as_ref()?.extension()?.to_str()?;
        language_for_extension(extension).map(str::to_string)
    }

    fn notify(&mut self, notification: Notification) {
        match notification.level {
            NotificationLevel::Info => info!("[{}] {}", notification.title, notification.body),
            NotificationLevel::Warning => warn!("[{}] {}", notification.title, notification.body),
            NotificationLevel::Error => error!("[{}] {}", notification.title, notification.body),
        }
        self.notifications.push(notification);
        if self.notifications.len() > MAX_NOTIFICATIONS {
            self.notifications.remove(0);
        }
    }

    fn recent_notifications(&self) -> Vec<Notification> {
        self.notifications.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "fn first() {\n    let a = 1;\n}\n\npub async fn second(x: u32) {\n    x\n}\n";

    fn host_with(path: &str, text: &str) -> (MemoryHost, EditorId) {
        let mut host = MemoryHost::new("Test IDE", "1.0");
        let id = host.open_buffer(Some(PathBuf::from(path)), text);
        (host, id)
    }

    // ==================== Buffer Tests ====================

    #[test]
    fn test_open_buffer_focuses() {
        let (host, id) = host_with("/p/a.rs", "abc");
        assert_eq!(host.active_editor(), Some(id));
        assert_eq!(host.visible_editors(), vec![id]);
        assert_eq!(host.carets(id), vec![Caret::at(Cursor::new(0, 0))]);
        assert_eq!(host.recent_files(id), vec!["/p/a.rs"]);
    }

    #[test]
    fn test_open_same_path_reuses_buffer() {
        let (mut host, id) = host_with("/p/a.rs", "abc");
        let again = host.open_buffer(Some(PathBuf::from("/p/a.rs")), "xyz");
        assert_eq!(id, again);
        assert_eq!(host.text(id).as_deref(), Some("xyz"));
    }

    #[test]
    fn test_open_file_reads_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.md");
        std::fs::write(&path, "# notes").unwrap();

        let mut host = MemoryHost::new("IDE", "1");
        let id = host.open_file(&path).unwrap();
        assert_eq!(host.text(id).as_deref(), Some("# notes"));
        assert_eq!(host.open_file(&path).unwrap(), id);

        assert!(host.open_file(&dir.path().join("missing.rs")).is_err());
    }

    #[test]
    fn test_set_text_clamps_carets() {
        let (mut host, id) = host_with("/p/a.rs", "line one\nline two");
        host.set_carets(id, &[Caret::at(Cursor::new(1, 8))]).unwrap();
        host.set_text(id, "short").unwrap();
        assert_eq!(host.carets(id)[0].position, Cursor::new(0, 5));
    }

    #[test]
    fn test_set_carets_rejects_empty() {
        let (mut host, id) = host_with("/p/a.rs", "abc");
        assert!(host.set_carets(id, &[]).is_err());
        assert!(host.set_carets(999, &[Caret::at(Cursor::default())]).is_err());
    }

    #[test]
    fn test_visible_lines_follow_caret() {
        let text = "x\n".repeat(200);
        let (mut host, id) = host_with("/p/long.txt", &text);
        assert_eq!(host.visible_lines(id), (0, VIEWPORT_LINES - 1));

        host.set_carets(id, &[Caret::at(Cursor::new(150, 0))]).unwrap();
        let (first, last) = host.visible_lines(id);
        assert!(first <= 150 && 150 <= last);
    }

    // ==================== Project Tests ====================

    #[test]
    fn test_open_project_then_focus() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join(".git")).unwrap();
        let mut host = MemoryHost::new("IDE", "1");

        let name = dir.path().file_name().unwrap().to_string_lossy().into_owned();
        assert_eq!(
            host.open_project(dir.path()).unwrap(),
            ProjectOutcome::Opened(name.clone())
        );
        assert_eq!(
            host.open_project(dir.path()).unwrap(),
            ProjectOutcome::AlreadyOpen(name.clone())
        );
        assert!(host.recent_projects().contains_key(&name));

        let file = dir.path().join("main.rs");
        std::fs::write(&file, "fn main() {}").unwrap();
        let id = host.open_file(&file).unwrap();
        let project = host.project(id).unwrap();
        assert_eq!(project.repos[0].vcs_type, "git");
    }

    #[test]
    fn test_open_project_rejects_missing_dir() {
        let mut host = MemoryHost::new("IDE", "1");
        assert!(host.open_project(Path::new("/definitely/not/here")).is_err());
    }

    // ==================== History Tests ====================

    #[test]
    fn test_history_back_and_forward_between_files() {
        let mut host = MemoryHost::new("IDE", "1");
        let a = host.open_buffer(Some("/p/a.rs".into()), "a");
        let b = host.open_buffer(Some("/p/b.rs".into()), "b");

        assert!(host.history_available(false));
        assert!(host.history_step(false));
        assert_eq!(host.active_editor(), Some(a));

        assert!(host.history_available(true));
        assert!(host.history_step(true));
        assert_eq!(host.active_editor(), Some(b));
        assert!(!host.history_step(true));
    }

    #[test]
    fn test_caret_jump_records_history() {
        let (mut host, id) = host_with("/p/a.rs", SOURCE);
        host.set_carets(id, &[Caret::at(Cursor::new(5, 4))]).unwrap();
        assert!(host.history_step(false));
        assert_eq!(host.carets(id)[0].position, Cursor::new(0, 0));
    }

    // ==================== Caret Context Tests ====================

    #[test]
    fn test_function_at_caret() {
        let (mut host, id) = host_with("/p/a.rs", SOURCE);
        host.set_carets(id, &[Caret::at(Cursor::new(1, 4))]).unwrap();
        assert_eq!(host.function_at_caret().as_deref(), Some("first"));

        host.set_carets(id, &[Caret::at(Cursor::new(5, 4))]).unwrap();
        assert_eq!(host.function_at_caret().as_deref(), Some("second"));
    }

    #[test]
    fn test_function_at_caret_none_before_any_function() {
        let (host, _) = host_with("/p/a.py", "import os\n");
        assert_eq!(host.function_at_caret(), None);
    }

    #[test]
    fn test_language_at_caret() {
        let (host, _) = host_with("/p/a.rs", "");
        assert_eq!(host.language_at_caret().as_deref(), Some("Rust"));

        let (host, _) = host_with("/p/README", "");
        assert_eq!(host.language_at_caret(), None);
    }

    // ==================== Action Tests ====================

    #[test]
    fn test_actions() {
        let (mut host, id) = host_with("/p/a.rs", "abc\ndef");
        assert_eq!(host.run_action("$SelectAll"), ActionOutcome::Performed);
        assert_eq!(
            host.carets(id)[0].selection,
            Some((Cursor::new(0, 0), Cursor::new(1, 3)))
        );

        assert_eq!(host.run_action("EditorEscape"), ActionOutcome::Performed);
        assert!(host.carets(id)[0].selection.is_none());

        assert_eq!(host.run_action("NoSuchAction"), ActionOutcome::Unknown);
    }

    #[test]
    fn test_save_all_writes_modified_buffers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, "old").unwrap();

        let mut host = MemoryHost::new("IDE", "1");
        let id = host.open_file(&path).unwrap();
        host.set_text(id, "new").unwrap();
        assert_eq!(host.run_action("SaveAll"), ActionOutcome::Performed);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");
    }

    #[test]
    fn test_close_editor_falls_back() {
        let mut host = MemoryHost::new("IDE", "1");
        let a = host.open_buffer(Some("/p/a.rs".into()), "a");
        host.open_buffer(Some("/p/b.rs".into()), "b");

        assert_eq!(host.run_action("CloseEditor"), ActionOutcome::Performed);
        assert_eq!(host.active_editor(), Some(a));
        assert!(!host.history_available(false));

        assert_eq!(host.run_action("CloseEditor"), ActionOutcome::Performed);
        assert_eq!(host.active_editor(), None);
        assert_eq!(host.run_action("EditorEscape"), ActionOutcome::Rejected);
    }

    #[test]
    fn test_notify_records() {
        let mut host = MemoryHost::new("IDE", "1");
        host.notify(Notification::warning("t", "b"));
        let posted = host.recent_notifications();
        assert_eq!(posted.len(), 1);
        assert_eq!(posted[0].level, NotificationLevel::Warning);
    }

    #[test]
    fn test_notifications_are_capped() {
        let mut host = MemoryHost::new("IDE", "1");
        for i in 0..MAX_NOTIFICATIONS + 5 {
            host.notify(Notification::info("t", i.to_string()));
        }
        let posted = host.recent_notifications();
        assert_eq!(posted.len(), MAX_NOTIFICATIONS);
        assert_eq!(posted[0].body, "5");
        assert_eq!(posted[MAX_NOTIFICATIONS - 1].body, (MAX_NOTIFICATIONS + 4).to_string());
    }
}

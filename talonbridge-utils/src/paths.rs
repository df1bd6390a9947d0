//! Path utilities for talonbridge
//!
//! Two families of paths live here. The bridge's own config and logs follow
//! the XDG Base Directory specification. The exchange locations shared with
//! the automation layer and the sidecar (`~/.jb-state`, `~/.cursorless`)
//! are fixed relative to the home directory, because the peers look for
//! them there.

use std::path::{Path, PathBuf};

use directories::{BaseDirs, ProjectDirs};

/// Application identifier for XDG directories
const APP_NAME: &str = "talonbridge";

/// Directory (under home) holding published editor state
const JB_STATE_DIR: &str = ".jb-state";

/// Directory (under home) shared with the cursorless sidecar
const CURSORLESS_DIR: &str = ".cursorless";

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", APP_NAME)
}

/// Get the user's home directory
pub fn home_dir() -> PathBuf {
    BaseDirs::new()
        .map(|b| b.home_dir().to_path_buf())
        .or_else(|| std::env::var("HOME").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("/tmp"))
}

/// Get the configuration directory
///
/// Location: `$XDG_CONFIG_HOME/talonbridge` or `~/.config/talonbridge`
pub fn config_dir() -> PathBuf {
    project_dirs()
        .map(|p| p.config_dir().to_path_buf())
        .unwrap_or_else(|| home_dir().join(".config").join(APP_NAME))
}

/// Get the main configuration file path
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}

/// Get the state directory for the bridge's own bookkeeping (logs)
///
/// Location: `$XDG_STATE_HOME/talonbridge` or `~/.local/state/talonbridge`
pub fn state_dir() -> PathBuf {
    project_dirs()
        .and_then(|p| p.state_dir().map(|d| d.to_path_buf()))
        .unwrap_or_else(|| home_dir().join(".local").join("state").join(APP_NAME))
}

/// Get the log directory
pub fn log_dir() -> PathBuf {
    state_dir().join("log")
}

/// Directory where editor state snapshots are published
///
/// Location: `~/.jb-state`
pub fn jb_state_dir() -> PathBuf {
    home_dir().join(JB_STATE_DIR)
}

/// Directory shared with the cursorless sidecar
///
/// Location: `~/.cursorless`
pub fn cursorless_dir() -> PathBuf {
    home_dir().join(CURSORLESS_DIR)
}

/// Command socket for a host process
///
/// Location: `<state_dir>/<pid>.sock`
pub fn control_socket_path(state_dir: &Path, pid: u32) -> PathBuf {
    state_dir.join(format!("{}.sock", pid))
}

/// Socket the sidecar listens on
///
/// Location: `<cursorless_dir>/vscode-socket`
pub fn sidecar_socket_path(cursorless_dir: &Path) -> PathBuf {
    cursorless_dir.join("vscode-socket")
}

/// Marker file naming the pid of the primary editor
///
/// Location: `<cursorless_dir>/primary-editor-pid`
pub fn primary_editor_marker(cursorless_dir: &Path) -> PathBuf {
    cursorless_dir.join("primary-editor-pid")
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

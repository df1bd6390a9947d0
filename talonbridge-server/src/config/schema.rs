//! Configuration schema structs

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use talonbridge_utils::paths;

/// Root configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub paths: PathsConfig,
    pub sidecar: SidecarConfig,
    pub sync: SyncConfig,
    pub server: ServerConfig,
    pub host: HostConfig,
}

impl AppConfig {
    /// Directory receiving the published state files
    pub fn state_dir(&self) -> PathBuf {
        self.paths
            .state_dir
            .clone()
            .unwrap_or_else(paths::jb_state_dir)
    }

    /// Directory shared with the sidecar
    pub fn cursorless_dir(&self) -> PathBuf {
        self.paths
            .cursorless_dir
            .clone()
            .unwrap_or_else(paths::cursorless_dir)
    }

    /// Socket the sidecar listens on
    pub fn sidecar_socket(&self) -> PathBuf {
        self.sidecar
            .socket_path
            .clone()
            .unwrap_or_else(|| paths::sidecar_socket_path(&self.cursorless_dir()))
    }

    /// Command socket for this process
    pub fn control_socket(&self, pid: u32) -> PathBuf {
        self.server
            .socket_path
            .clone()
            .unwrap_or_else(|| paths::control_socket_path(&self.state_dir(), pid))
    }
}

/// Locations of the exchange directories
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PathsConfig {
    /// Defaults to `~/.jb-state`
    pub state_dir: Option<PathBuf>,
    /// Defaults to `~/.cursorless`
    pub cursorless_dir: Option<PathBuf>,
}

/// Sidecar connection settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SidecarConfig {
    /// Defaults to `<cursorless_dir>/vscode-socket`
    pub socket_path: Option<PathBuf>,
    /// Receive timeout for one round trip
    pub timeout_ms: u64,
}

impl Default for SidecarConfig {
    fn default() -> Self {
        Self {
            socket_path: None,
            timeout_ms: 2000,
        }
    }
}

impl SidecarConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Tuning for the cursorless synchronization loop
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SyncConfig {
    /// Probes before the sidecar is declared not ready
    pub readiness_attempts: u32,
    pub readiness_backoff_ms: u64,
    /// Whole-command attempts before giving up on conflicts
    pub command_attempts: u32,
    pub command_backoff_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            readiness_attempts: 4,
            readiness_backoff_ms: 15,
            command_attempts: 6,
            command_backoff_ms: 30,
        }
    }
}

impl SyncConfig {
    pub fn readiness_backoff(&self) -> Duration {
        Duration::from_millis(self.readiness_backoff_ms)
    }

    pub fn command_backoff(&self) -> Duration {
        Duration::from_millis(self.command_backoff_ms)
    }
}

/// Command socket settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Defaults to `<state_dir>/<pid>.sock`
    pub socket_path: Option<PathBuf>,
}

/// Settings for the built-in headless host
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HostConfig {
    /// Product name reported in responses and used for the state aliases
    pub product: String,
    pub version: String,
    /// Files opened at startup; the last one is focused
    pub open: Vec<PathBuf>,
    /// Projects known to the host (name is the directory name)
    pub projects: Vec<PathBuf>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            product: "talonbridge".into(),
            version: env!("CARGO_PKG_VERSION").into(),
            open: Vec::new(),
            projects: Vec::new(),
        }
    }
}

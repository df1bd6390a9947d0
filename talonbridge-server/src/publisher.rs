//! State publisher
//!
//! Owns the change serial and the buffer mirrors, and writes snapshots to
//! the well-known files watched by the automation layer and the sidecar:
//!
//! - `<state_dir>/<pid>.json`: the snapshot
//! - `<state_dir>/latest.json`, `<state_dir>/<product>.json`: aliases
//! - `<state_dir>/<product>.pid`, `latest.pid`, `pid`: our pid
//! - `<cursorless_dir>/editor-state.json`: only while we are the primary editor
//!
//! Publishing is best effort. Failures are logged and never reach the event
//! source that triggered them.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use talonbridge_protocol::OverallState;
use talonbridge_utils::{paths, BridgeError, Result};

use crate::config::AppConfig;
use crate::host::EditorHost;
use crate::state::{build_snapshot, MirrorStore};

/// Where the publisher writes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublisherPaths {
    pub state_dir: PathBuf,
    pub cursorless_dir: PathBuf,
}

impl PublisherPaths {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            state_dir: config.state_dir(),
            cursorless_dir: config.cursorless_dir(),
        }
    }

    /// Both exchange directories below `root`
    #[cfg(test)]
    pub fn under(root: &Path) -> Self {
        Self {
            state_dir: root.join("jb-state"),
            cursorless_dir: root.join("cursorless"),
        }
    }

    /// `<state_dir>/<pid>.json`
    pub fn state_file(&self, pid: u32) -> PathBuf {
        self.state_dir.join(format!("{}.json", pid))
    }

    /// `<cursorless_dir>/editor-state.json`
    pub fn cursorless_state_file(&self) -> PathBuf {
        self.cursorless_dir.join("editor-state.json")
    }
}

/// Whether the primary-editor marker names `pid`
///
/// Any read or parse failure means "not primary".
pub fn is_primary_editor(cursorless_dir: &Path, pid: u32) -> bool {
    std::fs::read_to_string(paths::primary_editor_marker(cursorless_dir))
        .ok()
        .and_then(|s| s.trim().parse::<u32>().ok())
        == Some(pid)
}

/// Alias-safe file name for a product
fn product_file_stem(product: &str) -> String {
    product.replace(['/', '\\'], "_")
}

/// Publishes editor state snapshots
pub struct StatePublisher {
    pid: u32,
    paths: PublisherPaths,
    serial: u64,
    mirrors: MirrorStore,
    shutdown: bool,
}

impl StatePublisher {
    pub fn new(pid: u32, paths: PublisherPaths) -> Self {
        Self {
            pid,
            paths,
            serial: 0,
            mirrors: MirrorStore::new(),
            shutdown: false,
        }
    }

    /// Use a specific mirror store
    pub fn with_mirrors(mut self, mirrors: MirrorStore) -> Self {
        self.mirrors = mirrors;
        self
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn serial(&self) -> u64 {
        self.serial
    }

    pub fn paths(&self) -> &PublisherPaths {
        &self.paths
    }

    pub fn is_primary(&self) -> bool {
        is_primary_editor(&self.paths.cursorless_dir, self.pid)
    }

    /// Build a snapshot, refreshing mirrors
    pub fn snapshot(&mut self, host: &dyn EditorHost) -> OverallState {
        build_snapshot(host, &mut self.mirrors, self.serial, self.pid)
    }

    /// Record a host change: bump the serial, then publish
    pub fn mark_change(&mut self, host: &dyn EditorHost, reason: &str) {
        self.serial += 1;
        info!("serial bumped to {} ({})", self.serial, reason);
        self.publish(host);
    }

    /// Write the current snapshot; returns the primary state file on success
    pub fn publish(&mut self, host: &dyn EditorHost) -> Option<PathBuf> {
        let path = self.paths.state_file(self.pid);
        if self.shutdown {
            info!("Skipping writing state to {:?}; shutdown initiated", path);
            return None;
        }

        let state = self.snapshot(host);
        match self.write_state(&state) {
            Ok(()) => {
                debug!("Wrote state (serial {}) to {:?}", state.serial, path);
                Some(path)
            }
            Err(e) => {
                warn!("Failed to publish state: {}", e);
                None
            }
        }
    }

    fn write_state(&self, state: &OverallState) -> Result<()> {
        let json = serde_json::to_string(state)
            .map_err(|e| BridgeError::internal(format!("Failed to encode state: {}", e)))?;

        let dir = &self.paths.state_dir;
        paths::ensure_dir(dir).map_err(|e| BridgeError::FileWrite {
            path: dir.clone(),
            source: e,
        })?;

        let path = self.paths.state_file(self.pid);
        std::fs::write(&path, &json).map_err(|e| BridgeError::FileWrite { path, source: e })?;

        let product = product_file_stem(&state.ide_product);
        let pid = self.pid.to_string();
        write_alias(&dir.join(format!("{}.pid", product)), &pid);
        write_alias(&dir.join("latest.pid"), &pid);
        write_alias(&dir.join("latest.json"), &json);
        write_alias(&dir.join(format!("{}.json", product)), &json);
        write_alias(&dir.join("pid"), &pid);

        if self.is_primary() {
            write_alias(&self.paths.cursorless_state_file(), &json);
        }

        Ok(())
    }

    /// Remove the published snapshot files and stop publishing
    pub fn unpublish(&mut self, host: &dyn EditorHost) {
        self.shutdown = true;

        let dir = &self.paths.state_dir;
        let product = product_file_stem(&host.product());
        remove_quietly(&self.paths.state_file(self.pid));
        remove_quietly(&dir.join("latest.json"));
        remove_quietly(&dir.join(format!("{}.json", product)));

        if self.is_primary() {
            remove_quietly(&self.paths.cursorless_state_file());
        }
        info!("Unpublished state for pid {}", self.pid);
    }
}

fn write_alias(path: &Path, contents: &str) {
    if let Err(e) = std::fs::write(path, contents) {
        warn!("Failed to write {:?}: {}", path, e);
    }
}

fn remove_quietly(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => debug!("Deleted {:?}", path),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to delete {:?}: {}", path, e),
    }
}

//! File watcher for configuration hot-reload

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use notify_debouncer_full::{new_debouncer, DebounceEventResult, Debouncer, FileIdMap};
use tokio::sync::mpsc;

use talonbridge_utils::{paths, BridgeError, Result};

use super::{AppConfig, ConfigHandle, ConfigLoader};

/// Watches the configuration file for changes
pub struct ConfigWatcher {
    /// File being watched
    config_file: PathBuf,
    /// Channel receiver for events
    rx: mpsc::UnboundedReceiver<Result<Vec<Event>>>,
    /// Debouncer handle (kept alive)
    _debouncer: Debouncer<RecommendedWatcher, FileIdMap>,
}

impl ConfigWatcher {
    /// Create a watcher for the default config file
    pub fn new() -> Result<Self> {
        Self::for_path(paths::config_file())
    }

    /// Create a watcher for a specific config file
    ///
    /// The parent directory is watched, so the file may not exist yet.
    pub fn for_path(config_file: PathBuf) -> Result<Self> {
        let config_dir = config_file
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| BridgeError::config("config file has no parent directory"))?;

        paths::ensure_dir(&config_dir).map_err(|e| BridgeError::FileWrite {
            path: config_dir.clone(),
            source: e,
        })?;

        let (tx, rx) = mpsc::unbounded_channel();

        let mut debouncer = new_debouncer(
            Duration::from_millis(100),
            None,
            move |result: DebounceEventResult| {
                let events = result
                    .map(|events| events.into_iter().map(|e| e.event).collect())
                    .map_err(|errs| BridgeError::config(format!("Watch error: {:?}", errs)));
                let _ = tx.send(events);
            },
        )
        .map_err(|e| BridgeError::config(format!("Failed to create watcher: {}", e)))?;

        debouncer
            .watcher()
            .watch(&config_dir, RecursiveMode::NonRecursive)
            .map_err(|e| BridgeError::config(format!("Failed to watch: {}", e)))?;

        Ok(Self {
            config_file,
            rx,
            _debouncer: debouncer,
        })
    }

    /// Run the watcher loop, updating config on changes
    pub async fn run(mut self, config: ConfigHandle) {
        tracing::info!("Config watcher started for {:?}", self.config_file);

        while let Some(result) = self.rx.recv().await {
            match result {
                Ok(events) => {
                    if events.iter().any(|e| self.is_config_change(e)) {
                        self.handle_change(&config);
                    }
                }
                Err(e) => {
                    tracing::error!("Config watch error: {}", e);
                }
            }
        }
    }

    /// Check if an event touches the watched file
    fn is_config_change(&self, event: &Event) -> bool {
        let name = self.config_file.file_name();
        matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_))
            && event.paths.iter().any(|p| p.file_name() == name)
    }

    fn handle_change(&self, config: &ConfigHandle) {
        tracing::info!("Config file changed, reloading...");

        match ConfigLoader::load_and_validate_path(&self.config_file) {
            Ok(new_config) => {
                log_restart_only_changes(&config.load(), &new_config);
                config.store(Arc::new(new_config));
                tracing::info!("Configuration reloaded successfully");
            }
            Err(e) => {
                tracing::error!("Config reload failed (keeping previous): {}", e);
            }
        }
    }
}

/// Socket and directory settings are bound at startup
fn log_restart_only_changes(old: &AppConfig, new: &AppConfig) {
    if old.paths != new.paths {
        tracing::warn!("paths changed - will apply after restart");
    }
    if old.server != new.server {
        tracing::warn!("server socket_path changed - will apply after restart");
    }
    if old.host != new.host {
        tracing::warn!("host settings changed - will apply after restart");
    }
}

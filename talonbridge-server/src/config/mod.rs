//! Configuration management for the bridge server
//!
//! Provides hot-reloading configuration with lock-free access
//! using ArcSwap. The sync engine reads its tuning once per command.

mod defaults;
mod loader;
mod schema;
mod watcher;

pub use defaults::DEFAULT_CONFIG_TOML;
pub use loader::ConfigLoader;
pub use schema::*;
pub use watcher::ConfigWatcher;

use arc_swap::ArcSwap;
use std::sync::Arc;

/// Global configuration handle
pub type ConfigHandle = Arc<ArcSwap<AppConfig>>;

/// Create a new config handle with defaults
pub fn new_config_handle() -> ConfigHandle {
    Arc::new(ArcSwap::from_pointee(AppConfig::default()))
}

/// Create a config handle holding `config`
pub fn config_handle(config: AppConfig) -> ConfigHandle {
    Arc::new(ArcSwap::from_pointee(config))
}

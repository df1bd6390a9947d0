//! talonbridge-utils: Common utilities shared across talonbridge crates
//!
//! This crate provides:
//! - Unified error types ([`BridgeError`], [`Result`])
//! - Logging infrastructure ([`init_logging`], [`LogConfig`])
//! - Well-known path utilities ([`paths`] module)

pub mod error;
pub mod logging;
pub mod paths;

// Re-export main types at crate root for convenience
pub use error::{BridgeError, Result};
pub use logging::{init_logging, init_logging_with_config, LogConfig, LogOutput};

// Re-export commonly used path functions
pub use paths::{
    config_dir, config_file, control_socket_path, cursorless_dir, home_dir, jb_state_dir,
    log_dir, primary_editor_marker, sidecar_socket_path, state_dir,
};

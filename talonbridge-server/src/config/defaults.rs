//! Default configuration values
//!
//! These are embedded in the binary and used when no config file exists.

/// Default configuration as TOML (for reference/documentation)
pub const DEFAULT_CONFIG_TOML: &str = r##"
# talonbridge configuration

[paths]
# state_dir = "~/.jb-state"
# cursorless_dir = "~/.cursorless"

[sidecar]
# socket_path = "~/.cursorless/vscode-socket"
timeout_ms = 2000

[sync]
readiness_attempts = 4
readiness_backoff_ms = 15
command_attempts = 6
command_backoff_ms = 30

[server]
# socket_path = "~/.jb-state/<pid>.sock"

[host]
product = "talonbridge"
open = []
projects = []
"##;

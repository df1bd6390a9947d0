//! CLI argument parsing

use std::path::PathBuf;

use clap::Parser;

/// Send one command to a running talonbridge server
#[derive(Parser, Debug)]
#[command(name = "talonbridge-ctl")]
#[command(about = "Send a command to a talonbridge server")]
#[command(version)]
pub struct Cli {
    /// Command socket to connect to
    #[arg(long, env = "TALONBRIDGE_SOCKET", conflicts_with = "pid")]
    pub socket: Option<PathBuf>,

    /// Server process id; the socket is `<state-dir>/<pid>.sock`
    #[arg(long)]
    pub pid: Option<u32>,

    /// Directory holding the published state and sockets
    #[arg(long, env = "TALONBRIDGE_STATE_DIR")]
    pub state_dir: Option<PathBuf>,

    /// Response timeout in milliseconds
    #[arg(long, default_value_t = 10_000)]
    pub timeout_ms: u64,

    /// Print the whole response envelope instead of the result
    #[arg(long)]
    pub raw: bool,

    /// Verb to run (ping, state, cursorless, goto, ...)
    pub verb: String,

    /// Arguments for the verb
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

//! talonbridge-ctl: send one command to a talonbridge server
//!
//! Prints the result on success (exit 0) or the error on stderr (exit 1).

mod cli;
mod client;

use std::time::Duration;

use clap::Parser;

use talonbridge_protocol::{Command, Response};
use talonbridge_utils::{init_logging_with_config, jb_state_dir, LogConfig, Result};

use cli::Cli;
use client::{resolve_socket, Client};

async fn execute(cli: Cli) -> Result<Response> {
    let state_dir = cli.state_dir.clone().unwrap_or_else(jb_state_dir);
    let socket = resolve_socket(cli.socket, cli.pid, &state_dir)?;

    let command = if cli.args.is_empty() {
        Command::new(cli.verb)
    } else {
        Command::with_args(cli.verb, cli.args)
    };

    let mut client = Client::connect(&socket, Duration::from_millis(cli.timeout_ms)).await?;
    client.request(command).await
}

#[tokio::main]
async fn main() {
    if let Err(e) = init_logging_with_config(LogConfig::cli()) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let cli = Cli::parse();
    let raw = cli.raw;

    let exit_code = match execute(cli).await {
        Ok(response) => {
            if raw {
                match serde_json::to_string(&response) {
                    Ok(json) => println!("{}", json),
                    Err(e) => eprintln!("{}", e),
                }
            }

            match (&response.error, response.result()) {
                (Some(error), _) => {
                    if !raw {
                        eprintln!("{}", error);
                    }
                    1
                }
                (None, result) => {
                    if !raw {
                        println!("{}", result.unwrap_or_default());
                    }
                    0
                }
            }
        }
        Err(e) => {
            eprintln!("{}", e);
            1
        }
    };

    std::process::exit(exit_code);
}

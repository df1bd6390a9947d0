//! talonbridge server - editor bridge daemon

use tokio::sync::broadcast;
use tracing::{error, info, warn};

use talonbridge_utils::{init_logging_with_config, BridgeError, LogConfig, Result};

mod config;
mod cursorless;
mod handlers;
mod host;
mod publisher;
mod server;
mod sidecar;
mod state;

use config::{config_handle, ConfigLoader, ConfigWatcher, DEFAULT_CONFIG_TOML};
use handlers::HandlerContext;
use host::{spawn_host_actor, MemoryHost};
use publisher::{PublisherPaths, StatePublisher};

/// Run the bridge until interrupted
async fn run_daemon() -> Result<()> {
    let pid = std::process::id();
    info!("talonbridge server starting (pid {})", pid);

    let app_config = ConfigLoader::load_and_validate()?;
    let config = config_handle(app_config.clone());

    match ConfigWatcher::new() {
        Ok(watcher) => {
            tokio::spawn(watcher.run(config.clone()));
        }
        Err(e) => warn!("Config hot-reload disabled: {}", e),
    }

    let host = MemoryHost::from_config(&app_config.host)?;
    let publisher = StatePublisher::new(pid, PublisherPaths::from_config(&app_config));
    let (host_handle, host_thread) = spawn_host_actor(Box::new(host), publisher)?;

    if let Some(path) = host_handle.run_and_wait(|ctx| ctx.publish()).await? {
        info!("Initial state published to {}", path.display());
    }

    let product = format!("{} {}", app_config.host.product, app_config.host.version);
    let ctx = HandlerContext::new(pid, product, host_handle.clone(), config);

    let socket_path = app_config.control_socket(pid);
    let listener = server::bind_control_socket(&socket_path)?;
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let accept_loop = tokio::spawn(server::run_accept_loop(
        listener,
        socket_path,
        ctx,
        shutdown_rx,
    ));

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutting down");

    let _ = shutdown_tx.send(());
    if let Err(e) = accept_loop.await {
        warn!("Accept loop ended abnormally: {}", e);
    }

    host_handle.shutdown();
    tokio::task::spawn_blocking(move || host_thread.join())
        .await
        .map_err(|e| BridgeError::internal(e.to_string()))?
        .map_err(|_| BridgeError::internal("host actor panicked"))?;

    info!("talonbridge server stopped");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 && args[1] == "default-config" {
        print!("{}", DEFAULT_CONFIG_TOML);
        return Ok(());
    }

    init_logging_with_config(LogConfig::server())?;

    run_daemon().await
}

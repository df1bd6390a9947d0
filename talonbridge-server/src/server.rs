//! Command socket listener
//!
//! One task per connection. Requests on a connection are answered in order,
//! one response line per request line.

use std::path::{Path, PathBuf};

use futures::{SinkExt, StreamExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::broadcast;
use tokio_util::codec::Framed;
use tracing::{debug, error, info, warn};

use talonbridge_protocol::ServerCodec;
use talonbridge_utils::{paths, Result};

use crate::handlers::HandlerContext;

/// Bind the command socket, replacing a stale socket file
pub fn bind_control_socket(path: &Path) -> Result<UnixListener> {
    if let Some(parent) = path.parent() {
        paths::ensure_dir(parent)?;
    }
    if path.exists() {
        debug!("Removing stale socket {}", path.display());
        std::fs::remove_file(path)?;
    }

    let listener = UnixListener::bind(path)?;
    info!("Command socket bound to {}", path.display());
    Ok(listener)
}

/// Accept connections until shutdown, then remove the socket file
pub async fn run_accept_loop(
    listener: UnixListener,
    socket_path: PathBuf,
    ctx: HandlerContext,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok((stream, _)) => {
                        debug!("New command connection");
                        let ctx = ctx.clone();
                        tokio::spawn(async move {
                            handle_client(stream, ctx).await;
                        });
                    }
                    Err(e) => {
                        error!("Accept error: {}", e);
                    }
                }
            }
            _ = shutdown_rx.recv() => {
                info!("Shutdown signal received, stopping command socket");
                break;
            }
        }
    }

    if let Err(e) = std::fs::remove_file(&socket_path) {
        warn!("Failed to remove {}: {}", socket_path.display(), e);
    }
}

/// Serve one connection until the peer hangs up
pub async fn handle_client(stream: UnixStream, ctx: HandlerContext) {
    let mut framed = Framed::new(stream, ServerCodec::new());

    while let Some(item) = framed.next().await {
        let request = match item {
            Ok(request) => request,
            Err(e) => {
                warn!("Dropping connection: {}", e);
                break;
            }
        };

        let response = ctx.route(request).await;
        if let Err(e) = framed.send(response).await {
            warn!("Failed to write response: {}", e);
            break;
        }
    }
    debug!("Command connection closed");
}

//! One-shot client for the command socket

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::UnixStream;
use tokio::time::timeout;
use tokio_util::codec::Framed;
use tracing::debug;

use talonbridge_protocol::{ClientCodec, Command, Response};
use talonbridge_utils::{control_socket_path, BridgeError, Result};

/// Find the socket of the server to talk to
///
/// An explicit socket wins, then an explicit pid; otherwise the pid is read
/// from `<state_dir>/latest.pid`, written by the most recently active server.
pub fn resolve_socket(socket: Option<PathBuf>, pid: Option<u32>, state_dir: &Path) -> Result<PathBuf> {
    if let Some(socket) = socket {
        return Ok(socket);
    }

    let pid = match pid {
        Some(pid) => pid,
        None => {
            let latest = state_dir.join("latest.pid");
            let contents = std::fs::read_to_string(&latest).map_err(|e| BridgeError::FileRead {
                path: latest.clone(),
                source: e,
            })?;
            contents.trim().parse().map_err(|_| {
                BridgeError::invalid_argument(format!("{} does not hold a pid", latest.display()))
            })?
        }
    };
    Ok(control_socket_path(state_dir, pid))
}

/// Connection to one server
pub struct Client {
    framed: Framed<UnixStream, ClientCodec>,
    timeout: Duration,
}

impl Client {
    pub async fn connect(path: &Path, timeout: Duration) -> Result<Self> {
        if !path.exists() {
            return Err(BridgeError::ServerNotRunning {
                path: path.to_path_buf(),
            });
        }

        let stream = UnixStream::connect(path)
            .await
            .map_err(|e| BridgeError::connection(format!("Failed to connect to {}: {}", path.display(), e)))?;
        debug!("Connected to {}", path.display());

        Ok(Self {
            framed: Framed::new(stream, ClientCodec::new()),
            timeout,
        })
    }

    /// Send a command and wait for its response
    pub async fn request(&mut self, command: Command) -> Result<Response> {
        self.framed
            .send(command)
            .await
            .map_err(|e| BridgeError::connection(format!("Failed to send: {}", e)))?;

        match timeout(self.timeout, self.framed.next()).await {
            Ok(Some(Ok(response))) => Ok(response),
            Ok(Some(Err(e))) => Err(BridgeError::protocol(format!("Failed to receive: {}", e))),
            Ok(None) => Err(BridgeError::ConnectionClosed),
            Err(_) => Err(BridgeError::ConnectionTimeout {
                millis: self.timeout.as_millis() as u64,
            }),
        }
    }
}

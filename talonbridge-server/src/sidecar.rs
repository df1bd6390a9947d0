//! Client for the cursorless sidecar
//!
//! One connection per request: connect, write the JSON command and a
//! newline, read one line back. Transport failures never escape as errors;
//! they come back as the text `Error: <description>`, which the caller then
//! fails to decode.

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tokio::time::timeout;
use tracing::{debug, warn};

use talonbridge_protocol::{encode_sidecar_command, SidecarCommand};
use talonbridge_utils::{BridgeError, Result};

use crate::config::AppConfig;

/// Something that can carry a command to the sidecar
pub trait SidecarClient: Send + Sync {
    /// Send one command and return the raw response text
    fn send(&self, command: &SidecarCommand) -> impl Future<Output = String> + Send;
}

/// Sidecar reached over a Unix socket
#[derive(Debug, Clone)]
pub struct UnixSidecar {
    socket_path: PathBuf,
    timeout: Duration,
}

impl UnixSidecar {
    pub fn new(socket_path: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            socket_path: socket_path.into(),
            timeout,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.sidecar_socket(), config.sidecar.timeout())
    }

    async fn round_trip(&self, command: &SidecarCommand) -> Result<String> {
        let line = encode_sidecar_command(command)
            .map_err(|e| BridgeError::protocol(e.to_string()))?;
        let millis = self.timeout.as_millis() as u64;

        let stream = timeout(self.timeout, UnixStream::connect(&self.socket_path))
            .await
            .map_err(|_| BridgeError::ConnectionTimeout { millis })?
            .map_err(|e| BridgeError::connection(format!("{}: {}", self.socket_path.display(), e)))?;

        let (read_half, mut write_half) = stream.into_split();
        timeout(self.timeout, async {
            write_half.write_all(line.as_bytes()).await?;
            write_half.flush().await
        })
        .await
        .map_err(|_| BridgeError::ConnectionTimeout { millis })??;

        let mut reader = BufReader::new(read_half);
        let mut response = String::new();
        let read = timeout(self.timeout, reader.read_line(&mut response))
            .await
            .map_err(|_| BridgeError::ConnectionTimeout { millis })??;

        if read == 0 {
            return Err(BridgeError::ConnectionClosed);
        }
        Ok(response.trim_end().to_string())
    }
}

impl SidecarClient for UnixSidecar {
    async fn send(&self, command: &SidecarCommand) -> String {
        debug!("Sending to sidecar: {}", command.command);
        match self.round_trip(command).await {
            Ok(response) => {
                debug!("Received from sidecar: {} bytes", response.len());
                response
            }
            Err(e) => {
                warn!("Sidecar {} failed: {}", command.command, e);
                format!("Error: {}", e)
            }
        }
    }
}

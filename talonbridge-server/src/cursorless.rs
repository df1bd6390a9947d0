//! Cursorless synchronization engine
//!
//! The sidecar computes edits from the document it last saw. An edit is
//! applied only if the host has not changed since the command was sent;
//! otherwise the whole operation is thrown away and run again from scratch.
//!
//! One attempt:
//!
//! 1. Readiness probe: capture the host text and serial together, publish,
//!    ask the sidecar to pull the state, read back its view of the document
//!    and compare with the captured text.
//! 2. Fenced dispatch: send the command. The fence is the serial captured by
//!    the successful probe, so an edit landing after that capture fails the
//!    commit even if the sidecar had already read the older text.
//! 3. Fenced commit (on the host actor): if the serial moved, discard;
//!    otherwise apply the new text (only when it differs) and the carets.
//! 4. Post-sync notice: publish and ask the sidecar to pull again.

use std::path::PathBuf;

use tokio::time::sleep;
use tracing::{debug, info};

use talonbridge_protocol::{
    decode_cursorless_response, decode_sidecar_state, Cursor, SidecarCommand, SidecarSelection,
};
use talonbridge_utils::BridgeError;

use crate::config::SyncConfig;
use crate::host::{Caret, HostContext, HostHandle, Notification};
use crate::sidecar::SidecarClient;

/// Failure of a cursorless command
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Sidecar wasn't ready after {attempts} attempts")]
    NotReady { attempts: u32 },

    #[error("Sidecar error: {0}")]
    Sidecar(String),

    #[error("Editor serial changed during execution ({expected} -> {actual})")]
    SerialChanged { expected: u64, actual: u64 },

    #[error("Failed to read sidecar contents {path}: {source}")]
    ContentUnavailable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid sidecar response: {0}")]
    Protocol(String),

    #[error(transparent)]
    Host(#[from] BridgeError),

    #[error("Gave up after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: Box<SyncError> },
}

impl SyncError {
    /// Whether running the whole command again may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::SerialChanged { .. } | Self::Protocol(_))
    }
}

/// A completed cursorless command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    pub result: String,
    /// Attempts used, including the successful one
    pub attempts: u32,
}

/// Convert a sidecar selection into a host caret
pub fn caret_from_sidecar(selection: &SidecarSelection) -> Caret {
    let start = selection.start.or(selection.anchor).map(Cursor::from);
    let end = selection.end.or(selection.active).map(Cursor::from);
    let position = selection
        .active
        .map(Cursor::from)
        .or(end)
        .or(start)
        .unwrap_or_default();

    match (start, end) {
        (Some(start), Some(end)) => Caret::selecting(position, start, end),
        _ => Caret::at(position),
    }
}

/// Runs cursorless commands against one sidecar
pub struct SyncEngine<'a, C> {
    client: &'a C,
    host: HostHandle,
    tuning: SyncConfig,
}

impl<'a, C: SidecarClient> SyncEngine<'a, C> {
    pub fn new(client: &'a C, host: HostHandle, tuning: SyncConfig) -> Self {
        Self {
            client,
            host,
            tuning,
        }
    }

    /// Run a command, retrying conflicts
    pub async fn run(&self, payload: &str) -> Result<SyncOutcome, SyncError> {
        let max_attempts = self.tuning.command_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            info!("cursorless try {}", attempt);

            match self.run_once(payload).await {
                Ok(result) => {
                    return Ok(SyncOutcome {
                        result,
                        attempts: attempt,
                    })
                }
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    info!("cursorless hit {}, try {}", e, attempt);
                    sleep(self.tuning.command_backoff()).await;
                }
                Err(e) if e.is_retryable() => {
                    return Err(SyncError::RetriesExhausted {
                        attempts: attempt,
                        last: Box::new(e),
                    })
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// One attempt; see the module docs
    pub async fn run_once(&self, payload: &str) -> Result<String, SyncError> {
        let starting_serial = self.ensure_ready().await?;
        info!("running with serial: {}", starting_serial);

        let raw = self.client.send(&SidecarCommand::cursorless(payload)).await;
        let response = decode_cursorless_response(&raw)
            .map_err(|e| SyncError::Protocol(format!("{} ({})", e, raw)))?;

        if let Some(error) = response.error {
            return Err(SyncError::Sidecar(error));
        }

        if let Some(exception) = response.command_exception {
            let body = exception.clone();
            self.host
                .run_and_wait(move |ctx| ctx.host.notify(Notification::error("Cursorless error", body)))
                .await?;
            return Ok(format!("Cursorless error: {}", exception));
        }

        let new_state = response
            .new_state
            .ok_or_else(|| SyncError::Protocol("response has no newState".into()))?;
        let contents_path = new_state
            .contents_path
            .map(PathBuf::from)
            .ok_or_else(|| SyncError::Protocol("newState has no contentsPath".into()))?;

        let new_contents = tokio::fs::read_to_string(&contents_path)
            .await
            .map_err(|source| SyncError::ContentUnavailable {
                path: contents_path.clone(),
                source,
            })?;
        let carets: Vec<Caret> = new_state.cursors.iter().map(caret_from_sidecar).collect();

        let wrote = self
            .host
            .run_and_wait(move |ctx| commit(ctx, starting_serial, &new_contents, &carets))
            .await??;
        debug!("Committed sidecar result (text changed: {})", wrote);

        self.host
            .run_and_wait(|ctx| {
                ctx.publish();
            })
            .await?;
        let post_sync = self
            .client
            .send(&SidecarCommand::apply_primary_editor_state())
            .await;

        Ok(format!("{} {}", raw, post_sync))
    }

    /// Probe until the sidecar sees exactly the host's active document
    ///
    /// Returns the serial the matching document was captured at.
    pub async fn ensure_ready(&self) -> Result<u64, SyncError> {
        let attempts = self.tuning.readiness_attempts.max(1);

        for probe in 1..=attempts {
            let ready = self.probe().await?;
            info!("sidecar readiness, try {}: {}", probe, ready.is_some());
            if let Some(serial) = ready {
                return Ok(serial);
            }
            if probe < attempts {
                sleep(self.tuning.readiness_backoff()).await;
            }
        }

        let body = format!("Sidecar wasn't ready after {} attempts", attempts);
        self.host
            .run_and_wait(move |ctx| ctx.host.notify(Notification::error("Sidecar error", body)))
            .await?;
        Err(SyncError::NotReady { attempts })
    }

    /// One readiness check; `Some(serial)` when the sidecar's view matches
    async fn probe(&self) -> Result<Option<u64>, SyncError> {
        let (expected, serial) = self
            .host
            .run_and_wait(|ctx| {
                let text = ctx.host.active_editor().and_then(|id| ctx.host.text(id));
                ctx.publish();
                text.map(|text| (text, ctx.serial()))
            })
            .await?
            .ok_or(BridgeError::EditorNotFound)?;

        self.client
            .send(&SidecarCommand::apply_primary_editor_state())
            .await;
        let raw = self
            .client
            .send(&SidecarCommand::state_with_contents())
            .await;

        let state = match decode_sidecar_state(&raw) {
            Ok(state) => state,
            Err(e) => {
                debug!("Unreadable sidecar state ({}): {}", e, raw);
                return Ok(None);
            }
        };
        let Some(contents_path) = state.contents_path else {
            debug!("Sidecar state has no contentsPath");
            return Ok(None);
        };

        match tokio::fs::read_to_string(&contents_path).await {
            Ok(actual) => Ok((actual == expected).then_some(serial)),
            Err(e) => {
                debug!("Failed to read {}: {}", contents_path, e);
                Ok(None)
            }
        }
    }
}

/// Apply a sidecar result if nothing changed since dispatch
///
/// Returns whether the document text was replaced.
fn commit(
    ctx: &mut HostContext,
    starting_serial: u64,
    new_contents: &str,
    carets: &[Caret],
) -> Result<bool, SyncError> {
    let current = ctx.serial();
    info!("pre-command serial: {}, post-command serial: {}", starting_serial, current);

    if current != starting_serial {
        ctx.host.notify(Notification::info(
            "Sidecar error",
            format!("Serial differed: {} vs {}; retrying", current, starting_serial),
        ));
        return Err(SyncError::SerialChanged {
            expected: starting_serial,
            actual: current,
        });
    }

    let editor = ctx.host.active_editor().ok_or(BridgeError::EditorNotFound)?;
    let is_write = ctx.host.text(editor).as_deref() != Some(new_contents);
    if is_write {
        ctx.host.set_text(editor, new_contents)?;
    }
    if !carets.is_empty() {
        ctx.host.set_carets(editor, carets)?;
    }
    Ok(is_write)
}

//! The host actor
//!
//! A dedicated OS thread owns the host and the state publisher. Everything
//! that reads or mutates document, caret, serial or mirror state runs there,
//! one message at a time. Change events and submitted work share a single
//! FIFO queue, so an event sent before a task is applied before it runs.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::PathBuf;
use std::thread::JoinHandle;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};

use talonbridge_protocol::OverallState;
use talonbridge_utils::{BridgeError, Result};

use super::EditorHost;
use crate::publisher::StatePublisher;

type HostTask = Box<dyn FnOnce(&mut HostContext) + Send>;

enum HostMessage {
    Run(HostTask),
    Change(String),
    Shutdown,
}

/// State owned by the host actor thread
pub struct HostContext {
    pub host: Box<dyn EditorHost>,
    pub publisher: StatePublisher,
}

impl HostContext {
    /// Current change serial
    pub fn serial(&self) -> u64 {
        self.publisher.serial()
    }

    /// Build a snapshot (refreshing mirrors) without publishing it
    pub fn snapshot(&mut self) -> OverallState {
        self.publisher.snapshot(self.host.as_ref())
    }

    /// Publish the current state
    pub fn publish(&mut self) -> Option<PathBuf> {
        self.publisher.publish(self.host.as_ref())
    }

    /// Record a host change: bump the serial and publish
    pub fn mark_change(&mut self, reason: &str) {
        self.publisher.mark_change(self.host.as_ref(), reason);
    }
}

/// Sender handed to hosts for reporting changes
#[derive(Clone)]
pub struct ChangeNotifier {
    tx: mpsc::UnboundedSender<HostMessage>,
}

impl ChangeNotifier {
    /// Report a change; dropped silently once the actor is gone
    pub fn notify(&self, reason: impl Into<String>) {
        let _ = self.tx.send(HostMessage::Change(reason.into()));
    }
}

/// Cheap handle for submitting work to the host actor
#[derive(Clone)]
pub struct HostHandle {
    tx: mpsc::UnboundedSender<HostMessage>,
}

impl HostHandle {
    /// Run `f` on the host thread and wait for its result
    pub async fn run_and_wait<R, F>(&self, f: F) -> Result<R>
    where
        R: Send + 'static,
        F: FnOnce(&mut HostContext) -> R + Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        let task: HostTask = Box::new(move |ctx| {
            let _ = reply_tx.send(f(ctx));
        });

        self.tx
            .send(HostMessage::Run(task))
            .map_err(|_| BridgeError::host("host actor has stopped"))?;

        reply_rx
            .await
            .map_err(|_| BridgeError::host("host task failed"))
    }

    /// Record a host change from outside the host
    pub fn mark_change(&self, reason: impl Into<String>) {
        let _ = self.tx.send(HostMessage::Change(reason.into()));
    }

    /// A notifier feeding this actor
    pub fn notifier(&self) -> ChangeNotifier {
        ChangeNotifier {
            tx: self.tx.clone(),
        }
    }

    /// Unpublish and stop the actor after queued work drains
    pub fn shutdown(&self) {
        let _ = self.tx.send(HostMessage::Shutdown);
    }
}

/// Start the host actor thread
///
/// The host receives a [`ChangeNotifier`] before any other call.
pub fn spawn_host_actor(
    mut host: Box<dyn EditorHost>,
    publisher: StatePublisher,
) -> Result<(HostHandle, JoinHandle<()>)> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let handle = HostHandle { tx };
    host.set_change_notifier(handle.notifier());

    let mut ctx = HostContext { host, publisher };

    let join = std::thread::Builder::new()
        .name("host-actor".into())
        .spawn(move || {
            info!("Host actor started");
            while let Some(message) = rx.blocking_recv() {
                match message {
                    HostMessage::Run(task) => {
                        if catch_unwind(AssertUnwindSafe(|| task(&mut ctx))).is_err() {
                            error!("Host task panicked");
                        }
                    }
                    HostMessage::Change(reason) => {
                        debug!("Host change: {}", reason);
                        ctx.mark_change(&reason);
                    }
                    HostMessage::Shutdown => break,
                }
            }
            ctx.publisher.unpublish(ctx.host.as_ref());
            info!("Host actor stopped");
        })?;

    Ok((handle, join))
}

//! Introspection handlers
//!
//! Handles: ping, state, serializeState, notify, content

use tracing::{debug, warn};

use talonbridge_protocol::Command;
use talonbridge_utils::BridgeError;

use super::{HandlerContext, HandlerResult};
use crate::host::Notification;

const DEFAULT_NOTIFICATION_TITLE: &str = "Hello from Talon";
const DEFAULT_NOTIFICATION_BODY: &str = "This is a test notification";

impl HandlerContext {
    pub fn handle_ping(&self) -> String {
        debug!("Received ping");
        "pong".to_string()
    }

    /// Snapshot JSON, built fresh
    pub async fn handle_state(&self) -> HandlerResult {
        let state = self.host.run_and_wait(|ctx| ctx.snapshot()).await?;
        let json = serde_json::to_string(&state).map_err(|e| BridgeError::internal(e.to_string()))?;
        Ok(json)
    }

    /// Force a publish and report where the state went
    pub async fn handle_serialize_state(&self) -> HandlerResult {
        let path = self
            .host
            .run_and_wait(|ctx| ctx.publish())
            .await?
            .ok_or_else(|| BridgeError::host("state was not written"))?;
        Ok(format!("wrote state to {}", path.display()))
    }

    pub async fn handle_notify(&self, command: &Command) -> HandlerResult {
        let title = command.arg(0).unwrap_or(DEFAULT_NOTIFICATION_TITLE).to_string();
        let body = command.arg(1).unwrap_or(DEFAULT_NOTIFICATION_BODY).to_string();
        self.host
            .run_and_wait(move |ctx| ctx.host.notify(Notification::info(title, body)))
            .await?;
        Ok("OK".to_string())
    }

    /// Active document text; empty when no editor is focused
    pub async fn handle_content(&self) -> HandlerResult {
        let text = self
            .host
            .run_and_wait(|ctx| ctx.host.active_editor().and_then(|id| ctx.host.text(id)))
            .await?;
        Ok(text.unwrap_or_else(|| {
            warn!("No editor found");
            String::new()
        }))
    }
}

#[cfg(test)]
mod tests {
    use talonbridge_protocol::OverallState;

    use crate::cursorless::tests::{Fixture, TEST_PID};
    use crate::handlers::tests::{context, run};
    use crate::host::NotificationLevel;

    #[tokio::test]
    async fn test_state_is_snapshot_json() {
        let fx = Fixture::new("hello");
        let ctx = context(&fx);

        let response = run(&ctx, "state", &[]).await;
        let state: OverallState = serde_json::from_str(response.result().unwrap()).unwrap();
        assert_eq!(state.pid, TEST_PID);
        assert_eq!(state.ide_product, "Test IDE");
        assert_eq!(state.active_editor.unwrap().path.as_deref(), Some("/p/a.txt"));
    }

    #[tokio::test]
    async fn test_serialize_state_writes_file() {
        let fx = Fixture::new("hello");
        let ctx = context(&fx);

        let response = run(&ctx, "serializeState", &[]).await;
        let expected = fx.paths.state_file(TEST_PID);
        assert_eq!(
            response.result().unwrap(),
            format!("wrote state to {}", expected.display())
        );
        assert!(expected.exists());
    }

    #[tokio::test]
    async fn test_notify_defaults() {
        let fx = Fixture::new("hello");
        let ctx = context(&fx);

        let response = run(&ctx, "notify", &[]).await;
        assert_eq!(response.result(), Some("OK"));

        let posted = fx.notifications().await;
        let last = posted.last().unwrap();
        assert_eq!(last.level, NotificationLevel::Info);
        assert_eq!(last.title, "Hello from Talon");
        assert_eq!(last.body, "This is a test notification");
    }

    #[tokio::test]
    async fn test_notify_with_args() {
        let fx = Fixture::new("hello");
        let ctx = context(&fx);

        run(&ctx, "notify", &["Build", "done"]).await;
        let posted = fx.notifications().await;
        assert_eq!(posted.last().unwrap().body, "done");
    }

    #[tokio::test]
    async fn test_content() {
        let fx = Fixture::new("line one\nline two");
        let ctx = context(&fx);

        let response = run(&ctx, "content", &[]).await;
        assert_eq!(response.result(), Some("line one\nline two"));
    }
}

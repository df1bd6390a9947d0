//! Handles: cursorless

use talonbridge_protocol::Command;
use tracing::info;

use super::{required, HandlerContext, HandlerResult};
use crate::cursorless::SyncEngine;
use crate::sidecar::UnixSidecar;

impl HandlerContext {
    /// Run a cursorless command through the sync engine
    ///
    /// Sidecar location and tuning are read from the live config on every call.
    pub async fn handle_cursorless(&self, command: &Command) -> HandlerResult {
        let payload = required(command, 0, "payload")?;

        let config = self.config.load_full();
        let sidecar = UnixSidecar::from_config(&config);
        let engine = SyncEngine::new(&sidecar, self.host.clone(), config.sync);

        let outcome = engine.run(payload).await?;
        info!("cursorless finished after {} attempt(s)", outcome.attempts);
        Ok(outcome.result)
    }
}

#[cfg(test)]
mod tests {
    use crate::cursorless::tests::Fixture;
    use crate::handlers::tests::{context, run};

    #[tokio::test]
    async fn test_cursorless_requires_payload() {
        let fx = Fixture::new("hello");
        let ctx = context(&fx);

        let response = run(&ctx, "cursorless", &[]).await;
        assert_eq!(response.error.as_deref(), Some("missing argument: payload"));
    }

    #[tokio::test]
    async fn test_cursorless_without_sidecar_reports_not_ready() {
        let fx = Fixture::new("hello");
        let ctx = context(&fx);

        let response = run(&ctx, "cursorless", &["{}"]).await;
        assert_eq!(
            response.error.as_deref(),
            Some("Sidecar wasn't ready after 2 attempts")
        );
        assert_eq!(fx.text().await, "hello");
    }
}

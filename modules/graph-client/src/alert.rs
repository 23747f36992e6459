// Operator notification seam. The client calls this once per remote error
// before surfacing it; delivery failures never replace the remote error.

use async_trait::async_trait;
use serde_json::Value;
use tracing::error;

#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn notify(&self, payload: &Value, recipients: &[String]) -> anyhow::Result<()>;
}

/// Writes the alert to the log. Used when no mail relay is configured.
pub struct LogAlertSink;

#[async_trait]
impl AlertSink for LogAlertSink {
    async fn notify(&self, payload: &Value, recipients: &[String]) -> anyhow::Result<()> {
        error!(%payload, ?recipients, "Graph API returned an error");
        Ok(())
    }
}

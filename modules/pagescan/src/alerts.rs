use async_trait::async_trait;
use graph_client::AlertSink;
use mail_alert::MailAlertService;
use serde_json::Value;

/// Routes Graph API error documents to operators by email.
pub struct MailAlertSink {
    service: MailAlertService,
}

impl MailAlertSink {
    pub fn new(service: MailAlertService) -> Self {
        Self { service }
    }
}

#[async_trait]
impl AlertSink for MailAlertSink {
    async fn notify(&self, payload: &Value, recipients: &[String]) -> anyhow::Result<()> {
        self.service.send_alert(payload, recipients).await?;
        Ok(())
    }
}

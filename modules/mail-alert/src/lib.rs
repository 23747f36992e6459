// Plain-text operator alerts over SMTP (STARTTLS relay).

use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

/// Subject line operators filter on ("FB API failure notice").
pub const ALERT_SUBJECT: &str = "FB api 異常通知";

pub type Result<T> = std::result::Result<T, MailAlertError>;

#[derive(Debug, Error)]
pub enum MailAlertError {
    #[error("No valid alert recipients")]
    NoRecipients,

    #[error("Invalid address: {0}")]
    Address(String),

    #[error("Could not build message: {0}")]
    Message(String),

    #[error("SMTP error: {0}")]
    Smtp(String),
}

impl From<lettre::transport::smtp::Error> for MailAlertError {
    fn from(err: lettre::transport::smtp::Error) -> Self {
        MailAlertError::Smtp(err.to_string())
    }
}

impl From<lettre::error::Error> for MailAlertError {
    fn from(err: lettre::error::Error) -> Self {
        MailAlertError::Message(err.to_string())
    }
}

/// Check if a string looks like an email address
fn is_email(identifier: &str) -> bool {
    identifier.contains('@') && identifier.contains('.')
}

/// Keep recipients that parse as mailboxes; warn about the rest.
fn valid_recipients(recipients: &[String]) -> Vec<Mailbox> {
    recipients
        .iter()
        .map(|r| r.trim())
        .filter(|r| !r.is_empty())
        .filter_map(|r| {
            if !is_email(r) {
                warn!(recipient = r, "Skipping alert recipient: not an email address");
                return None;
            }
            match r.parse::<Mailbox>() {
                Ok(mailbox) => Some(mailbox),
                Err(e) => {
                    warn!(recipient = r, error = %e, "Skipping alert recipient");
                    None
                }
            }
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct MailAlertOptions {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub username: String,
    pub password: String,
    pub from_name: String,
    pub from_address: String,
}

#[derive(Debug, Clone)]
pub struct MailAlertService {
    options: MailAlertOptions,
}

impl MailAlertService {
    pub fn new(options: MailAlertOptions) -> Self {
        Self { options }
    }

    /// Build the alert message for `payload` addressed to `recipients`.
    pub fn compose(&self, payload: &Value, recipients: &[String]) -> Result<Message> {
        let to = valid_recipients(recipients);
        if to.is_empty() {
            return Err(MailAlertError::NoRecipients);
        }

        let from_address = self
            .options
            .from_address
            .parse()
            .map_err(|e| MailAlertError::Address(format!("{}: {e}", self.options.from_address)))?;
        let from = Mailbox::new(Some(self.options.from_name.clone()), from_address);

        let mut builder = Message::builder()
            .from(from)
            .subject(ALERT_SUBJECT)
            .header(ContentType::TEXT_PLAIN);
        for mailbox in to {
            builder = builder.to(mailbox);
        }

        let body = serde_json::to_string_pretty(payload).unwrap_or_else(|_| payload.to_string());
        Ok(builder.body(body)?)
    }

    /// Send one alert email carrying the full error payload.
    pub async fn send_alert(&self, payload: &Value, recipients: &[String]) -> Result<()> {
        let message = self.compose(payload, recipients)?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.options.smtp_host)?
            .port(self.options.smtp_port)
            .credentials(Credentials::new(
                self.options.username.clone(),
                self.options.password.clone(),
            ))
            .build();

        transport.send(message).await?;
        info!(recipients = recipients.len(), "Operator alert sent");
        Ok(())
    }
}

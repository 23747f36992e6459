pub mod alerts;
pub mod config;

pub use alerts::MailAlertSink;
pub use config::{Config, SmtpConfig};

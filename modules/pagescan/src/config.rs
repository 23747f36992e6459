use std::fmt;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono_tz::Tz;
use graph_client::civil_time::{parse_timezone, DEFAULT_TIMEZONE};
use graph_client::{GraphClientConfig, DEFAULT_PAGE_BUDGET};
use tracing::info;

const DEFAULT_BASE_URL: &str = "https://graph.facebook.com";
const DEFAULT_API_VERSION: &str = "v19.0";
const DEFAULT_SNAPSHOT_PATH: &str = "snapshot.json";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
const DEFAULT_SMTP_PORT: u16 = 587;

/// Mail relay settings. Present only when `SMTP_HOST` is set.
#[derive(Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_address: String,
}

/// Application configuration loaded from environment variables (and `.env`).
#[derive(Clone)]
pub struct Config {
    // Graph API
    pub access_token: String,
    pub base_url: String,
    pub api_version: String,
    pub http_timeout_secs: u64,

    // Scan
    pub timezone: Tz,
    pub page_budget: u32,
    pub snapshot_path: PathBuf,

    // Alerts
    pub alert_recipients: Vec<String>,
    pub smtp: Option<SmtpConfig>,
}

impl Config {
    /// Full config for a scan. `FB_ACCESS_TOKEN` is required.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok(), true)
    }

    /// Config for reading snapshots only; no token needed.
    pub fn snapshot_from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok(), false)
    }

    pub fn from_lookup<F>(lookup: F, require_token: bool) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let access_token = match var("FB_ACCESS_TOKEN") {
            Some(token) => token,
            None if require_token => {
                anyhow::bail!("FB_ACCESS_TOKEN environment variable is required")
            }
            None => String::new(),
        };

        let timezone = parse_timezone(
            &var("PAGESCAN_TIMEZONE").unwrap_or_else(|| DEFAULT_TIMEZONE.to_string()),
        )?;

        let page_budget = match var("PAGESCAN_PAGE_BUDGET") {
            Some(v) => v.parse().context("PAGESCAN_PAGE_BUDGET must be a number")?,
            None => DEFAULT_PAGE_BUDGET,
        };

        let http_timeout_secs = match var("PAGESCAN_HTTP_TIMEOUT_SECS") {
            Some(v) => v
                .parse()
                .context("PAGESCAN_HTTP_TIMEOUT_SECS must be a number")?,
            None => DEFAULT_HTTP_TIMEOUT_SECS,
        };

        let alert_recipients = var("ALERT_RECIPIENTS")
            .map(|v| {
                v.split(',')
                    .map(|r| r.trim().to_string())
                    .filter(|r| !r.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let smtp = match var("SMTP_HOST") {
            Some(host) => {
                let username = var("SMTP_USERNAME")
                    .context("SMTP_USERNAME is required when SMTP_HOST is set")?;
                let password = var("SMTP_PASSWORD")
                    .context("SMTP_PASSWORD is required when SMTP_HOST is set")?;
                let port = match var("SMTP_PORT") {
                    Some(v) => v.parse().context("SMTP_PORT must be a number")?,
                    None => DEFAULT_SMTP_PORT,
                };
                Some(SmtpConfig {
                    host,
                    port,
                    from_address: var("SMTP_FROM").unwrap_or_else(|| username.clone()),
                    username,
                    password,
                })
            }
            None => None,
        };

        Ok(Self {
            access_token,
            base_url: var("FB_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_version: var("FB_API_VERSION").unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            http_timeout_secs,
            timezone,
            page_budget,
            snapshot_path: var("PAGESCAN_SNAPSHOT_PATH")
                .unwrap_or_else(|| DEFAULT_SNAPSHOT_PATH.to_string())
                .into(),
            alert_recipients,
            smtp,
        })
    }

    pub fn graph_client_config(&self) -> GraphClientConfig {
        GraphClientConfig {
            base_url: self.base_url.clone(),
            api_version: self.api_version.clone(),
            access_token: self.access_token.clone(),
            recipients: self.alert_recipients.clone(),
            timezone: self.timezone,
        }
    }

    /// Log the effective configuration with secrets masked.
    pub fn log_redacted(&self) {
        info!(
            base_url = self.base_url.as_str(),
            api_version = self.api_version.as_str(),
            access_token = redact(&self.access_token).as_str(),
            timezone = %self.timezone,
            page_budget = self.page_budget,
            snapshot_path = %self.snapshot_path.display(),
            alert_recipients = self.alert_recipients.len(),
            smtp_host = self.smtp.as_ref().map(|s| s.host.as_str()).unwrap_or("-"),
            "Configuration loaded"
        );
    }
}

// Debug output masks credentials, like `log_redacted`.
impl fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &redact(&self.password))
            .field("from_address", &self.from_address)
            .finish()
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("access_token", &redact(&self.access_token))
            .field("base_url", &self.base_url)
            .field("api_version", &self.api_version)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("timezone", &self.timezone)
            .field("page_budget", &self.page_budget)
            .field("snapshot_path", &self.snapshot_path)
            .field("alert_recipients", &self.alert_recipients)
            .field("smtp", &self.smtp)
            .finish()
    }
}

fn redact(secret: &str) -> String {
    if secret.is_empty() {
        return "-".to_string();
    }
    let visible: String = secret.chars().take(4).collect();
    format!("{visible}***")
}

// Transport seam: "fetch URL, return body text".

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// reqwest-backed transport.
///
/// Non-2xx bodies are returned as-is: the Graph API reports failures as a
/// JSON body with an `error` member, which the client escalates after decoding.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, url: &str) -> Result<String> {
        let resp = self.client.get(url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), "Non-success status from Graph API");
        }

        Ok(resp.text().await?)
    }
}

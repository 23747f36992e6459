// Test mocks for the two client seams:
// - MockTransport (Transport): URL→body map that records every fetch
// - MockAlertSink (AlertSink): records notifications, optionally fails them

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::alert::AlertSink;
use crate::error::{GraphError, Result};
use crate::transport::Transport;

/// Canned responses keyed by URL. A request matches its exact URL first,
/// then the URL with the query string removed, so endpoints can be
/// registered without the token and field list.
pub struct MockTransport {
    responses: HashMap<String, String>,
    fetched: Mutex<Vec<String>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            responses: HashMap::new(),
            fetched: Mutex::new(Vec::new()),
        }
    }

    pub fn on(mut self, url: &str, body: Value) -> Self {
        self.responses.insert(url.to_string(), body.to_string());
        self
    }

    pub fn on_raw(mut self, url: &str, body: &str) -> Self {
        self.responses.insert(url.to_string(), body.to_string());
        self
    }

    /// Every URL requested so far, in order.
    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetched.lock().unwrap().len()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn fetch(&self, url: &str) -> Result<String> {
        self.fetched.lock().unwrap().push(url.to_string());
        let bare = url.split('?').next().unwrap_or(url);
        self.responses
            .get(url)
            .or_else(|| self.responses.get(bare))
            .cloned()
            .ok_or_else(|| GraphError::Transport(format!("MockTransport: nothing registered for {url}")))
    }
}

/// Records `notify()` calls for test assertions.
pub struct MockAlertSink {
    calls: Mutex<Vec<(Value, Vec<String>)>>,
    fail: bool,
}

impl MockAlertSink {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    /// A sink whose deliveries always fail (after being recorded).
    pub fn failing() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn calls(&self) -> Vec<(Value, Vec<String>)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockAlertSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AlertSink for MockAlertSink {
    async fn notify(&self, payload: &Value, recipients: &[String]) -> anyhow::Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push((payload.clone(), recipients.to_vec()));
        if self.fail {
            anyhow::bail!("MockAlertSink: delivery failed");
        }
        Ok(())
    }
}

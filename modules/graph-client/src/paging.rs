// Checked fetches and the cursor walk over `paging.next` links.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, warn};

use crate::alert::AlertSink;
use crate::document;
use crate::error::{GraphError, Result};
use crate::transport::Transport;
use crate::types::Account;

/// Pages followed after the first one unless the caller asks otherwise.
pub const DEFAULT_PAGE_BUDGET: u32 = 5;

pub(crate) struct PageFetcher {
    transport: Arc<dyn Transport>,
    alerts: Arc<dyn AlertSink>,
    recipients: Vec<String>,
}

impl PageFetcher {
    pub(crate) fn new(
        transport: Arc<dyn Transport>,
        alerts: Arc<dyn AlertSink>,
        recipients: Vec<String>,
    ) -> Self {
        Self {
            transport,
            alerts,
            recipients,
        }
    }

    /// Fetch and decode one document. An `error` member notifies the
    /// operator once and aborts with `RemoteApi`.
    pub(crate) async fn fetch_document(&self, url: &str) -> Result<Value> {
        let raw = self.transport.fetch(url).await?;
        let doc = document::decode(&raw)?;

        if document::error_marker(&doc).is_some() {
            error!(endpoint = strip_query(url), "Graph API returned an error document");
            if let Err(e) = self.alerts.notify(&doc, &self.recipients).await {
                warn!(error = %e, "Operator notification failed");
            }
            return Err(GraphError::RemoteApi { payload: doc });
        }

        Ok(doc)
    }

    /// Follow `next` links, handing each page's items to `mapper`, until the
    /// cursor runs out or `budget` pages have been fetched. A zero budget
    /// stops before fetching even when a link is pending. Returns the number
    /// of pages fetched.
    pub(crate) async fn walk<F>(
        &self,
        owner: &mut Account,
        mut next: Option<String>,
        budget: u32,
        mut mapper: F,
    ) -> Result<u32>
    where
        F: FnMut(&mut Account, &[Value]),
    {
        let mut remaining = budget;
        let mut fetched = 0;

        while remaining > 0 {
            let Some(link) = next.take() else {
                break;
            };

            let page = self.fetch_document(&link).await?;
            mapper(&mut *owner, document::items(&page));
            next = document::next_link(&page);
            remaining -= 1;
            fetched += 1;
        }

        if next.is_some() {
            debug!(fetched, budget, "Page budget exhausted with more pages available");
        }

        Ok(fetched)
    }
}

/// Endpoint without the query string, which carries the access token.
pub(crate) fn strip_query(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}

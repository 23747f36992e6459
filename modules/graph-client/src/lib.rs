pub mod alert;
pub mod civil_time;
pub mod document;
pub mod error;
mod paging;
pub mod snapshot;
pub mod testing;
pub mod transport;
pub mod types;

pub use alert::{AlertSink, LogAlertSink};
pub use error::{GraphError, Result};
pub use paging::DEFAULT_PAGE_BUDGET;
pub use snapshot::{JsonFileStore, Snapshot, SnapshotStore};
pub use transport::{HttpTransport, Transport};
pub use types::{Account, FlatDocument, Post, StoryPost};

use std::sync::Arc;

use chrono_tz::Tz;
use tracing::{debug, info, warn};

use paging::{strip_query, PageFetcher};

const BASE_URL: &str = "https://graph.facebook.com";

const DEFAULT_API_VERSION: &str = "v19.0";

const ACCOUNT_FIELDS: &str = "access_token,name,id,instagram_business_account";

const VIDEO_FIELDS: &str = "videos{id,created_time,description,views,comments.summary(1),likes.summary(1),video_insights}";

const MEDIA_FIELDS: &str = "media{insights.metric(impressions,reach,engagement,saved,video_views,likes,comments,shares,plays,total_interactions),media_type,timestamp,caption}";

#[derive(Debug, Clone)]
pub struct GraphClientConfig {
    pub base_url: String,
    pub api_version: String,
    /// User token used for every request, including per-account listings.
    pub access_token: String,
    /// Operators notified when the API returns an error document.
    pub recipients: Vec<String>,
    /// Civil timezone all timestamps are normalized into.
    pub timezone: Tz,
}

impl GraphClientConfig {
    pub fn new(access_token: String) -> Self {
        Self {
            base_url: BASE_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            access_token,
            recipients: Vec::new(),
            timezone: chrono_tz::Asia::Taipei,
        }
    }

    fn endpoint(&self, path: &str, fields: &str) -> String {
        format!(
            "{}/{}/{}?access_token={}&fields={}",
            self.base_url.trim_end_matches('/'),
            self.api_version,
            path,
            self.access_token,
            fields
        )
    }
}

/// Per-account listings walked after the account directory is loaded.
#[derive(Debug, Clone, Copy)]
enum Listing {
    /// Page videos, keyed by the page id.
    Videos,
    /// Instagram media, keyed by the linked business account id.
    Media,
}

impl Listing {
    fn subtree(self) -> &'static str {
        match self {
            Listing::Videos => "videos",
            Listing::Media => "media",
        }
    }

    fn fields(self) -> &'static str {
        match self {
            Listing::Videos => VIDEO_FIELDS,
            Listing::Media => MEDIA_FIELDS,
        }
    }

    fn node_id(self, account: &Account) -> Option<String> {
        match self {
            Listing::Videos => account.id.clone(),
            Listing::Media => account.ig_id.clone(),
        }
    }

    fn map(self, account: &mut Account, items: &[serde_json::Value], tz: Tz) {
        match self {
            Listing::Videos => types::map_video_page(account, items, tz),
            Listing::Media => types::map_media_page(account, items, tz),
        }
    }
}

/// Graph API client that owns the fetched account tree.
///
/// Calls are sequential. Fetches append: running the same fetch twice
/// duplicates records unless `reset()` is called in between.
pub struct GraphClient {
    config: GraphClientConfig,
    fetcher: PageFetcher,
    accounts: Vec<Account>,
}

impl GraphClient {
    pub fn new(
        config: GraphClientConfig,
        transport: Arc<dyn Transport>,
        alerts: Arc<dyn AlertSink>,
    ) -> Self {
        let fetcher = PageFetcher::new(transport, alerts, config.recipients.clone());
        Self {
            config,
            fetcher,
            accounts: Vec::new(),
        }
    }

    pub fn config(&self) -> &GraphClientConfig {
        &self.config
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    pub fn accounts_mut(&mut self) -> &mut Vec<Account> {
        &mut self.accounts
    }

    pub fn into_accounts(self) -> Vec<Account> {
        self.accounts
    }

    /// Drop every account and the posts fetched for them.
    pub fn reset(&mut self) {
        self.accounts.clear();
    }

    /// Load the accounts of `snapshot` in order, replacing the current set.
    pub fn restore(&mut self, snapshot: Snapshot) {
        self.accounts = snapshot.into_accounts();
    }

    /// Capture the current account tree.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(&self.accounts, self.config.timezone)
    }

    /// Load the page directory (`me/accounts`) and append one `Account` per entry.
    pub async fn fetch_accounts(&mut self) -> Result<&[Account]> {
        let url = self.config.endpoint("me/accounts", ACCOUNT_FIELDS);
        info!(endpoint = strip_query(&url), "Fetching account directory");

        let response = self.fetcher.fetch_document(&url).await?;
        let before = self.accounts.len();
        self.accounts.extend(
            document::items(&response)
                .iter()
                .map(Account::from_graph),
        );

        info!(count = self.accounts.len() - before, "Fetched accounts");
        Ok(&self.accounts)
    }

    /// Fetch video posts for every account: the first page plus up to
    /// `page_budget` further pages.
    pub async fn fetch_video_posts(&mut self, page_budget: u32) -> Result<&[Account]> {
        self.fetch_listing(Listing::Videos, page_budget).await?;
        Ok(&self.accounts)
    }

    /// Fetch Instagram media for every account with a linked business account.
    pub async fn fetch_story_posts(&mut self, page_budget: u32) -> Result<&[Account]> {
        self.fetch_listing(Listing::Media, page_budget).await?;
        Ok(&self.accounts)
    }

    async fn fetch_listing(&mut self, listing: Listing, page_budget: u32) -> Result<()> {
        let tz = self.config.timezone;

        if self.accounts.is_empty() {
            warn!(
                listing = listing.subtree(),
                "No accounts loaded; call fetch_accounts() or restore() first"
            );
        }

        for account in self.accounts.iter_mut() {
            let Some(node_id) = listing.node_id(account) else {
                debug!(
                    account_id = account.id.as_deref().unwrap_or("-"),
                    listing = listing.subtree(),
                    "No node id for listing, skipping account"
                );
                continue;
            };

            let url = self.config.endpoint(&node_id, listing.fields());
            let response = self.fetcher.fetch_document(&url).await?;

            let Some(first_page) = document::present(&response, listing.subtree()) else {
                debug!(
                    node_id = node_id.as_str(),
                    listing = listing.subtree(),
                    "Response has no listing subtree, nothing to process"
                );
                continue;
            };

            listing.map(account, document::items(first_page), tz);
            let pages = self
                .fetcher
                .walk(
                    account,
                    document::next_link(first_page),
                    page_budget,
                    |owner, items| listing.map(owner, items, tz),
                )
                .await?;

            info!(
                node_id = node_id.as_str(),
                listing = listing.subtree(),
                posts = account.posts.len(),
                ig_posts = account.ig_posts.len(),
                extra_pages = pages,
                "Fetched listing"
            );
        }

        Ok(())
    }
}

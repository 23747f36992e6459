// Snapshot codec and persistence.
//
// Layout:
//   { "scan_time": "...", "data": [ { "id", "access_token", "name", "ig_id",
//                                     "posts": [...], "ig_posts": [...] } ] }

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::civil_time;
use crate::error::Result;
use crate::types::{null_as_default, Account, FlatDocument};

/// Every account, with its posts, at a point in time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    #[serde(deserialize_with = "null_as_default")]
    pub scan_time: String,
    #[serde(deserialize_with = "null_as_default")]
    pub data: Vec<Account>,
}

impl Snapshot {
    /// Capture `accounts` stamped with the current time in `tz`.
    pub fn capture(accounts: &[Account], tz: Tz) -> Self {
        Self {
            scan_time: civil_time::now_in(tz),
            data: accounts.to_vec(),
        }
    }

    pub fn accounts(&self) -> &[Account] {
        &self.data
    }

    pub fn into_accounts(self) -> Vec<Account> {
        self.data
    }
}

impl FlatDocument for Snapshot {}

#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn save(&self, snapshot: &Snapshot) -> Result<()>;
    async fn load(&self) -> Result<Snapshot>;
}

/// Pretty-printed JSON file on local disk.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SnapshotStore for JsonFileStore {
    async fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let body = serde_json::to_string_pretty(&snapshot.to_document()?)?;
        tokio::fs::write(&self.path, body).await?;
        info!(
            path = %self.path.display(),
            accounts = snapshot.data.len(),
            "Snapshot saved"
        );
        Ok(())
    }

    async fn load(&self) -> Result<Snapshot> {
        let raw = tokio::fs::read_to_string(&self.path).await?;
        let doc = crate::document::decode(&raw)?;
        let snapshot = Snapshot::from_document(&doc)?;
        info!(
            path = %self.path.display(),
            scan_time = snapshot.scan_time.as_str(),
            accounts = snapshot.data.len(),
            "Snapshot loaded"
        );
        Ok(snapshot)
    }
}

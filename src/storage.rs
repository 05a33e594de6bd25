//! Best-effort persistence of the last analysis.
//!
//! Exactly one snapshot lives under [`SNAPSHOT_KEY`]. Every failure here is
//! logged and swallowed: persistence must never interrupt an analysis.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Local;
use log::{error, info, warn};

use crate::db::Database;
use crate::models::{SnapshotDraft, StoredSnapshot, UPLOAD_DATE_FORMAT};

pub const SNAPSHOT_KEY: &str = "visualForensicsTutor_lastAnalysis";

/// String key → string value storage.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: String) -> Result<()>;
    async fn remove(&self, key: &str) -> Result<()>;
}

#[async_trait]
impl KeyValueStore for Database {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.get_value(key).await
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        self.set_value(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.delete_value(key).await.map(|_| ())
    }
}

#[derive(Clone)]
pub struct SnapshotStore {
    kv: Arc<dyn KeyValueStore>,
}

impl SnapshotStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Stamp the current local time onto `draft` and write it.
    pub async fn save(&self, draft: SnapshotDraft) {
        let upload_date = Local::now().format(UPLOAD_DATE_FORMAT).to_string();
        let snapshot = StoredSnapshot::stamp(draft, upload_date);

        let serialized = match serde_json::to_string(&snapshot) {
            Ok(serialized) => serialized,
            Err(err) => {
                error!("Failed to serialize analysis snapshot: {err}");
                return;
            }
        };

        match self.kv.set(SNAPSHOT_KEY, serialized).await {
            Ok(()) => info!("Saved analysis snapshot ({})", snapshot.upload_date),
            Err(err) => error!("Failed to save analysis snapshot: {err:#}"),
        }
    }

    /// The stored snapshot, or `None` when absent, unreadable or malformed.
    pub async fn load(&self) -> Option<StoredSnapshot> {
        let raw = match self.kv.get(SNAPSHOT_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                error!("Failed to load analysis snapshot: {err:#}");
                return None;
            }
        };

        match serde_json::from_str::<StoredSnapshot>(&raw) {
            Ok(snapshot) => Some(snapshot),
            Err(err) => {
                warn!("Ignoring malformed analysis snapshot: {err}");
                None
            }
        }
    }

    pub async fn clear(&self) {
        if let Err(err) = self.kv.remove(SNAPSHOT_KEY).await {
            error!("Failed to clear analysis snapshot: {err:#}");
        }
    }
}

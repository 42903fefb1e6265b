//! Time-based cache of loaded period snapshots.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::debug;

use crate::models::TimeWindowSnapshot;
use crate::storage::LoadError;

struct CachedSnapshot {
    loaded_at: Instant,
    snapshot: Arc<TimeWindowSnapshot>,
}

/// Period key → most recently loaded snapshot, valid for `ttl`.
///
/// Expired entries are reloaded on the next request. A failed load is not
/// cached.
pub struct SnapshotCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, CachedSnapshot>>,
}

impl SnapshotCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// A fresh cached snapshot, if any.
    pub async fn get(&self, key: &str) -> Option<Arc<TimeWindowSnapshot>> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| entry.loaded_at.elapsed() < self.ttl)
            .map(|entry| Arc::clone(&entry.snapshot))
    }

    /// Store a snapshot, replacing any previous entry.
    pub async fn insert(&self, key: &str, snapshot: TimeWindowSnapshot) -> Arc<TimeWindowSnapshot> {
        let snapshot = Arc::new(snapshot);
        self.entries.write().await.insert(
            key.to_string(),
            CachedSnapshot {
                loaded_at: Instant::now(),
                snapshot: Arc::clone(&snapshot),
            },
        );
        snapshot
    }

    /// Return the cached snapshot for `key`, or run `load` and cache its result.
    pub async fn get_or_load<F>(&self, key: &str, load: F) -> Result<Arc<TimeWindowSnapshot>, LoadError>
    where
        F: FnOnce() -> Result<TimeWindowSnapshot, LoadError>,
    {
        if let Some(snapshot) = self.get(key).await {
            debug!("Snapshot cache hit: {}", key);
            return Ok(snapshot);
        }

        debug!("Snapshot cache miss: {}", key);
        let snapshot = load()?;
        Ok(self.insert(key, snapshot).await)
    }

    /// Drop one entry.
    pub async fn invalidate(&self, key: &str) {
        self.entries.write().await.remove(key);
    }

    /// Drop every entry.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    /// Number of entries, fresh or not.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

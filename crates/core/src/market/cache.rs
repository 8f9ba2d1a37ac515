use crate::domain::market::MarketSnapshot;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct CacheEntry {
    snapshot: MarketSnapshot,
    expires_at: DateTime<Utc>,
}

/// Symbol -> snapshot cache with a fixed TTL. Expired entries are ignored, never evicted.
#[derive(Debug)]
pub struct SnapshotCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl SnapshotCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub async fn get(&self, symbol: &str, now: DateTime<Utc>) -> Option<MarketSnapshot> {
        let entries = self.entries.read().await;
        entries
            .get(symbol)
            .filter(|e| now <= e.expires_at)
            .map(|e| e.snapshot.clone())
    }

    pub async fn insert(&self, symbol: &str, snapshot: MarketSnapshot, now: DateTime<Utc>) {
        let mut entries = self.entries.write().await;
        entries.insert(
            symbol.to_string(),
            CacheEntry {
                snapshot,
                expires_at: now
                    .checked_add_signed(self.ttl)
                    .unwrap_or(DateTime::<Utc>::MAX_UTC),
            },
        );
    }
}

pub mod batch;
pub mod cache;
pub mod error;
pub mod finnhub;

use crate::domain::market::MarketSnapshot;
use std::collections::{BTreeSet, HashMap};

/// Per-symbol market data lookup.
#[async_trait::async_trait]
pub trait MarketDataClient: Send + Sync {
    fn provider_name(&self) -> &'static str;

    /// `Ok(None)` means the provider has no data for the symbol.
    async fn fetch_snapshot(&self, symbol: &str) -> anyhow::Result<Option<MarketSnapshot>>;
}

/// Batch lookup used by the recommendation service.
///
/// Never fails: tickers that cannot be resolved are simply missing from the map.
#[async_trait::async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn fetch_batch(&self, tickers: &BTreeSet<String>) -> HashMap<String, MarketSnapshot>;
}

use crate::config::EngineOptions;
use crate::domain::market::MarketSnapshot;
use crate::market::{MarketDataClient, MarketDataSource};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

enum Outcome {
    Found(MarketSnapshot),
    Missing,
    Failed(anyhow::Error),
    TimedOut,
}

/// Fans out one lookup per ticker with at most `max_concurrent` in flight.
///
/// Results are merged by the joining task only, so the map is never shared between tasks.
#[derive(Clone)]
pub struct BatchEnricher {
    client: Arc<dyn MarketDataClient>,
    max_concurrent: usize,
    call_timeout: Duration,
}

impl BatchEnricher {
    pub fn new(client: Arc<dyn MarketDataClient>, options: &EngineOptions) -> Self {
        Self {
            client,
            max_concurrent: options.max_concurrent.max(1),
            call_timeout: options.call_timeout,
        }
    }
}

#[async_trait::async_trait]
impl MarketDataSource for BatchEnricher {
    async fn fetch_batch(&self, tickers: &BTreeSet<String>) -> HashMap<String, MarketSnapshot> {
        let provider = self.client.provider_name();
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut tasks = JoinSet::new();

        for ticker in tickers {
            let client = Arc::clone(&self.client);
            let semaphore = Arc::clone(&semaphore);
            let ticker = ticker.clone();
            let call_timeout = self.call_timeout;

            tasks.spawn(async move {
                // The semaphore is never closed.
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return (ticker, Outcome::Missing);
                };
                let outcome =
                    match tokio::time::timeout(call_timeout, client.fetch_snapshot(&ticker)).await {
                        Ok(Ok(Some(snapshot))) => Outcome::Found(snapshot),
                        Ok(Ok(None)) => Outcome::Missing,
                        Ok(Err(err)) => Outcome::Failed(err),
                        Err(_) => Outcome::TimedOut,
                    };
                (ticker, outcome)
            });
        }

        let mut results = HashMap::with_capacity(tickers.len());
        let mut failures = 0usize;

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((ticker, Outcome::Found(snapshot))) => {
                    results.insert(ticker, snapshot);
                }
                Ok((_, Outcome::Missing)) => {}
                Ok((ticker, Outcome::Failed(err))) => {
                    failures += 1;
                    tracing::warn!(
                        provider,
                        %ticker,
                        error = %err,
                        "market data lookup failed; using fallback weights"
                    );
                }
                Ok((ticker, Outcome::TimedOut)) => {
                    failures += 1;
                    tracing::warn!(
                        provider,
                        %ticker,
                        timeout = ?self.call_timeout,
                        "market data lookup timed out; using fallback weights"
                    );
                }
                Err(err) => {
                    failures += 1;
                    tracing::error!(provider, error = %err, "market data task failed");
                }
            }
        }

        tracing::info!(
            provider,
            requested = tickers.len(),
            resolved = results.len(),
            failures,
            "market data batch complete"
        );
        results
    }
}

use crate::config::EngineOptions;
use crate::domain::rating::{RatingFilter, SortField, SortOrder};
use crate::domain::recommendation::Recommendation;
use crate::market::MarketDataSource;
use crate::scoring::{self, rank, LookupTables};
use crate::source::RatingSource;
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Ranks the most attractive tickers from recent analyst rating actions.
pub struct RecommendationService<S> {
    source: S,
    market: Option<Arc<dyn MarketDataSource>>,
    options: EngineOptions,
    tables: &'static LookupTables,
}

impl<S: RatingSource> RecommendationService<S> {
    pub fn new(
        source: S,
        market: Option<Arc<dyn MarketDataSource>>,
        options: EngineOptions,
    ) -> Self {
        Self {
            source,
            market,
            options,
            tables: LookupTables::global(),
        }
    }

    pub async fn top_recommendations(
        &self,
        limit: Option<i64>,
        search: Option<&str>,
    ) -> anyhow::Result<Vec<Recommendation>> {
        self.top_recommendations_at(Utc::now(), limit, search).await
    }

    /// Same as [`Self::top_recommendations`] with an explicit clock for momentum decay.
    pub async fn top_recommendations_at(
        &self,
        now: DateTime<Utc>,
        limit: Option<i64>,
        search: Option<&str>,
    ) -> anyhow::Result<Vec<Recommendation>> {
        let limit = rank::clamp_limit(limit);

        let filter = RatingFilter {
            search: search.map(str::to_string).filter(|s| !s.trim().is_empty()),
            sort_by: SortField::CreatedAt,
            sort_order: SortOrder::Desc,
            page: 1,
            limit: self.options.fetch_limit,
            ..Default::default()
        };

        let page = self.source.find_all(&filter).await?;
        if page.records.is_empty() {
            return Ok(Vec::new());
        }

        let snapshots = match &self.market {
            Some(market) => {
                let tickers: BTreeSet<String> =
                    page.records.iter().map(|r| r.ticker.clone()).collect();
                market.fetch_batch(&tickers).await
            }
            None => HashMap::new(),
        };

        let mut ranked = scoring::recommend(&page.records, &snapshots, now, self.tables);
        ranked.truncate(limit);
        Ok(ranked)
    }

    pub async fn best_recommendation(&self) -> anyhow::Result<Option<Recommendation>> {
        self.best_recommendation_at(Utc::now()).await
    }

    pub async fn best_recommendation_at(
        &self,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Option<Recommendation>> {
        let top = self.top_recommendations_at(now, Some(1), None).await?;
        Ok(top.into_iter().next())
    }
}

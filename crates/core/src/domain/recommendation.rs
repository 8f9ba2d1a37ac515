use crate::domain::market::MarketSnapshot;
use crate::domain::rating::RatingAction;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    /// Best-representative record of the ticker group.
    pub rating: RatingAction,
    pub composite_score: f64,
    pub reasons: Vec<String>,
    pub upside_potential: f64,
    pub analyst_count: usize,
    pub market_snapshot: Option<MarketSnapshot>,
}

impl Recommendation {
    pub fn ticker(&self) -> &str {
        &self.rating.ticker
    }
}

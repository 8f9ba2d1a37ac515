use serde::{Deserialize, Serialize};

/// Live quote and profile data for one ticker. Best-effort; absence is a normal state.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSnapshot {
    pub current_price: f64,
    pub day_change: f64,
    pub day_change_percent: f64,
    pub day_high: f64,
    pub day_low: f64,
    pub previous_close: f64,
    /// In millions of the listing currency.
    pub market_capitalization: f64,
    pub industry: String,
}

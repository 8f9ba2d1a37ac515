use std::fmt;

#[derive(Debug, Clone)]
pub struct MarketDataError {
    pub provider: &'static str,
    pub symbol: String,
    pub stage: &'static str,
    pub detail: String,
}

impl MarketDataError {
    pub fn new(
        provider: &'static str,
        symbol: &str,
        stage: &'static str,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            symbol: symbol.to_string(),
            stage,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for MarketDataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "market data error (provider={}, symbol={}, stage={}): {}",
            self.provider, self.symbol, self.stage, self.detail
        )
    }
}

impl std::error::Error for MarketDataError {}

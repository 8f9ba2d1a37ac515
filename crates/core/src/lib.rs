pub mod domain;
pub mod market;
pub mod scoring;
pub mod service;
pub mod source;

pub mod config {
    use anyhow::Context;
    use std::time::Duration;

    const DEFAULT_FINNHUB_BASE_URL: &str = "https://finnhub.io/api/v1";
    const MAX_CACHE_TTL_SECS: i64 = 24 * 60 * 60;
    const MAX_RETRIES: u32 = 5;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub finnhub_api_key: Option<String>,
        pub finnhub_base_url: String,
        pub sentry_dsn: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                finnhub_api_key: non_empty_var("FINNHUB_API_KEY"),
                finnhub_base_url: non_empty_var("FINNHUB_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_FINNHUB_BASE_URL.to_string()),
                sentry_dsn: non_empty_var("SENTRY_DSN"),
            })
        }

        pub fn require_finnhub_api_key(&self) -> anyhow::Result<&str> {
            self.finnhub_api_key
                .as_deref()
                .context("FINNHUB_API_KEY is required")
        }
    }

    /// Tunables for the ranking pass and market data enrichment.
    #[derive(Debug, Clone)]
    pub struct EngineOptions {
        /// Records requested from the rating source per ranking call.
        pub fetch_limit: i64,
        pub max_concurrent: usize,
        pub call_timeout: Duration,
        pub cache_ttl: chrono::Duration,
        /// Attempts per market data HTTP request.
        pub retries: u32,
    }

    impl Default for EngineOptions {
        fn default() -> Self {
            Self {
                fetch_limit: 500,
                max_concurrent: 10,
                call_timeout: Duration::from_secs(10),
                cache_ttl: chrono::Duration::minutes(15),
                retries: 2,
            }
        }
    }

    impl EngineOptions {
        pub fn from_env() -> Self {
            let mut out = Self::default();

            if let Some(n) = parse_var::<i64>("RECOMMENDATION_FETCH_LIMIT").filter(|n| *n >= 1) {
                out.fetch_limit = n;
            }

            if let Some(n) = parse_var::<usize>("MARKET_DATA_MAX_CONCURRENT").filter(|n| *n >= 1) {
                out.max_concurrent = n;
            }

            if let Some(secs) = parse_var::<u64>("MARKET_DATA_CALL_TIMEOUT_SECS") {
                out.call_timeout = Duration::from_secs(secs);
            }

            if let Some(ttl) =
                parse_var::<i64>("MARKET_DATA_CACHE_TTL_SECS").and_then(cache_ttl_from_secs)
            {
                out.cache_ttl = ttl;
            }

            if let Some(n) = parse_var::<u32>("MARKET_DATA_RETRIES") {
                out.retries = n.min(MAX_RETRIES);
            }

            out
        }
    }

    /// Negative values are rejected; anything above one day is capped.
    fn cache_ttl_from_secs(secs: i64) -> Option<chrono::Duration> {
        if secs < 0 {
            return None;
        }
        chrono::Duration::try_seconds(secs.min(MAX_CACHE_TTL_SECS))
    }

    fn non_empty_var(key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|s| !s.trim().is_empty())
    }

    fn parse_var<T: std::str::FromStr>(key: &str) -> Option<T> {
        std::env::var(key).ok().and_then(|s| s.trim().parse::<T>().ok())
    }

}

use crate::config::{EngineOptions, Settings};
use crate::domain::market::MarketSnapshot;
use crate::market::cache::SnapshotCache;
use crate::market::error::MarketDataError;
use crate::market::MarketDataClient;
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

const PROVIDER: &str = "finnhub";
const TOKEN_HEADER: &str = "X-Finnhub-Token";
const BACKOFF_BASE_MS: u64 = 250;
const MAX_BACKOFF_DOUBLINGS: u32 = 6;

#[derive(Debug, Clone, Default, Deserialize)]
struct QuoteResponse {
    #[serde(rename = "c", default)]
    current: f64,
    #[serde(rename = "d", default)]
    change: Option<f64>,
    #[serde(rename = "dp", default)]
    change_percent: Option<f64>,
    #[serde(rename = "h", default)]
    high: f64,
    #[serde(rename = "l", default)]
    low: f64,
    #[serde(rename = "pc", default)]
    previous_close: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileResponse {
    #[serde(default)]
    market_capitalization: f64,
    #[serde(rename = "finnhubIndustry", default)]
    industry: String,
}

#[derive(Debug)]
pub struct FinnhubClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    retries: u32,
    cache: SnapshotCache,
}

impl FinnhubClient {
    pub fn from_settings(settings: &Settings, options: &EngineOptions) -> Result<Self> {
        let api_key = settings.require_finnhub_api_key()?.to_string();

        let http = reqwest::Client::builder()
            .timeout(options.call_timeout)
            .build()
            .context("failed to build finnhub http client")?;

        Ok(Self {
            http,
            base_url: settings.finnhub_base_url.clone(),
            api_key,
            retries: options.retries.max(1),
            cache: SnapshotCache::new(options.cache_ttl),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path.trim_start_matches('/'))
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(TOKEN_HEADER, HeaderValue::from_str(&self.api_key)?);
        Ok(headers)
    }

    async fn get_once<T: DeserializeOwned>(
        &self,
        path: &str,
        symbol: &str,
        stage: &'static str,
    ) -> Result<T> {
        let res = self
            .http
            .get(self.url(path))
            .headers(self.headers()?)
            .query(&[("symbol", symbol)])
            .send()
            .await
            .map_err(|e| MarketDataError::new(PROVIDER, symbol, stage, e.to_string()))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|e| MarketDataError::new(PROVIDER, symbol, stage, e.to_string()))?;

        if !status.is_success() {
            let detail = format!("HTTP {status}: {text}");
            return Err(MarketDataError::new(PROVIDER, symbol, stage, detail).into());
        }

        serde_json::from_str::<T>(&text).map_err(|e| {
            let detail = format!("invalid JSON ({e}): {text}");
            MarketDataError::new(PROVIDER, symbol, stage, detail).into()
        })
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        symbol: &str,
        stage: &'static str,
    ) -> Result<T> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.get_once(path, symbol, stage).await {
                Ok(v) => return Ok(v),
                Err(err) => {
                    if attempt >= self.retries {
                        return Err(err);
                    }
                    let backoff = backoff_for(attempt);
                    tracing::debug!(
                        attempt,
                        ?backoff,
                        symbol,
                        error = %err,
                        "finnhub request failed; retrying"
                    );
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }
}

#[async_trait::async_trait]
impl MarketDataClient for FinnhubClient {
    fn provider_name(&self) -> &'static str {
        PROVIDER
    }

    async fn fetch_snapshot(&self, symbol: &str) -> Result<Option<MarketSnapshot>> {
        if let Some(hit) = self.cache.get(symbol, chrono::Utc::now()).await {
            return Ok(Some(hit));
        }

        let quote: QuoteResponse = self.get("quote", symbol, "quote").await?;
        if quote.current == 0.0 {
            return Ok(None);
        }

        let profile = match self.get::<ProfileResponse>("stock/profile2", symbol, "profile").await {
            Ok(p) => p,
            Err(err) => {
                tracing::debug!(
                    symbol,
                    error = %err,
                    "finnhub profile unavailable; using empty profile"
                );
                ProfileResponse::default()
            }
        };

        let snapshot = into_snapshot(quote, profile);
        self.cache
            .insert(symbol, snapshot.clone(), chrono::Utc::now())
            .await;
        Ok(Some(snapshot))
    }
}

/// Delay after the given 1-based failed attempt. Doubles each time, then plateaus.
fn backoff_for(attempt: u32) -> Duration {
    let doublings = attempt.saturating_sub(1).min(MAX_BACKOFF_DOUBLINGS);
    Duration::from_millis(BACKOFF_BASE_MS.saturating_mul(1u64 << doublings))
}

fn into_snapshot(quote: QuoteResponse, profile: ProfileResponse) -> MarketSnapshot {
    MarketSnapshot {
        current_price: quote.current,
        day_change: quote.change.unwrap_or(0.0),
        day_change_percent: quote.change_percent.unwrap_or(0.0),
        day_high: quote.high,
        day_low: quote.low,
        previous_close: quote.previous_close,
        market_capitalization: profile.market_capitalization,
        industry: profile.industry,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn maps_quote_and_profile_into_snapshot() {
        let quote: QuoteResponse = serde_json::from_value(json!({
            "c": 191.2, "d": 2.1, "dp": 1.11, "h": 192.0, "l": 188.5, "o": 189.0, "pc": 189.1,
            "t": 1769508000
        }))
        .unwrap();
        let profile: ProfileResponse = serde_json::from_value(json!({
            "marketCapitalization": 2950000.5,
            "name": "Apple Inc",
            "finnhubIndustry": "Technology",
            "exchange": "NASDAQ"
        }))
        .unwrap();

        let s = into_snapshot(quote, profile);
        assert_eq!(s.current_price, 191.2);
        assert_eq!(s.day_change_percent, 1.11);
        assert_eq!(s.previous_close, 189.1);
        assert_eq!(s.market_capitalization, 2950000.5);
        assert_eq!(s.industry, "Technology");
    }

    #[test]
    fn unknown_symbol_quote_parses_with_nulls() {
        // Finnhub answers unknown symbols with zeros and null change fields.
        let quote: QuoteResponse = serde_json::from_value(json!({
            "c": 0, "d": null, "dp": null, "h": 0, "l": 0, "o": 0, "pc": 0, "t": 0
        }))
        .unwrap();
        assert_eq!(quote.current, 0.0);

        let s = into_snapshot(quote, ProfileResponse::default());
        assert_eq!(s.day_change_percent, 0.0);
        assert_eq!(s.market_capitalization, 0.0);
    }

    #[test]
    fn empty_profile_object_is_accepted() {
        let profile: ProfileResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(profile.market_capitalization, 0.0);
        assert!(profile.industry.is_empty());
    }

    #[test]
    fn joins_base_url_and_path() {
        let settings = Settings {
            finnhub_api_key: Some("k".to_string()),
            finnhub_base_url: "https://finnhub.io/api/v1/".to_string(),
            sentry_dsn: None,
        };
        let client = FinnhubClient::from_settings(&settings, &EngineOptions::default()).unwrap();
        assert_eq!(client.url("/quote"), "https://finnhub.io/api/v1/quote");
        assert_eq!(client.provider_name(), "finnhub");
    }

    #[test]
    fn backoff_doubles_then_plateaus() {
        assert_eq!(backoff_for(1), Duration::from_millis(250));
        assert_eq!(backoff_for(2), Duration::from_millis(500));
        assert_eq!(backoff_for(3), Duration::from_millis(1000));
        assert_eq!(backoff_for(7), Duration::from_millis(16_000));
        assert_eq!(backoff_for(40), Duration::from_millis(16_000));
        assert_eq!(backoff_for(u32::MAX), Duration::from_millis(16_000));
    }

    mod http {
        use super::*;
        use wiremock::matchers::{header, method, path, query_param};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        fn client_for(server: &MockServer, retries: u32) -> FinnhubClient {
            let settings = Settings {
                finnhub_api_key: Some("test-key".to_string()),
                finnhub_base_url: server.uri(),
                sentry_dsn: None,
            };
            let options = EngineOptions {
                call_timeout: Duration::from_secs(5),
                retries,
                ..EngineOptions::default()
            };
            FinnhubClient::from_settings(&settings, &options).unwrap()
        }

        fn quote_body() -> serde_json::Value {
            json!({
                "c": 191.2, "d": 2.1, "dp": 1.11, "h": 192.0, "l": 188.5, "o": 189.0, "pc": 189.1
            })
        }

        #[tokio::test]
        async fn zero_quote_is_missing_and_not_cached() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/quote"))
                .and(query_param("symbol", "ZZZZ"))
                .and(header(TOKEN_HEADER, "test-key"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "c": 0, "d": null, "dp": null, "h": 0, "l": 0, "o": 0, "pc": 0
                })))
                .expect(2)
                .mount(&server)
                .await;
            Mock::given(method("GET"))
                .and(path("/stock/profile2"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
                .expect(0)
                .mount(&server)
                .await;

            let client = client_for(&server, 1);
            assert_eq!(client.fetch_snapshot("ZZZZ").await.unwrap(), None);
            assert_eq!(client.fetch_snapshot("ZZZZ").await.unwrap(), None);
        }

        #[tokio::test]
        async fn failed_profile_falls_back_to_empty_profile() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/quote"))
                .respond_with(ResponseTemplate::new(200).set_body_json(quote_body()))
                .mount(&server)
                .await;
            Mock::given(method("GET"))
                .and(path("/stock/profile2"))
                .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
                .mount(&server)
                .await;

            let client = client_for(&server, 1);
            let snap = client.fetch_snapshot("AAPL").await.unwrap().unwrap();
            assert_eq!(snap.current_price, 191.2);
            assert_eq!(snap.day_change_percent, 1.11);
            assert_eq!(snap.market_capitalization, 0.0);
            assert!(snap.industry.is_empty());
        }

        #[tokio::test]
        async fn second_fetch_within_ttl_is_served_from_cache() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/quote"))
                .respond_with(ResponseTemplate::new(200).set_body_json(quote_body()))
                .expect(1)
                .mount(&server)
                .await;
            Mock::given(method("GET"))
                .and(path("/stock/profile2"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "marketCapitalization": 2950000.5,
                    "finnhubIndustry": "Technology"
                })))
                .expect(1)
                .mount(&server)
                .await;

            let client = client_for(&server, 1);
            let first = client.fetch_snapshot("AAPL").await.unwrap();
            let second = client.fetch_snapshot("AAPL").await.unwrap();
            assert!(first.is_some());
            assert_eq!(first, second);
            assert_eq!(second.unwrap().industry, "Technology");
        }

        #[tokio::test]
        async fn server_error_is_retried() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/quote"))
                .respond_with(ResponseTemplate::new(500))
                .up_to_n_times(1)
                .expect(1)
                .mount(&server)
                .await;
            Mock::given(method("GET"))
                .and(path("/quote"))
                .respond_with(ResponseTemplate::new(200).set_body_json(quote_body()))
                .expect(1)
                .mount(&server)
                .await;
            Mock::given(method("GET"))
                .and(path("/stock/profile2"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
                .mount(&server)
                .await;

            let client = client_for(&server, 2);
            let snap = client.fetch_snapshot("AAPL").await.unwrap().unwrap();
            assert_eq!(snap.current_price, 191.2);
        }

        #[tokio::test]
        async fn error_after_last_attempt_names_symbol_and_stage() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/quote"))
                .respond_with(ResponseTemplate::new(503).set_body_string("down"))
                .expect(1)
                .mount(&server)
                .await;

            let client = client_for(&server, 1);
            let err = client.fetch_snapshot("AAPL").await.unwrap_err();
            let market = err.downcast_ref::<MarketDataError>().unwrap();
            assert_eq!(market.symbol, "AAPL");
            assert_eq!(market.stage, "quote");
        }
    }
}

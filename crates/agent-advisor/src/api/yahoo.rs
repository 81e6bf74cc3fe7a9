//! Yahoo Finance API client
//!
//! Symbol search and the quoteSummary fundamentals go through the public
//! JSON endpoints with `reqwest`; the last traded price comes from the chart
//! API via `yahoo_finance_api`.

use super::{FinancialDataSource, SymbolCandidate, SymbolSearch, TickerSnapshot};
use crate::cache::{CacheKey, ResponseCache};
use crate::config::AdvisorConfig;
use crate::error::{AdvisorError, Result};
use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};
use yahoo_finance_api as yahoo;

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";
const COOKIE_URL: &str = "https://fc.yahoo.com";
const SEARCH_LIMIT: &str = "10";

/// quoteSummary modules, in the order their fields take precedence
const SUMMARY_MODULES: [&str; 5] = [
    "price",
    "summaryProfile",
    "summaryDetail",
    "financialData",
    "defaultKeyStatistics",
];

/// Yahoo Finance API client
#[derive(Clone)]
pub struct YahooFinanceClient {
    client: Client,
    base_url: String,
    rate_limiter: SharedRateLimiter,
    crumb: Arc<Mutex<Option<String>>>,
    search_cache: ResponseCache<CacheKey, Vec<SymbolCandidate>>,
    snapshot_cache: ResponseCache<CacheKey, TickerSnapshot>,
}

impl YahooFinanceClient {
    /// Create a new client from the advisor configuration
    pub fn new(config: &AdvisorConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .cookie_store(true)
            .timeout(config.request_timeout)
            .build()?;

        let quota = Quota::per_minute(
            NonZeroU32::new(config.rate_limit_per_minute).unwrap_or(NonZeroU32::MIN),
        );

        Ok(Self {
            client,
            base_url: config.yahoo_base_url.trim_end_matches('/').to_string(),
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
            crumb: Arc::new(Mutex::new(None)),
            search_cache: ResponseCache::new(config.cache_ttl_fundamental),
            snapshot_cache: ResponseCache::new(config.cache_ttl_fundamental),
        })
    }

    #[instrument(skip(self))]
    async fn fetch_candidates(&self, query: &str) -> Result<Vec<SymbolCandidate>> {
        self.rate_limiter.until_ready().await;

        let response = self
            .client
            .get(format!("{}/v1/finance/search", self.base_url))
            .query(&[
                ("q", query),
                ("quotesCount", SEARCH_LIMIT),
                ("newsCount", "0"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AdvisorError::Api(format!(
                "Yahoo search error {status}: {body}"
            )));
        }

        let parsed: SearchResponse = response.json().await?;
        let candidates = parsed.into_candidates();
        debug!("Search for {query:?} returned {} candidates", candidates.len());
        Ok(candidates)
    }

    /// Cookie-bound crumb required by quoteSummary
    async fn crumb(&self) -> Result<String> {
        let mut guard = self.crumb.lock().await;
        if let Some(crumb) = guard.as_ref() {
            return Ok(crumb.clone());
        }

        // Sets the session cookie; the response itself is usually a 404
        if let Err(e) = self.client.get(COOKIE_URL).send().await {
            debug!("Cookie request failed: {e}");
        }

        let crumb = self
            .client
            .get(format!("{}/v1/test/getcrumb", self.base_url))
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let crumb = crumb.trim().to_string();
        if crumb.is_empty() || crumb.contains('<') {
            return Err(AdvisorError::YahooFinance(
                "Could not obtain a crumb".to_string(),
            ));
        }

        *guard = Some(crumb.clone());
        Ok(crumb)
    }

    #[instrument(skip(self))]
    async fn fetch_summary(&self, ticker: &str) -> Result<HashMap<String, Value>> {
        let crumb = self.crumb().await?;
        self.rate_limiter.until_ready().await;

        let response = self
            .client
            .get(format!("{}/v10/finance/quoteSummary/{ticker}", self.base_url))
            .query(&[
                ("modules", SUMMARY_MODULES.join(",").as_str()),
                ("crumb", crumb.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            // Stale crumb; the next call fetches a fresh one
            self.crumb.lock().await.take();
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AdvisorError::YahooFinance(format!(
                "quoteSummary for {ticker} failed with {status}: {body}"
            )));
        }

        let envelope: QuoteSummaryEnvelope = response.json().await?;
        envelope.into_fields(ticker)
    }

    #[instrument(skip(self))]
    async fn last_price(&self, ticker: &str) -> Result<f64> {
        self.rate_limiter.until_ready().await;

        let provider = yahoo::YahooConnector::new()
            .map_err(|e| AdvisorError::YahooFinance(e.to_string()))?;

        let response = provider
            .get_latest_quotes(ticker, "1d")
            .await
            .map_err(|e| AdvisorError::YahooFinance(e.to_string()))?;

        let quote = response
            .last_quote()
            .map_err(|e| AdvisorError::YahooFinance(e.to_string()))?;

        Ok(quote.close)
    }

    async fn fetch_snapshot(&self, ticker: &str) -> Result<TickerSnapshot> {
        let (fields, price) = tokio::join!(self.fetch_summary(ticker), self.last_price(ticker));

        let last_price = match price {
            Ok(price) => Some(price),
            Err(e) => {
                warn!("No last price for {ticker}: {e}");
                None
            }
        };

        Ok(TickerSnapshot {
            fields: fields?,
            last_price,
        })
    }
}

#[async_trait]
impl SymbolSearch for YahooFinanceClient {
    async fn search(&self, query: &str) -> Result<Vec<SymbolCandidate>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AdvisorError::Api("empty search query".to_string()));
        }

        self.search_cache
            .get_or_fetch(CacheKey::new("search", query.to_lowercase()), || {
                self.fetch_candidates(query)
            })
            .await
    }
}

#[async_trait]
impl FinancialDataSource for YahooFinanceClient {
    async fn snapshot(&self, ticker: &str) -> Result<TickerSnapshot> {
        let ticker = ticker.trim();
        if ticker.is_empty() {
            return Err(AdvisorError::YahooFinance("empty ticker symbol".to_string()));
        }

        self.snapshot_cache
            .get_or_fetch(CacheKey::new("snapshot", ticker.to_uppercase()), || {
                self.fetch_snapshot(ticker)
            })
            .await
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    quotes: Vec<SearchQuote>,
}

#[derive(Debug, Deserialize)]
struct SearchQuote {
    #[serde(default)]
    symbol: Option<String>,
    #[serde(default)]
    longname: Option<String>,
    #[serde(default)]
    shortname: Option<String>,
}

impl SearchResponse {
    fn into_candidates(self) -> Vec<SymbolCandidate> {
        self.quotes
            .into_iter()
            .filter_map(|q| {
                let symbol = q.symbol.filter(|s| !s.is_empty())?;
                Some(SymbolCandidate {
                    symbol,
                    long_name: q.longname,
                    short_name: q.shortname,
                })
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryEnvelope {
    quote_summary: QuoteSummary,
}

#[derive(Debug, Deserialize)]
struct QuoteSummary {
    #[serde(default)]
    result: Option<Vec<HashMap<String, Value>>>,
    #[serde(default)]
    error: Option<Value>,
}

impl QuoteSummaryEnvelope {
    fn into_fields(self, ticker: &str) -> Result<HashMap<String, Value>> {
        if let Some(error) = self.quote_summary.error.filter(|e| !e.is_null()) {
            return Err(AdvisorError::YahooFinance(format!(
                "quoteSummary for {ticker}: {error}"
            )));
        }

        let modules = self
            .quote_summary
            .result
            .and_then(|r| r.into_iter().next())
            .ok_or_else(|| {
                AdvisorError::YahooFinance(format!("quoteSummary for {ticker} has no result"))
            })?;

        Ok(flatten_modules(&modules))
    }
}

/// Merge module objects into one field map, unwrapping `{raw, fmt}` values
fn flatten_modules(modules: &HashMap<String, Value>) -> HashMap<String, Value> {
    let mut fields = HashMap::new();

    for name in SUMMARY_MODULES {
        let Some(Value::Object(module)) = modules.get(name) else {
            continue;
        };
        for (key, value) in module {
            if let Some(value) = plain_value(value) {
                fields.entry(key.clone()).or_insert(value);
            }
        }
    }

    fields
}

fn plain_value(value: &Value) -> Option<Value> {
    match value {
        Value::Object(obj) => obj.get("raw").filter(|raw| !raw.is_null()).cloned(),
        Value::String(_) | Value::Number(_) | Value::Bool(_) => Some(value.clone()),
        Value::Null | Value::Array(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_search_response_parsing() {
        let raw = json!({
            "quotes": [
                {"symbol": "INFY.NS", "longname": "Infosys Limited", "shortname": "INFOSYS"},
                {"symbol": "INFY", "shortname": "Infosys Ltd ADR"},
                {"longname": "No symbol"}
            ]
        });
        let parsed: SearchResponse = serde_json::from_value(raw).unwrap();
        let candidates = parsed.into_candidates();

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].display_name(), "Infosys Limited");
        assert_eq!(candidates[1].display_name(), "Infosys Ltd ADR");
    }

    #[test]
    fn test_flatten_modules() {
        let raw = json!({
            "quoteSummary": {
                "result": [{
                    "price": {
                        "longName": "Tata Consultancy Services Limited",
                        "marketCap": {"raw": 1.5e13, "fmt": "15T"}
                    },
                    "summaryProfile": {"sector": "Technology", "industry": "Information Technology Services"},
                    "summaryDetail": {
                        "trailingPE": {"raw": 30.2, "fmt": "30.20"},
                        "marketCap": {"raw": 1.0, "fmt": "1"},
                        "forwardPE": {}
                    },
                    "financialData": {"returnOnEquity": {"raw": 0.1523, "fmt": "15.23%"}}
                }],
                "error": null
            }
        });
        let envelope: QuoteSummaryEnvelope = serde_json::from_value(raw).unwrap();
        let fields = envelope.into_fields("TCS.NS").unwrap();

        assert_eq!(fields["sector"], json!("Technology"));
        assert_eq!(fields["trailingPE"], json!(30.2));
        assert_eq!(fields["returnOnEquity"], json!(0.1523));
        // earlier modules win
        assert_eq!(fields["marketCap"], json!(1.5e13));
        assert!(!fields.contains_key("forwardPE"));
    }

    #[test]
    fn test_quote_summary_error() {
        let raw = json!({
            "quoteSummary": {
                "result": null,
                "error": {"code": "Not Found", "description": "Quote not found for symbol: XYZ"}
            }
        });
        let envelope: QuoteSummaryEnvelope = serde_json::from_value(raw).unwrap();
        assert!(matches!(
            envelope.into_fields("XYZ"),
            Err(AdvisorError::YahooFinance(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_ticker_is_rejected_without_network() {
        let client = YahooFinanceClient::new(&AdvisorConfig::default()).unwrap();
        assert!(client.snapshot("  ").await.is_err());
        assert!(client.search("").await.is_err());
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_live_search() {
        let client = YahooFinanceClient::new(&AdvisorConfig::default()).unwrap();
        let candidates = client.search("Infosys").await.unwrap();
        assert!(candidates.iter().any(|c| c.symbol.starts_with("INFY")));
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_live_snapshot() {
        let client = YahooFinanceClient::new(&AdvisorConfig::default()).unwrap();
        let snapshot = client.snapshot("TCS.NS").await.unwrap();
        assert!(snapshot.text("longName").is_some());
    }
}

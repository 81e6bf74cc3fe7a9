//! External data collaborators
//!
//! The graph only talks to these traits. Concrete clients for Yahoo Finance
//! and Google News live in the submodules.

pub mod google_news;
pub mod yahoo;

pub use google_news::GoogleNewsClient;
pub use yahoo::YahooFinanceClient;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// One hit from a symbol search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolCandidate {
    /// Ticker symbol, e.g. "INFY.NS"
    pub symbol: String,
    /// Full company name
    pub long_name: Option<String>,
    /// Abbreviated company name
    pub short_name: Option<String>,
}

impl SymbolCandidate {
    /// Long name, else short name, else "N/A"
    pub fn display_name(&self) -> &str {
        self.long_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .or_else(|| self.short_name.as_deref().filter(|n| !n.is_empty()))
            .unwrap_or("N/A")
    }
}

/// Raw financial fields for one ticker
///
/// Keys are the provider's field names (`trailingPE`, `marketCap`, ...).
/// Any field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickerSnapshot {
    /// Provider fields
    pub fields: HashMap<String, Value>,
    /// Last traded price from the quote endpoint
    pub last_price: Option<f64>,
}

impl TickerSnapshot {
    /// Non-empty string field
    pub fn text(&self, key: &str) -> Option<&str> {
        self.fields
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Numeric field
    pub fn number(&self, key: &str) -> Option<f64> {
        self.fields.get(key).and_then(Value::as_f64)
    }

    /// Field as stored
    pub fn raw(&self, key: &str) -> Option<&Value> {
        self.fields.get(key).filter(|v| !v.is_null())
    }
}

/// What to fetch headlines for
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NewsQuery {
    /// A topic feed such as "business"
    Topic(String),
    /// Free-text search
    Search(String),
}

/// One feed entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsEntry {
    /// Entry headline
    pub title: String,
    /// Headlines of related articles grouped under this entry
    pub sub_articles: Vec<String>,
}

/// Ticker symbol lookup by company name
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SymbolSearch: Send + Sync {
    /// Candidates matching a free-text name; may be empty
    async fn search(&self, query: &str) -> Result<Vec<SymbolCandidate>>;
}

/// Fundamentals and quotes by ticker
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FinancialDataSource: Send + Sync {
    /// Snapshot of the ticker's financial fields
    async fn snapshot(&self, ticker: &str) -> Result<TickerSnapshot>;
}

/// Headline feeds
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NewsSource: Send + Sync {
    /// Entries for a topic feed or a search
    async fn headlines(&self, query: &NewsQuery) -> Result<Vec<NewsEntry>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_display_name_fallbacks() {
        let mut candidate = SymbolCandidate {
            symbol: "TCS.NS".to_string(),
            long_name: Some("Tata Consultancy Services Limited".to_string()),
            short_name: Some("TCS".to_string()),
        };
        assert_eq!(candidate.display_name(), "Tata Consultancy Services Limited");

        candidate.long_name = Some(String::new());
        assert_eq!(candidate.display_name(), "TCS");

        candidate.short_name = None;
        assert_eq!(candidate.display_name(), "N/A");
    }

    #[test]
    fn test_snapshot_accessors() {
        let snapshot = TickerSnapshot {
            fields: HashMap::from([
                ("sector".to_string(), json!("Technology")),
                ("trailingPE".to_string(), json!(24.5)),
                ("industry".to_string(), json!("")),
                ("forwardPE".to_string(), Value::Null),
            ]),
            last_price: None,
        };

        assert_eq!(snapshot.text("sector"), Some("Technology"));
        assert_eq!(snapshot.text("industry"), None);
        assert_eq!(snapshot.number("trailingPE"), Some(24.5));
        assert_eq!(snapshot.raw("forwardPE"), None);
    }
}

//! Ticker resolution
//!
//! The symbol search returns candidates; the model picks the one that best
//! matches the extracted name. Even an exact match goes through the model.

use super::Services;
use crate::api::SymbolCandidate;
use crate::error::{AdvisorError, Result};
use crate::prompts;
use agent_llm::{Message, StructuredOutput, extract};
use minijinja::context;
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::{info, instrument, warn};

/// Structured answer of the ticker picker
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct TickerChoice {
    /// Ticker symbol of the best matching company
    pub ticker: String,
}

impl StructuredOutput for TickerChoice {
    const NAME: &'static str = "select_ticker";
    const DESCRIPTION: &'static str = "Select the ticker of the company that best matches the stock name";
}

/// Display name to symbol, in first-seen order
///
/// A repeated name keeps its position and takes the later symbol.
pub fn candidate_map(candidates: &[SymbolCandidate]) -> Vec<(String, String)> {
    let mut map: Vec<(String, String)> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let name = candidate.display_name();
        match map.iter_mut().find(|(existing, _)| existing.as_str() == name) {
            Some(entry) => entry.1.clone_from(&candidate.symbol),
            None => map.push((name.to_string(), candidate.symbol.clone())),
        }
    }
    map
}

/// Render the mapping as a JSON-style object for the prompt
pub fn render_candidates(map: &[(String, String)]) -> String {
    let pairs: Vec<String> = map
        .iter()
        .map(|(name, symbol)| format!("{name:?}: {symbol:?}"))
        .collect();
    format!("{{{}}}", pairs.join(", "))
}

/// Ticker for a company name, or an empty string on any failure
#[instrument(skip(services))]
pub async fn resolve_ticker(services: &Services, stock_name: &str) -> String {
    match pick_ticker(services, stock_name).await {
        Ok(ticker) => {
            info!("Resolved {stock_name:?} to {ticker:?}");
            ticker
        }
        Err(e) => {
            warn!("Ticker resolution for {stock_name:?} failed: {e}");
            String::new()
        }
    }
}

async fn pick_ticker(services: &Services, stock_name: &str) -> Result<String> {
    let candidates = services.symbols.search(stock_name).await?;
    let map = candidate_map(&candidates);
    if map.is_empty() {
        return Err(AdvisorError::Api(format!("no symbols found for {stock_name:?}")));
    }

    let system = services.prompts.render(prompts::TICKER_SYSTEM, context! {})?;
    let user = services.prompts.render(
        prompts::TICKER_USER,
        context! { candidates => render_candidates(&map), stock_name },
    )?;

    let request = services.request().system(system).add_message(Message::user(user)).build();
    let choice: TickerChoice = extract(services.llm.as_ref(), request).await?;
    Ok(choice.ticker.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{MockFinancialDataSource, MockNewsSource, MockSymbolSearch};
    use crate::nodes::testing::{ScriptedLlm, services, user_text};
    use serde_json::json;
    use std::sync::Arc;

    fn candidate(symbol: &str, long: Option<&str>, short: Option<&str>) -> SymbolCandidate {
        SymbolCandidate {
            symbol: symbol.to_string(),
            long_name: long.map(str::to_string),
            short_name: short.map(str::to_string),
        }
    }

    #[test]
    fn test_candidate_map_overwrites_duplicates_in_place() {
        let map = candidate_map(&[
            candidate("INFY.NS", Some("Infosys Limited"), None),
            candidate("XYZ", None, None),
            candidate("INFY.BO", Some("Infosys Limited"), None),
        ]);
        assert_eq!(
            map,
            vec![
                ("Infosys Limited".to_string(), "INFY.BO".to_string()),
                ("N/A".to_string(), "XYZ".to_string()),
            ]
        );
        assert_eq!(
            render_candidates(&map),
            r#"{"Infosys Limited": "INFY.BO", "N/A": "XYZ"}"#
        );
    }

    #[tokio::test]
    async fn test_model_picks_from_candidates() {
        let mut symbols = MockSymbolSearch::new();
        symbols
            .expect_search()
            .withf(|query| query == "Infosys")
            .times(1)
            .returning(|_| {
                Ok(vec![
                    candidate("INFY.NS", Some("Infosys Limited"), None),
                    candidate("INFY", None, Some("Infosys ADR")),
                ])
            });

        let llm = Arc::new(ScriptedLlm::new(|req| {
            let prompt = user_text(req);
            assert!(prompt.contains(r#""Infosys Limited": "INFY.NS""#));
            assert!(prompt.contains("closest to Infosys"));
            Ok(Message::tool_call("c1", "select_ticker", json!({"ticker": "INFY.NS"})))
        }));

        let services = services(llm, symbols, MockFinancialDataSource::new(), MockNewsSource::new());
        assert_eq!(resolve_ticker(&services, "Infosys").await, "INFY.NS");
    }

    #[tokio::test]
    async fn test_search_failure_yields_empty_ticker() {
        let mut symbols = MockSymbolSearch::new();
        symbols
            .expect_search()
            .returning(|_| Err(AdvisorError::Api("empty search query".to_string())));

        let llm = Arc::new(ScriptedLlm::failing());
        let services = services(llm.clone(), symbols, MockFinancialDataSource::new(), MockNewsSource::new());

        assert_eq!(resolve_ticker(&services, "").await, "");
        assert!(llm.requests().is_empty());
    }

    #[tokio::test]
    async fn test_no_candidates_yields_empty_ticker() {
        let mut symbols = MockSymbolSearch::new();
        symbols.expect_search().returning(|_| Ok(Vec::new()));

        let llm = Arc::new(ScriptedLlm::failing());
        let services = services(llm.clone(), symbols, MockFinancialDataSource::new(), MockNewsSource::new());

        assert_eq!(resolve_ticker(&services, "Nonexistent Corp").await, "");
        assert!(llm.requests().is_empty());
    }

    #[tokio::test]
    async fn test_decoding_failure_yields_empty_ticker() {
        let mut symbols = MockSymbolSearch::new();
        symbols
            .expect_search()
            .returning(|_| Ok(vec![candidate("TCS.NS", Some("Tata Consultancy Services"), None)]));

        let llm = Arc::new(ScriptedLlm::text("TCS.NS is the best match"));
        let services = services(llm, symbols, MockFinancialDataSource::new(), MockNewsSource::new());

        assert_eq!(resolve_ticker(&services, "TCS").await, "");
    }
}

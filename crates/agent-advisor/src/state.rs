//! Per-turn request context
//!
//! A [`TurnState`] is created for each question and filled in as the graph
//! runs. Every field is written at most once; later steps only add.

use crate::error::{AdvisorError, Result};
use crate::intent::IntentRoute;
use crate::nodes::fundamentals::Fundamentals;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Graph steps, in the order they can be visited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Intent classifier
    ClassifyIntent,
    /// Free-form reply
    GeneralTalk,
    /// Bullet digest of the business topic feed
    BusinessNews,
    /// Company name extraction
    ExtractStockName,
    /// Paragraph digest of a stock's news, ends the turn
    StockNewsOnly,
    /// Ticker lookup
    ResolveTicker,
    /// Fundamentals snapshot
    Fundamentals,
    /// Paragraph digest of a stock's news, feeds the recommendation
    StockNews,
    /// Buy/sell recommendation
    Recommend,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ClassifyIntent => "classify_intent",
            Self::GeneralTalk => "general_talk",
            Self::BusinessNews => "business_news",
            Self::ExtractStockName => "extract_stock_name",
            Self::StockNewsOnly => "stock_news_only",
            Self::ResolveTicker => "resolve_ticker",
            Self::Fundamentals => "fundamentals",
            Self::StockNews => "stock_news",
            Self::Recommend => "recommend",
        };
        f.write_str(name)
    }
}

/// Context accumulated over one user turn
#[derive(Debug, Clone, Serialize)]
pub struct TurnState {
    turn_id: Uuid,
    session_token: String,
    query: String,
    intent: Option<IntentRoute>,
    stock_name: Option<String>,
    ticker: Option<String>,
    fundamentals: Option<Fundamentals>,
    stock_news_summary: Option<String>,
    final_result: Option<String>,
    visited: Vec<Step>,
}

fn set_once<T>(slot: &mut Option<T>, field: &'static str, value: T) -> Result<()> {
    if slot.is_some() {
        return Err(AdvisorError::FieldAlreadySet { field });
    }
    *slot = Some(value);
    Ok(())
}

impl TurnState {
    /// Start a turn for a question
    pub fn new(session_token: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            turn_id: Uuid::new_v4(),
            session_token: session_token.into(),
            query: query.into(),
            intent: None,
            stock_name: None,
            ticker: None,
            fundamentals: None,
            stock_news_summary: None,
            final_result: None,
            visited: Vec::new(),
        }
    }

    /// Unique id of this turn
    pub fn turn_id(&self) -> Uuid {
        self.turn_id
    }

    /// Session the turn belongs to
    pub fn session_token(&self) -> &str {
        &self.session_token
    }

    /// The user's question
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Classifier outcome
    pub fn intent(&self) -> Option<&IntentRoute> {
        self.intent.as_ref()
    }

    /// Extracted company name (may be empty)
    pub fn stock_name(&self) -> Option<&str> {
        self.stock_name.as_deref()
    }

    /// Resolved ticker (empty when resolution failed)
    pub fn ticker(&self) -> Option<&str> {
        self.ticker.as_deref()
    }

    /// Fundamentals snapshot
    pub fn fundamentals(&self) -> Option<&Fundamentals> {
        self.fundamentals.as_ref()
    }

    /// News digest feeding the recommendation
    pub fn stock_news_summary(&self) -> Option<&str> {
        self.stock_news_summary.as_deref()
    }

    /// Text shown to the user
    pub fn final_result(&self) -> Option<&str> {
        self.final_result.as_deref()
    }

    /// Steps run so far, in order
    pub fn visited(&self) -> &[Step] {
        &self.visited
    }

    /// Record entry into a step
    pub fn visit(&mut self, step: Step) {
        self.visited.push(step);
    }

    /// Whether a step has run in this turn
    pub fn has_visited(&self, step: Step) -> bool {
        self.visited.contains(&step)
    }

    pub fn set_intent(&mut self, route: IntentRoute) -> Result<()> {
        set_once(&mut self.intent, "intent", route)
    }

    pub fn set_stock_name(&mut self, name: String) -> Result<()> {
        set_once(&mut self.stock_name, "stock_name", name)
    }

    pub fn set_ticker(&mut self, ticker: String) -> Result<()> {
        set_once(&mut self.ticker, "ticker", ticker)
    }

    pub fn set_fundamentals(&mut self, fundamentals: Fundamentals) -> Result<()> {
        set_once(&mut self.fundamentals, "fundamentals", fundamentals)
    }

    pub fn set_stock_news_summary(&mut self, summary: String) -> Result<()> {
        set_once(&mut self.stock_news_summary, "stock_news_summary", summary)
    }

    pub fn set_final_result(&mut self, result: String) -> Result<()> {
        set_once(&mut self.final_result, "final_result", result)
    }
}

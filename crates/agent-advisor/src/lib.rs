//! Intent-routed stock question advisor
//!
//! This crate answers a user's question about the stock market by routing it
//! through a small graph of steps. It includes:
//!
//! - Intent classification into general talk, business news, stock news or buy/sell
//! - Company name extraction and ticker resolution
//! - Fundamentals from Yahoo Finance
//! - Batched news digests from Google News
//! - An analyst-style recommendation combining fundamentals and news
//! - Per-session history in a pluggable store
//!
//! # Architecture
//!
//! ```text
//! classify ─┬─ general talk ───────────────────────────────► end
//!           ├─ business news ──────────────────────────────► end
//!           └─ extract name ─┬─ stock news digest ─────────► end
//!                            └─ resolve ticker ─┬─ fundamentals ─┐
//!                                               └─ news digest ──┴─ recommend ─► end
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use agent_advisor::{AdvisorConfig, AskRequest, StockAdvisor};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let advisor = StockAdvisor::from_config(AdvisorConfig::from_env()?)?;
//!
//!     let response = advisor
//!         .ask(AskRequest::new("Should I buy Infosys now?", "session-1"))
//!         .await?;
//!     println!("{}", response.final_result);
//!
//!     Ok(())
//! }
//! ```

pub mod advisor;
pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod intent;
pub mod nodes;
pub mod prompts;
pub mod router;
pub mod session;
pub mod state;

// Re-export main types for convenience
pub use advisor::{AskRequest, AskResponse, StockAdvisor, StockAdvisorBuilder};
pub use api::{
    FinancialDataSource, GoogleNewsClient, NewsEntry, NewsQuery, NewsSource, SymbolCandidate,
    SymbolSearch, TickerSnapshot, YahooFinanceClient,
};
pub use config::AdvisorConfig;
pub use error::{AdvisorError, Result};
pub use intent::{Intent, IntentRoute};
pub use nodes::fundamentals::{Fundamentals, MetricValue};
pub use session::{ChatMessage, ChatRole, InMemorySessionStore, SessionStore, TurnRecord};
pub use state::{Step, TurnState};

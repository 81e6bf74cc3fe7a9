//! Caller-facing entry point

use crate::api::{FinancialDataSource, GoogleNewsClient, NewsSource, SymbolSearch, YahooFinanceClient};
use crate::config::AdvisorConfig;
use crate::error::{AdvisorError, Result};
use crate::nodes::{LlmSettings, Services};
use crate::prompts::PromptLibrary;
use crate::router::AdvisorGraph;
use crate::session::{ChatMessage, InMemorySessionStore, SessionStore, TurnRecord};
use crate::state::TurnState;
use agent_llm::LLMProvider;
use agent_llm::providers::{OpenAIConfig, OpenAIProvider};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};

/// A question asked within a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AskRequest {
    pub query: String,
    pub session_token: String,
}

impl AskRequest {
    pub fn new(query: impl Into<String>, session_token: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            session_token: session_token.into(),
        }
    }
}

/// The answer to show the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AskResponse {
    pub final_result: String,
}

/// Stock question advisor
///
/// Each call to [`ask`](Self::ask) runs one turn through the step graph and
/// records the exchange in the session store.
pub struct StockAdvisor {
    graph: AdvisorGraph,
    sessions: Arc<dyn SessionStore>,
}

impl StockAdvisor {
    /// Builder starting from a configuration
    pub fn builder(config: AdvisorConfig) -> StockAdvisorBuilder {
        StockAdvisorBuilder::new(config)
    }

    /// Advisor wired to the real LLM, Yahoo Finance and Google News
    pub fn from_config(config: AdvisorConfig) -> Result<Self> {
        Self::builder(config).build()
    }

    /// Answer one question
    #[instrument(skip_all, fields(session = %request.session_token))]
    pub async fn ask(&self, request: AskRequest) -> Result<AskResponse> {
        let query = request.query.trim();
        if query.is_empty() {
            return Err(AdvisorError::InvalidRequest("query must not be empty".to_string()));
        }
        let token = request.session_token.as_str();

        self.sessions.append(token, ChatMessage::user(query)).await?;

        let started_at = Utc::now();
        let mut state = TurnState::new(token, query);
        info!(turn_id = %state.turn_id(), "Turn started");
        let outcome = self.graph.run(&mut state).await;

        let error_text = outcome.as_ref().err().map(ToString::to_string);
        let record = TurnRecord::from_state(&state, started_at, error_text);
        self.sessions.archive(token, record).await?;

        if let Err(e) = outcome {
            error!(turn_id = %state.turn_id(), "Turn failed: {e}");
            return Err(e);
        }

        let final_result = state.final_result().unwrap_or_default().to_string();
        self.sessions
            .append(token, ChatMessage::assistant(final_result.clone()))
            .await?;
        Ok(AskResponse { final_result })
    }

    /// Messages exchanged in a session
    pub async fn history(&self, session_token: &str) -> Result<Vec<ChatMessage>> {
        self.sessions.list(session_token).await
    }

    /// Turn records of a session
    pub async fn turns(&self, session_token: &str) -> Result<Vec<TurnRecord>> {
        self.sessions.turns(session_token).await
    }
}

/// Builder for [`StockAdvisor`]
///
/// Any collaborator left unset is created from the configuration.
pub struct StockAdvisorBuilder {
    config: AdvisorConfig,
    llm: Option<Arc<dyn LLMProvider>>,
    symbols: Option<Arc<dyn SymbolSearch>>,
    financials: Option<Arc<dyn FinancialDataSource>>,
    news: Option<Arc<dyn NewsSource>>,
    sessions: Option<Arc<dyn SessionStore>>,
}

impl StockAdvisorBuilder {
    pub fn new(config: AdvisorConfig) -> Self {
        Self {
            config,
            llm: None,
            symbols: None,
            financials: None,
            news: None,
            sessions: None,
        }
    }

    /// Set the chat model
    pub fn llm(mut self, llm: Arc<dyn LLMProvider>) -> Self {
        self.llm = Some(llm);
        self
    }

    /// Set the ticker search
    pub fn symbols(mut self, symbols: Arc<dyn SymbolSearch>) -> Self {
        self.symbols = Some(symbols);
        self
    }

    /// Set the fundamentals source
    pub fn financials(mut self, financials: Arc<dyn FinancialDataSource>) -> Self {
        self.financials = Some(financials);
        self
    }

    /// Set the headline source
    pub fn news(mut self, news: Arc<dyn NewsSource>) -> Self {
        self.news = Some(news);
        self
    }

    /// Set the session store
    pub fn sessions(mut self, sessions: Arc<dyn SessionStore>) -> Self {
        self.sessions = Some(sessions);
        self
    }

    /// Build the advisor
    pub fn build(self) -> Result<StockAdvisor> {
        let config = self.config;
        config.validate()?;

        let llm: Arc<dyn LLMProvider> = match self.llm {
            Some(llm) => llm,
            None => Arc::new(default_llm(&config)?),
        };

        let (symbols, financials) = match (self.symbols, self.financials) {
            (Some(symbols), Some(financials)) => (symbols, financials),
            (symbols, financials) => {
                let yahoo = Arc::new(YahooFinanceClient::new(&config)?);
                let default_symbols: Arc<dyn SymbolSearch> = yahoo.clone();
                let default_financials: Arc<dyn FinancialDataSource> = yahoo;
                (
                    symbols.unwrap_or(default_symbols),
                    financials.unwrap_or(default_financials),
                )
            }
        };

        let news: Arc<dyn NewsSource> = match self.news {
            Some(news) => news,
            None => Arc::new(GoogleNewsClient::new(&config)?),
        };

        let sessions: Arc<dyn SessionStore> = self
            .sessions
            .unwrap_or_else(|| Arc::new(InMemorySessionStore::new()));

        let services = Services {
            llm,
            symbols,
            financials,
            news,
            prompts: PromptLibrary::new()?,
            llm_settings: LlmSettings::from_config(&config),
            news_batch_size: config.news_batch_size,
        };

        info!(
            "Stock advisor ready (model: {}, provider: {})",
            config.llm_model,
            services.llm.name()
        );

        Ok(StockAdvisor {
            graph: AdvisorGraph::new(services, config.strict_intent),
            sessions,
        })
    }
}

fn default_llm(config: &AdvisorConfig) -> Result<OpenAIProvider> {
    let key = config.require_api_key()?;
    let openai = OpenAIConfig::new(key)
        .with_api_base(config.llm_api_base.as_str())
        .with_timeout(config.llm_timeout.as_secs());
    Ok(OpenAIProvider::with_config(openai)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{MockFinancialDataSource, MockNewsSource, MockSymbolSearch};
    use crate::nodes::testing::ScriptedLlm;
    use agent_llm::Message;
    use serde_json::json;

    fn advisor(llm: ScriptedLlm) -> StockAdvisor {
        StockAdvisor::builder(AdvisorConfig::default())
            .llm(Arc::new(llm))
            .symbols(Arc::new(MockSymbolSearch::new()))
            .financials(Arc::new(MockFinancialDataSource::new()))
            .news(Arc::new(MockNewsSource::new()))
            .build()
            .unwrap()
    }

    fn general_talk() -> ScriptedLlm {
        ScriptedLlm::new(|req| {
            if req.tools.is_some() {
                Ok(Message::tool_call("c1", "classify_intent", json!({"intent": "general talk"})))
            } else {
                Ok(Message::assistant("Hello there"))
            }
        })
    }

    #[tokio::test]
    async fn test_ask_records_history() {
        let advisor = advisor(general_talk());
        let response = advisor.ask(AskRequest::new("hi", "session-1")).await.unwrap();
        assert_eq!(response.final_result, "Hello there");

        let history = advisor.history("session-1").await.unwrap();
        let contents: Vec<&str> = history.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["hi", "Hello there"]);

        let turns = advisor.turns("session-1").await.unwrap();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].intent.as_deref(), Some("general talk"));
    }

    #[tokio::test]
    async fn test_empty_query_rejected() {
        let advisor = advisor(general_talk());
        let err = advisor.ask(AskRequest::new("   ", "s")).await.unwrap_err();
        assert!(matches!(err, AdvisorError::InvalidRequest(_)));
        assert!(advisor.history("s").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_turn_is_archived() {
        let advisor = advisor(ScriptedLlm::failing());
        let err = advisor.ask(AskRequest::new("hi", "s")).await.unwrap_err();
        assert!(matches!(err, AdvisorError::Llm(_)));

        let turns = advisor.turns("s").await.unwrap();
        assert_eq!(turns.len(), 1);
        assert!(!turns[0].succeeded());
        assert_eq!(advisor.history("s").await.unwrap().len(), 1);
    }

    #[test]
    fn test_default_llm_needs_key() {
        let err = StockAdvisor::builder(AdvisorConfig::default())
            .symbols(Arc::new(MockSymbolSearch::new()))
            .financials(Arc::new(MockFinancialDataSource::new()))
            .news(Arc::new(MockNewsSource::new()))
            .build()
            .err();
        assert!(matches!(err, Some(AdvisorError::Config(_))));
    }
}

//! Graph steps
//!
//! Each step is a plain async function over [`Services`]: it takes the
//! inputs it needs and returns its output. Writing results into the turn
//! state is the router's job, which keeps the two concurrent branches free
//! of shared mutable state.

pub mod classifier;
pub mod extractor;
pub mod fundamentals;
pub mod general;
pub mod news;
pub mod synthesizer;
pub mod ticker;

use crate::api::{FinancialDataSource, NewsSource, SymbolSearch};
use crate::config::AdvisorConfig;
use crate::prompts::PromptLibrary;
use agent_llm::{CompletionRequest, LLMProvider, completion::CompletionRequestBuilder};
use std::sync::Arc;

/// Model parameters shared by every LLM step
#[derive(Debug, Clone, PartialEq)]
pub struct LlmSettings {
    /// Model name
    pub model: String,
    /// Completion token limit
    pub max_tokens: usize,
    /// Sampling temperature
    pub temperature: Option<f32>,
}

impl LlmSettings {
    /// Settings taken from the advisor configuration
    pub fn from_config(config: &AdvisorConfig) -> Self {
        Self {
            model: config.llm_model.clone(),
            max_tokens: config.llm_max_tokens,
            temperature: config.llm_temperature,
        }
    }
}

/// Collaborators and settings the steps run against
pub struct Services {
    /// Chat model
    pub llm: Arc<dyn LLMProvider>,
    /// Ticker search
    pub symbols: Arc<dyn SymbolSearch>,
    /// Fundamentals and quotes
    pub financials: Arc<dyn FinancialDataSource>,
    /// Headline feeds
    pub news: Arc<dyn NewsSource>,
    /// Prompt templates
    pub prompts: PromptLibrary,
    /// Model parameters
    pub llm_settings: LlmSettings,
    /// Headlines per summarization call
    pub news_batch_size: usize,
}

impl Services {
    /// Request builder preloaded with the model parameters
    pub fn request(&self) -> CompletionRequestBuilder {
        let builder = CompletionRequest::builder(&self.llm_settings.model)
            .max_tokens(self.llm_settings.max_tokens);
        match self.llm_settings.temperature {
            Some(temperature) => builder.temperature(temperature),
            None => builder,
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted collaborators for step tests

    use super::*;
    use crate::api::{MockFinancialDataSource, MockNewsSource, MockSymbolSearch};
    use agent_llm::{
        CompletionResponse, LLMError, Message, StopReason, TokenUsage,
    };
    use async_trait::async_trait;
    use std::sync::Mutex;

    type Handler = Box<dyn Fn(&CompletionRequest) -> agent_llm::Result<Message> + Send + Sync>;

    /// LLM answering through a closure and recording every request
    pub struct ScriptedLlm {
        handler: Handler,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedLlm {
        pub fn new(
            handler: impl Fn(&CompletionRequest) -> agent_llm::Result<Message> + Send + Sync + 'static,
        ) -> Self {
            Self {
                handler: Box::new(handler),
                requests: Mutex::new(Vec::new()),
            }
        }

        /// Always reply with the same text
        pub fn text(reply: &'static str) -> Self {
            Self::new(move |_| Ok(Message::assistant(reply)))
        }

        /// Always fail
        pub fn failing() -> Self {
            Self::new(|_| Err(LLMError::RequestFailed("connection reset".to_string())))
        }

        pub fn requests(&self) -> Vec<CompletionRequest> {
            self.requests.lock().map(|r| r.clone()).unwrap_or_default()
        }
    }

    #[async_trait]
    impl LLMProvider for ScriptedLlm {
        async fn complete(&self, request: CompletionRequest) -> agent_llm::Result<CompletionResponse> {
            if let Ok(mut requests) = self.requests.lock() {
                requests.push(request.clone());
            }
            let message = (self.handler)(&request)?;
            Ok(CompletionResponse {
                message,
                stop_reason: StopReason::EndTurn,
                usage: TokenUsage::default(),
            })
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    /// Text of the last user message in a request
    pub fn user_text(request: &CompletionRequest) -> String {
        request
            .messages
            .last()
            .and_then(Message::text)
            .unwrap_or_default()
    }

    /// Services with the given LLM and data mocks
    pub fn services(
        llm: Arc<ScriptedLlm>,
        symbols: MockSymbolSearch,
        financials: MockFinancialDataSource,
        news: MockNewsSource,
    ) -> Services {
        Services {
            llm,
            symbols: Arc::new(symbols),
            financials: Arc::new(financials),
            news: Arc::new(news),
            prompts: PromptLibrary::new().unwrap(),
            llm_settings: LlmSettings {
                model: "test-model".to_string(),
                max_tokens: 256,
                temperature: None,
            },
            news_batch_size: 35,
        }
    }

    /// Services where only the LLM is expected to be used
    pub fn llm_only(llm: Arc<ScriptedLlm>) -> Services {
        services(
            llm,
            MockSymbolSearch::new(),
            MockFinancialDataSource::new(),
            MockNewsSource::new(),
        )
    }
}

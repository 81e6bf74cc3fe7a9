//! Configuration for the advisor
//!
//! Everything read from the environment is collected here once at startup.
//! Components receive an [`AdvisorConfig`] and never look at process state.

use crate::error::{AdvisorError, Result};
use agent_llm::providers::{GROQ_API_BASE, OPENAI_API_BASE};
use agent_utils::{env_flag, env_opt, env_parse};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default chat model
pub const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";

/// Default number of headlines summarized per LLM call
pub const DEFAULT_NEWS_BATCH_SIZE: usize = 35;

const DEFAULT_YAHOO_BASE: &str = "https://query1.finance.yahoo.com";
const DEFAULT_NEWS_BASE: &str = "https://news.google.com/rss";

/// Configuration for the advisor and its collaborators
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisorConfig {
    /// API key for the chat completions endpoint
    #[serde(skip_serializing, default)]
    pub llm_api_key: Option<String>,

    /// Base URL of the OpenAI-compatible endpoint
    pub llm_api_base: String,

    /// Model used for every LLM step
    pub llm_model: String,

    /// Maximum tokens per completion
    pub llm_max_tokens: usize,

    /// Sampling temperature; provider default when unset
    pub llm_temperature: Option<f32>,

    /// Timeout for a single LLM call
    pub llm_timeout: Duration,

    /// Google News edition country (e.g. "IN")
    pub news_country: String,

    /// Google News language (e.g. "en")
    pub news_language: String,

    /// Headlines per summarization call
    pub news_batch_size: usize,

    /// Timeout for data API requests
    pub request_timeout: Duration,

    /// Cache TTL for ticker snapshots and symbol searches
    pub cache_ttl_fundamental: Duration,

    /// Cache TTL for headline lists
    pub cache_ttl_news: Duration,

    /// Requests per minute allowed against each data API
    pub rate_limit_per_minute: u32,

    /// Fail the turn on an unrecognized intent label instead of falling back
    pub strict_intent: bool,

    /// Yahoo Finance query host
    pub yahoo_base_url: String,

    /// Google News RSS root
    pub news_base_url: String,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            llm_api_key: None,
            llm_api_base: GROQ_API_BASE.to_string(),
            llm_model: DEFAULT_MODEL.to_string(),
            llm_max_tokens: 1024,
            llm_temperature: None,
            llm_timeout: Duration::from_secs(60),
            news_country: "IN".to_string(),
            news_language: "en".to_string(),
            news_batch_size: DEFAULT_NEWS_BATCH_SIZE,
            request_timeout: Duration::from_secs(30),
            cache_ttl_fundamental: Duration::from_secs(3600), // 1 hour
            cache_ttl_news: Duration::from_secs(300),         // 5 minutes
            rate_limit_per_minute: 60,
            strict_intent: false,
            yahoo_base_url: DEFAULT_YAHOO_BASE.to_string(),
            news_base_url: DEFAULT_NEWS_BASE.to_string(),
        }
    }
}

impl AdvisorConfig {
    /// Create a new configuration builder
    pub fn builder() -> AdvisorConfigBuilder {
        AdvisorConfigBuilder::default()
    }

    /// Build a configuration from environment variables
    ///
    /// `GROQ_API_KEY` selects Groq; otherwise `OPENAI_API_KEY` selects
    /// OpenAI. `LLM_API_BASE` overrides either endpoint.
    pub fn from_env() -> Result<Self> {
        let mut builder = Self::builder();

        if let Some(key) = env_opt("GROQ_API_KEY") {
            builder = builder.llm_api_key(key).llm_api_base(GROQ_API_BASE);
        } else if let Some(key) = env_opt("OPENAI_API_KEY") {
            builder = builder.llm_api_key(key).llm_api_base(OPENAI_API_BASE);
        }
        if let Some(base) = env_opt("LLM_API_BASE") {
            builder = builder.llm_api_base(base);
        }
        if let Some(model) = env_opt("LLM_MODEL") {
            builder = builder.llm_model(model);
        }
        if let Some(tokens) = env_parse::<usize>("LLM_MAX_TOKENS").map_err(AdvisorError::Config)? {
            builder = builder.llm_max_tokens(tokens);
        }
        if let Some(temp) = env_parse::<f32>("LLM_TEMPERATURE").map_err(AdvisorError::Config)? {
            builder = builder.llm_temperature(temp);
        }
        if let Some(secs) = env_parse::<u64>("LLM_TIMEOUT_SECS").map_err(AdvisorError::Config)? {
            builder = builder.llm_timeout(Duration::from_secs(secs));
        }
        if let Some(country) = env_opt("NEWS_COUNTRY") {
            builder = builder.news_country(country);
        }
        if let Some(language) = env_opt("NEWS_LANGUAGE") {
            builder = builder.news_language(language);
        }
        if let Some(size) = env_parse::<usize>("NEWS_BATCH_SIZE").map_err(AdvisorError::Config)? {
            builder = builder.news_batch_size(size);
        }
        if let Some(secs) =
            env_parse::<u64>("REQUEST_TIMEOUT_SECS").map_err(AdvisorError::Config)?
        {
            builder = builder.request_timeout(Duration::from_secs(secs));
        }

        builder.strict_intent(env_flag("ADVISOR_STRICT_INTENT")).build()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.llm_model.trim().is_empty() {
            return Err(AdvisorError::Config("llm_model must not be empty".to_string()));
        }

        if self.llm_max_tokens == 0 {
            return Err(AdvisorError::Config(
                "llm_max_tokens must be greater than 0".to_string(),
            ));
        }

        if let Some(temp) = self.llm_temperature.filter(|t| !(0.0..=2.0).contains(t)) {
            return Err(AdvisorError::Config(format!(
                "llm_temperature must be within 0.0..=2.0, got {temp}"
            )));
        }

        if self.news_batch_size == 0 {
            return Err(AdvisorError::Config(
                "news_batch_size must be greater than 0".to_string(),
            ));
        }

        if self.rate_limit_per_minute == 0 {
            return Err(AdvisorError::Config(
                "rate_limit_per_minute must be greater than 0".to_string(),
            ));
        }

        for (name, url) in [
            ("llm_api_base", &self.llm_api_base),
            ("yahoo_base_url", &self.yahoo_base_url),
            ("news_base_url", &self.news_base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(AdvisorError::Config(format!(
                    "{name} must be an http(s) URL, got {url:?}"
                )));
            }
        }

        Ok(())
    }

    /// The LLM API key, or a configuration error naming the variables to set
    pub fn require_api_key(&self) -> Result<&str> {
        self.llm_api_key.as_deref().ok_or_else(|| {
            AdvisorError::Config(
                "No LLM API key configured; set GROQ_API_KEY or OPENAI_API_KEY".to_string(),
            )
        })
    }
}

/// Builder for AdvisorConfig
#[derive(Debug, Default)]
pub struct AdvisorConfigBuilder {
    llm_api_key: Option<String>,
    llm_api_base: Option<String>,
    llm_model: Option<String>,
    llm_max_tokens: Option<usize>,
    llm_temperature: Option<f32>,
    llm_timeout: Option<Duration>,
    news_country: Option<String>,
    news_language: Option<String>,
    news_batch_size: Option<usize>,
    request_timeout: Option<Duration>,
    cache_ttl_fundamental: Option<Duration>,
    cache_ttl_news: Option<Duration>,
    rate_limit_per_minute: Option<u32>,
    strict_intent: Option<bool>,
    yahoo_base_url: Option<String>,
    news_base_url: Option<String>,
}

impl AdvisorConfigBuilder {
    /// Set the LLM API key
    pub fn llm_api_key(mut self, key: impl Into<String>) -> Self {
        self.llm_api_key = Some(key.into());
        self
    }

    /// Set the OpenAI-compatible base URL
    pub fn llm_api_base(mut self, base: impl Into<String>) -> Self {
        self.llm_api_base = Some(base.into());
        self
    }

    /// Set the model name
    pub fn llm_model(mut self, model: impl Into<String>) -> Self {
        self.llm_model = Some(model.into());
        self
    }

    /// Set the completion token limit
    pub fn llm_max_tokens(mut self, tokens: usize) -> Self {
        self.llm_max_tokens = Some(tokens);
        self
    }

    /// Set the sampling temperature
    pub fn llm_temperature(mut self, temperature: f32) -> Self {
        self.llm_temperature = Some(temperature);
        self
    }

    /// Set the LLM request timeout
    pub fn llm_timeout(mut self, duration: Duration) -> Self {
        self.llm_timeout = Some(duration);
        self
    }

    /// Set the news edition country
    pub fn news_country(mut self, country: impl Into<String>) -> Self {
        self.news_country = Some(country.into());
        self
    }

    /// Set the news language
    pub fn news_language(mut self, language: impl Into<String>) -> Self {
        self.news_language = Some(language.into());
        self
    }

    /// Set the summarization batch size
    pub fn news_batch_size(mut self, size: usize) -> Self {
        self.news_batch_size = Some(size);
        self
    }

    /// Set the data API request timeout
    pub fn request_timeout(mut self, duration: Duration) -> Self {
        self.request_timeout = Some(duration);
        self
    }

    /// Set cache TTL for fundamentals and symbol searches
    pub fn cache_ttl_fundamental(mut self, duration: Duration) -> Self {
        self.cache_ttl_fundamental = Some(duration);
        self
    }

    /// Set cache TTL for headline lists
    pub fn cache_ttl_news(mut self, duration: Duration) -> Self {
        self.cache_ttl_news = Some(duration);
        self
    }

    /// Set the per-minute request quota for each data API
    pub fn rate_limit_per_minute(mut self, limit: u32) -> Self {
        self.rate_limit_per_minute = Some(limit);
        self
    }

    /// Fail on unrecognized intent labels
    pub fn strict_intent(mut self, strict: bool) -> Self {
        self.strict_intent = Some(strict);
        self
    }

    /// Override the Yahoo Finance host
    pub fn yahoo_base_url(mut self, url: impl Into<String>) -> Self {
        self.yahoo_base_url = Some(url.into());
        self
    }

    /// Override the Google News RSS root
    pub fn news_base_url(mut self, url: impl Into<String>) -> Self {
        self.news_base_url = Some(url.into());
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<AdvisorConfig> {
        let defaults = AdvisorConfig::default();

        let config = AdvisorConfig {
            llm_api_key: self.llm_api_key,
            llm_api_base: self.llm_api_base.unwrap_or(defaults.llm_api_base),
            llm_model: self.llm_model.unwrap_or(defaults.llm_model),
            llm_max_tokens: self.llm_max_tokens.unwrap_or(defaults.llm_max_tokens),
            llm_temperature: self.llm_temperature.or(defaults.llm_temperature),
            llm_timeout: self.llm_timeout.unwrap_or(defaults.llm_timeout),
            news_country: self.news_country.unwrap_or(defaults.news_country),
            news_language: self.news_language.unwrap_or(defaults.news_language),
            news_batch_size: self.news_batch_size.unwrap_or(defaults.news_batch_size),
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
            cache_ttl_fundamental: self
                .cache_ttl_fundamental
                .unwrap_or(defaults.cache_ttl_fundamental),
            cache_ttl_news: self.cache_ttl_news.unwrap_or(defaults.cache_ttl_news),
            rate_limit_per_minute: self
                .rate_limit_per_minute
                .unwrap_or(defaults.rate_limit_per_minute),
            strict_intent: self.strict_intent.unwrap_or(defaults.strict_intent),
            yahoo_base_url: self.yahoo_base_url.unwrap_or(defaults.yahoo_base_url),
            news_base_url: self.news_base_url.unwrap_or(defaults.news_base_url),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AdvisorConfig::default();
        assert_eq!(config.llm_model, "llama-3.1-8b-instant");
        assert_eq!(config.news_batch_size, 35);
        assert_eq!(config.news_country, "IN");
        assert!(!config.strict_intent);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = AdvisorConfig::builder()
            .news_batch_size(10)
            .strict_intent(true)
            .request_timeout(Duration::from_secs(5))
            .build()
            .unwrap();

        assert_eq!(config.news_batch_size, 10);
        assert!(config.strict_intent);
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_validation_rejects_zero_batch() {
        let result = AdvisorConfig::builder().news_batch_size(0).build();
        assert!(matches!(result, Err(AdvisorError::Config(_))));
    }

    #[test]
    fn test_validation_rejects_bad_temperature() {
        let config = AdvisorConfig {
            llm_temperature: Some(3.5),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_non_http_base() {
        let config = AdvisorConfig {
            news_base_url: "news.google.com/rss".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_require_api_key() {
        let config = AdvisorConfig::default();
        assert!(config.require_api_key().is_err());

        let config = AdvisorConfig::builder().llm_api_key("gsk_test").build().unwrap();
        assert_eq!(config.require_api_key().unwrap(), "gsk_test");
    }

    #[test]
    fn test_api_key_not_serialized() {
        let config = AdvisorConfig::builder().llm_api_key("secret").build().unwrap();
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret"));
    }
}

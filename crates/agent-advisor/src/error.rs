//! Error types for advisor operations

use thiserror::Error;

/// Errors raised while answering a question
///
/// Most collaborator failures never surface here: nodes catch them and fall
/// back to a sentinel value. What reaches the caller is either a failure of
/// a step without local handling (intent classification, the final
/// recommendation) or a broken invariant.
#[derive(Debug, Error)]
pub enum AdvisorError {
    /// LLM call failed (transport or decoding)
    #[error("LLM error: {0}")]
    Llm(#[from] agent_llm::LLMError),

    /// Network or HTTP error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Prompt template failed to render
    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),

    /// RSS feed could not be parsed
    #[error("Feed error: {0}")]
    Feed(#[from] quick_xml::de::DeError),

    /// External data API answered with an error
    #[error("API error: {0}")]
    Api(String),

    /// Yahoo Finance API error
    #[error("Yahoo Finance error: {0}")]
    YahooFinance(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A turn field was written twice
    #[error("Field `{field}` is already set for this turn")]
    FieldAlreadySet {
        /// Name of the field
        field: &'static str,
    },

    /// The classifier produced a label outside the known set (strict mode)
    #[error("Unrecognized intent label: {0:?}")]
    UnrecognizedIntent(String),

    /// Caller supplied an unusable request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Session store failure
    #[error("Session error: {0}")]
    Session(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Result type alias for advisor operations
pub type Result<T> = std::result::Result<T, AdvisorError>;

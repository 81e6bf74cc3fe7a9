//! LLM provider abstraction layer for the stock advisor
//!
//! This crate provides provider-agnostic abstractions for talking to
//! Large Language Models. It includes:
//!
//! - Message types for LLM communication
//! - Completion request/response types
//! - Tool definitions, used here to force structured output
//! - Provider trait for LLM implementations
//! - Typed structured extraction on top of any provider
//! - An OpenAI-compatible provider (behind the `openai` feature)

pub mod completion;
pub mod error;
pub mod messages;
pub mod provider;
pub mod structured;
pub mod tools;

// Re-export main types
pub use completion::{CompletionRequest, CompletionResponse, StopReason, TokenUsage};
pub use error::{LLMError, Result};
pub use messages::{ContentBlock, Message, MessageContent, Role};
pub use provider::LLMProvider;
pub use structured::{StructuredOutput, extract};
pub use tools::{ToolChoice, ToolDefinition};

// Provider implementations (feature-gated)
#[cfg(feature = "openai")]
pub mod providers;

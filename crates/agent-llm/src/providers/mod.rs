//! Concrete LLM provider implementations
//!
//! This module contains implementations of the LLMProvider trait for
//! OpenAI-compatible chat services.

pub mod openai;

pub use openai::{GROQ_API_BASE, OPENAI_API_BASE, OpenAIConfig, OpenAIProvider};

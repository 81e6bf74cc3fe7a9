//! OpenAI-compatible chat completions provider
//!
//! Works against any server exposing `/chat/completions` in the OpenAI wire
//! format: OpenAI itself, Groq, or a local llama.cpp/vLLM deployment.
//! See: https://platform.openai.com/docs/api-reference/chat
//!
//! ```no_run
//! use agent_llm::{CompletionRequest, LLMProvider, Message};
//! use agent_llm::providers::{OpenAIConfig, OpenAIProvider};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = OpenAIConfig::groq("gsk_...").with_timeout(30);
//! let provider = OpenAIProvider::with_config(config)?;
//!
//! let request = CompletionRequest::builder("llama-3.1-8b-instant")
//!     .add_message(Message::user("Hello!"))
//!     .build();
//! let response = provider.complete(request).await?;
//! println!("{}", response.text());
//! # Ok(())
//! # }
//! ```

use crate::{
    CompletionRequest, CompletionResponse, ContentBlock, LLMError, LLMProvider, Message,
    MessageContent, Result, Role, StopReason, TokenUsage, ToolChoice, ToolDefinition,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Default endpoint for OpenAI
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// OpenAI-compatible endpoint served by Groq
pub const GROQ_API_BASE: &str = "https://api.groq.com/openai/v1";

const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Configuration for the OpenAI-compatible provider
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// API key sent as a bearer token
    pub api_key: String,

    /// Base URL, without the trailing `/chat/completions`
    pub api_base: String,

    /// Request timeout in seconds (default: 120)
    pub timeout_secs: u64,
}

impl OpenAIConfig {
    /// Config for api.openai.com
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Config for Groq's OpenAI-compatible endpoint
    pub fn groq(api_key: impl Into<String>) -> Self {
        Self::new(api_key).with_api_base(GROQ_API_BASE)
    }

    /// Set custom API base URL
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Set request timeout in seconds
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: OPENAI_API_BASE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Provider speaking the OpenAI chat completions protocol
pub struct OpenAIProvider {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIProvider {
    /// Create a provider from an explicit configuration
    pub fn with_config(config: OpenAIConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(LLMError::ConfigurationError(
                "API key must not be empty".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    /// Get the current configuration
    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    #[instrument(skip(self, request), fields(model = %request.model, api_base = %self.config.api_base))]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let model = request.model.clone();
        let body = build_request(request);
        debug!(
            "Sending {} messages to {}",
            body.messages.len(),
            self.config.api_base
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.api_base))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            warn!("Chat completion failed with HTTP {status}");

            return Err(match status.as_u16() {
                401 => LLMError::AuthenticationFailed,
                429 => LLMError::RateLimitExceeded(error_text),
                400 => LLMError::InvalidRequest(error_text),
                404 => LLMError::ModelNotFound(model),
                _ => LLMError::RequestFailed(format!("HTTP {status}: {error_text}")),
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| LLMError::UnexpectedResponse(format!("Failed to parse response: {e}")))?;

        let usage = parsed.usage.unwrap_or_default();
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LLMError::UnexpectedResponse("No choices in response".to_string()))?;

        debug!(
            "Received response - finish_reason: {:?}, tokens: {}/{}",
            choice.finish_reason, usage.prompt_tokens, usage.completion_tokens
        );

        Ok(CompletionResponse {
            message: parse_message(choice.message)?,
            stop_reason: map_stop_reason(choice.finish_reason.as_deref()),
            usage: TokenUsage {
                input_tokens: usage.prompt_tokens,
                output_tokens: usage.completion_tokens,
            },
        })
    }

    fn name(&self) -> &str {
        "openai"
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<ChatTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<ChatToolCall>>,
}

#[derive(Debug, Serialize)]
struct ChatTool {
    #[serde(rename = "type")]
    tool_type: &'static str,
    function: ChatFunction,
}

#[derive(Debug, Serialize)]
struct ChatFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatToolCall {
    id: String,
    #[serde(rename = "type", default = "function_type")]
    call_type: String,
    function: ChatFunctionCall,
}

fn function_type() -> String {
    "function".to_string()
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatFunctionCall {
    name: String,
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ChatToolCall>>,
}

#[derive(Debug, Default, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: usize,
    #[serde(default)]
    completion_tokens: usize,
}

// ============================================================================
// Conversion
// ============================================================================

fn build_request(request: CompletionRequest) -> ChatRequest {
    let mut messages = Vec::with_capacity(request.messages.len() + 1);
    if let Some(system) = request.system {
        messages.push(ChatMessage {
            role: "system",
            content: Some(system),
            tool_calls: None,
        });
    }
    messages.extend(request.messages.into_iter().map(convert_message));

    ChatRequest {
        model: request.model,
        messages,
        max_tokens: request.max_tokens,
        temperature: request.temperature,
        tools: request.tools.as_deref().map(convert_tools),
        tool_choice: request.tool_choice.map(convert_tool_choice),
    }
}

fn convert_message(msg: Message) -> ChatMessage {
    let role = match msg.role {
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::System => "system",
    };

    let mut tool_calls = Vec::new();
    let content = match msg.content {
        Some(MessageContent::Text(text)) => Some(text),
        Some(MessageContent::Blocks(blocks)) => {
            let mut text = String::new();
            for block in blocks {
                match block {
                    ContentBlock::Text { text: t } => text.push_str(&t),
                    ContentBlock::ToolUse { id, name, input } => tool_calls.push(ChatToolCall {
                        id,
                        call_type: function_type(),
                        function: ChatFunctionCall {
                            name,
                            arguments: input.to_string(),
                        },
                    }),
                }
            }
            (!text.is_empty()).then_some(text)
        }
        None => None,
    };

    ChatMessage {
        role,
        content,
        tool_calls: (!tool_calls.is_empty()).then_some(tool_calls),
    }
}

fn convert_tools(tools: &[ToolDefinition]) -> Vec<ChatTool> {
    tools
        .iter()
        .map(|tool| ChatTool {
            tool_type: "function",
            function: ChatFunction {
                name: tool.name.clone(),
                description: tool.description.clone(),
                parameters: tool.input_schema.clone(),
            },
        })
        .collect()
}

fn convert_tool_choice(choice: ToolChoice) -> serde_json::Value {
    match choice {
        ToolChoice::Tool { name } => serde_json::json!({
            "type": "function",
            "function": { "name": name },
        }),
    }
}

fn parse_message(msg: ChatResponseMessage) -> Result<Message> {
    let mut blocks = Vec::new();

    if let Some(content) = msg.content.filter(|c| !c.is_empty()) {
        blocks.push(ContentBlock::Text { text: content });
    }

    for call in msg.tool_calls.unwrap_or_default() {
        let input: serde_json::Value =
            serde_json::from_str(&call.function.arguments).map_err(|e| LLMError::Decoding {
                record: call.function.name.clone(),
                reason: format!("tool arguments are not valid JSON: {e}"),
            })?;

        blocks.push(ContentBlock::ToolUse {
            id: call.id,
            name: call.function.name,
            input,
        });
    }

    Ok(Message {
        role: Role::Assistant,
        content: Some(MessageContent::Blocks(blocks)),
    })
}

fn map_stop_reason(reason: Option<&str>) -> StopReason {
    match reason {
        Some("length") => StopReason::MaxTokens,
        Some("tool_calls" | "function_call") => StopReason::ToolUse,
        Some("content_filter") => StopReason::StopSequence,
        _ => StopReason::EndTurn,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_key_rejected() {
        let err = OpenAIProvider::with_config(OpenAIConfig::new("  ")).err();
        assert!(matches!(err, Some(LLMError::ConfigurationError(_))));
    }

    #[test]
    fn test_groq_config() {
        let config = OpenAIConfig::groq("gsk_test").with_timeout(30);
        assert_eq!(config.api_base, GROQ_API_BASE);
        assert_eq!(config.timeout_secs, 30);

        let trimmed = OpenAIConfig::new("k").with_api_base("http://localhost:8000/v1/");
        assert_eq!(trimmed.api_base, "http://localhost:8000/v1");
    }

    #[test]
    fn test_system_prompt_leads_messages() {
        let request = CompletionRequest::builder("m")
            .system("You are an advisor")
            .add_message(Message::user("Hi"))
            .build();
        let body = build_request(request);

        assert_eq!(body.messages.len(), 2);
        assert_eq!(body.messages[0].role, "system");
        assert_eq!(body.messages[1].content.as_deref(), Some("Hi"));
    }

    #[test]
    fn test_forced_tool_wire_format() {
        let tool = ToolDefinition::new("classify_intent", "Route", json!({"type": "object"}));
        let request = CompletionRequest::builder("m")
            .add_message(Message::user("q"))
            .force_tool(tool)
            .build();
        let body = serde_json::to_value(build_request(request)).unwrap();

        assert_eq!(body["tools"][0]["type"], "function");
        assert_eq!(body["tools"][0]["function"]["name"], "classify_intent");
        assert_eq!(
            body["tool_choice"],
            json!({"type": "function", "function": {"name": "classify_intent"}})
        );
    }

    #[test]
    fn test_response_with_tool_calls() {
        let raw = json!({
            "choices": [{
                "message": {
                    "content": null,
                    "tool_calls": [{
                        "id": "call_abc",
                        "type": "function",
                        "function": {
                            "name": "extract_stock_name",
                            "arguments": "{\"stock_name\": \"Infosys\"}"
                        }
                    }]
                },
                "finish_reason": "tool_calls"
            }],
            "usage": {"prompt_tokens": 12, "completion_tokens": 4}
        });
        let parsed: ChatResponse = serde_json::from_value(raw).unwrap();
        let choice = parsed.choices.into_iter().next().unwrap();
        assert_eq!(
            map_stop_reason(choice.finish_reason.as_deref()),
            StopReason::ToolUse
        );

        let message = parse_message(choice.message).unwrap();
        assert_eq!(
            message.tool_input("extract_stock_name"),
            Some(&json!({"stock_name": "Infosys"}))
        );
    }

    #[test]
    fn test_malformed_tool_arguments_are_decoding_errors() {
        let msg = ChatResponseMessage {
            content: None,
            tool_calls: Some(vec![ChatToolCall {
                id: "c".into(),
                call_type: function_type(),
                function: ChatFunctionCall {
                    name: "select_ticker".into(),
                    arguments: "{not json".into(),
                },
            }]),
        };
        let err = parse_message(msg).unwrap_err();
        assert!(err.is_decoding());
    }

    #[test]
    fn test_stop_reason_mapping() {
        assert_eq!(map_stop_reason(Some("stop")), StopReason::EndTurn);
        assert_eq!(map_stop_reason(Some("length")), StopReason::MaxTokens);
        assert_eq!(map_stop_reason(None), StopReason::EndTurn);
    }
}

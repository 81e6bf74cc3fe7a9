//! Typed structured output
//!
//! Every structured call site declares a record type implementing
//! [`StructuredOutput`]. [`extract`] offers the record's schema as the only
//! tool, forces the model to call it and decodes the arguments into the
//! record. Anything that does not decode becomes [`LLMError::Decoding`].

use crate::tools::schema;
use crate::{CompletionRequest, LLMError, LLMProvider, Result, ToolDefinition};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument};

/// A record the model is asked to fill in
pub trait StructuredOutput: DeserializeOwned + JsonSchema + Send {
    /// Tool name presented to the model
    const NAME: &'static str;

    /// Tool description presented to the model
    const DESCRIPTION: &'static str;

    /// Parameter schema; derived from the type unless overridden
    fn schema() -> Value {
        schema::for_type::<Self>()
    }

    /// Tool definition wrapping the schema
    fn tool() -> ToolDefinition {
        ToolDefinition::new(Self::NAME, Self::DESCRIPTION, Self::schema())
    }
}

/// Run a structured completion and decode the answer into `T`
///
/// The request's tools are replaced by `T`'s tool. If the model replies with
/// plain text instead of a tool call, a JSON object in the text is accepted
/// as a fallback, since some OpenAI-compatible servers ignore `tool_choice`.
#[instrument(skip(provider, request), fields(record = T::NAME, model = %request.model))]
pub async fn extract<T: StructuredOutput>(
    provider: &dyn LLMProvider,
    mut request: CompletionRequest,
) -> Result<T> {
    let tool = T::tool();
    request.tool_choice = Some(crate::ToolChoice::force(tool.name.clone()));
    request.tools = Some(vec![tool]);

    let response = provider.complete(request).await?;

    let arguments = match response.message.tool_input(T::NAME) {
        Some(input) => input.clone(),
        None => {
            let text = response.text();
            debug!("No tool call in reply, trying text fallback ({} chars)", text.len());
            json_in_text(&text).ok_or_else(|| LLMError::Decoding {
                record: T::NAME.to_string(),
                reason: "reply contained neither a tool call nor a JSON object".to_string(),
            })?
        }
    };

    serde_json::from_value(arguments).map_err(|e| LLMError::Decoding {
        record: T::NAME.to_string(),
        reason: e.to_string(),
    })
}

/// Find the outermost JSON object in free text (handles ```json fences)
fn json_in_text(text: &str) -> Option<Value> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    serde_json::from_str::<Value>(&text[start..=end])
        .ok()
        .filter(Value::is_object)
}

//! Tool definitions
//!
//! The advisor never lets a model call arbitrary tools. A single tool is
//! offered and forced, and its arguments are the structured answer.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Tool definition sent to the LLM provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON schema for the tool's input parameters
    pub input_schema: Value,
}

impl ToolDefinition {
    /// Create a new tool definition
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}

/// How the model may use the offered tools
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolChoice {
    /// Model must call this tool
    Tool {
        /// Name of the forced tool
        name: String,
    },
}

impl ToolChoice {
    /// Force a specific tool
    pub fn force(name: impl Into<String>) -> Self {
        Self::Tool { name: name.into() }
    }
}

/// JSON schema helpers
pub mod schema {
    use schemars::JsonSchema;
    use serde_json::{Value, json};

    /// Derive a provider-friendly JSON schema for `T`
    ///
    /// Draft metadata (`$schema`, `title`) is stripped since chat APIs expect
    /// a bare object schema for function parameters.
    pub fn for_type<T: JsonSchema>() -> Value {
        let schema = schemars::schema_for!(T);
        let mut value = serde_json::to_value(&schema).unwrap_or_else(|_| json!({}));
        if let Some(obj) = value.as_object_mut() {
            obj.remove("$schema");
            obj.remove("title");
        }
        value
    }

    /// Schema for a string restricted to the given values
    pub fn string_enum(description: &str, values: &[&str]) -> Value {
        json!({
            "type": "string",
            "description": description,
            "enum": values,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemars::JsonSchema;
    use serde_json::json;

    #[derive(JsonSchema, Deserialize)]
    #[allow(dead_code)]
    struct Sample {
        /// Company name
        name: String,
    }

    #[test]
    fn test_schema_for_type() {
        let schema = schema::for_type::<Sample>();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["name"]["type"], "string");
        assert!(schema.get("$schema").is_none());
        assert!(schema.get("title").is_none());
    }

    #[test]
    fn test_string_enum() {
        let schema = schema::string_enum("label", &["a", "b"]);
        assert_eq!(schema["enum"], json!(["a", "b"]));
    }

    #[test]
    fn test_tool_choice_serialization() {
        let choice = ToolChoice::force("classify_intent");
        assert_eq!(
            serde_json::to_value(&choice).unwrap(),
            json!({"type": "tool", "name": "classify_intent"})
        );
    }
}

//! Intent labels and the classifier's output record

use agent_llm::StructuredOutput;
use agent_llm::tools::schema;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;
use std::str::FromStr;

/// What the user is asking for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Intent {
    /// Casual conversation, greetings, explanations
    #[serde(rename = "general talk")]
    GeneralTalk,
    /// Market-wide business updates
    #[serde(rename = "business news")]
    BusinessNews,
    /// News about one company
    #[serde(rename = "stock news")]
    StockNews,
    /// Whether to buy, sell or hold a stock
    #[serde(rename = "buy sell")]
    BuySell,
}

impl Intent {
    /// Every intent, in prompt order
    pub const ALL: [Intent; 4] = [
        Self::GeneralTalk,
        Self::BusinessNews,
        Self::StockNews,
        Self::BuySell,
    ];

    /// Label used in prompts and by the classifier
    pub fn label(&self) -> &'static str {
        match self {
            Self::GeneralTalk => "general talk",
            Self::BusinessNews => "business news",
            Self::StockNews => "stock news",
            Self::BuySell => "buy sell",
        }
    }

    /// All labels, in prompt order
    pub fn labels() -> [&'static str; 4] {
        Self::ALL.map(|i| i.label())
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Intent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|intent| intent.label() == normalized)
            .ok_or_else(|| format!("unknown intent label: {s}"))
    }
}

/// Classifier outcome as seen by the router
///
/// The decoder does not reject labels outside the known set, so they are
/// carried explicitly instead of being coerced to some default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntentRoute {
    /// One of the known intents
    Known(Intent),
    /// A label the classifier made up
    Unrecognized(String),
}

impl IntentRoute {
    /// Interpret a raw classifier label
    pub fn from_label(label: &str) -> Self {
        label
            .parse::<Intent>()
            .map_or_else(|_| Self::Unrecognized(label.to_string()), Self::Known)
    }

    /// The label as produced by the classifier
    pub fn label(&self) -> &str {
        match self {
            Self::Known(intent) => intent.label(),
            Self::Unrecognized(label) => label,
        }
    }

    /// The known intent, if any
    pub fn intent(&self) -> Option<Intent> {
        match self {
            Self::Known(intent) => Some(*intent),
            Self::Unrecognized(_) => None,
        }
    }
}

/// Structured answer of the intent classifier
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct IntentDecision {
    /// user input classification
    pub intent: String,
}

impl IntentDecision {
    /// Route for this decision
    pub fn route(&self) -> IntentRoute {
        IntentRoute::from_label(&self.intent)
    }
}

impl StructuredOutput for IntentDecision {
    const NAME: &'static str = "classify_intent";
    const DESCRIPTION: &'static str = "Classify the user query into exactly one intent category";

    fn schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "intent": schema::string_enum("user input classification", &Intent::labels()),
            },
            "required": ["intent"],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_round_trip() {
        for intent in Intent::ALL {
            assert_eq!(intent.label().parse::<Intent>(), Ok(intent));
        }
        assert_eq!(" Buy Sell ".parse::<Intent>(), Ok(Intent::BuySell));
    }

    #[test]
    fn test_unrecognized_label_is_kept() {
        let route = IntentRoute::from_label("portfolio review");
        assert_eq!(route, IntentRoute::Unrecognized("portfolio review".to_string()));
        assert_eq!(route.label(), "portfolio review");
        assert_eq!(route.intent(), None);
    }

    #[test]
    fn test_decision_schema_lists_labels() {
        let schema = IntentDecision::schema();
        assert_eq!(
            schema["properties"]["intent"]["enum"],
            json!(["general talk", "business news", "stock news", "buy sell"])
        );
        assert_eq!(IntentDecision::tool().name, "classify_intent");
    }

    #[test]
    fn test_serde_uses_labels() {
        assert_eq!(
            serde_json::to_value(Intent::StockNews).unwrap(),
            json!("stock news")
        );
    }
}

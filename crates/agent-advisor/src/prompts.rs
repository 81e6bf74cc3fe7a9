//! Instruction prompts
//!
//! All prompts are MiniJinja templates registered under fixed names. Missing
//! variables are an error rather than an empty string.

use crate::error::Result;
use minijinja::{Environment, UndefinedBehavior};
use serde::Serialize;

pub const INTENT_SYSTEM: &str = "intent_system";
pub const INTENT_USER: &str = "intent_user";
pub const STOCK_NAME_SYSTEM: &str = "stock_name_system";
pub const STOCK_NAME_USER: &str = "stock_name_user";
pub const TICKER_SYSTEM: &str = "ticker_system";
pub const TICKER_USER: &str = "ticker_user";
pub const BUSINESS_DIGEST: &str = "business_digest";
pub const STOCK_DIGEST: &str = "stock_digest";
pub const ANALYST_SYSTEM: &str = "analyst_system";
pub const ANALYST_USER: &str = "analyst_user";

const TEMPLATES: [(&str, &str); 10] = [
    (
        INTENT_SYSTEM,
        "You are an intent classification assistant. \
         Your task is to classify the user's query into exactly ONE category.",
    ),
    (
        INTENT_USER,
        r#"Classify the user query into one of the following categories:

1. general talk
   - Casual conversation
   - Greetings, opinions, explanations, learning questions
   - No news or trading intent

2. business news
   - Daily business updates
   - Market-wide news (economy, indices, sectors, global markets)
   - Not about a specific stock

3. stock news
   - News related to a specific company or stock
   - Earnings, results, mergers, announcements, price movement
   - Example: "What happened to TCS today?"

4. buy sell
   - User is asking whether they should buy, sell, or hold a stock
   - Investment or trading advice
   - Example: "Should I buy Infosys now?"

User query:
{{ query }}

Respond ONLY with the category name."#,
    ),
    (
        STOCK_NAME_SYSTEM,
        "You are a helpful assistant. Your job is to find the stock name in the given user query. \
         If you don't know the answer then return an empty string.",
    ),
    (
        STOCK_NAME_USER,
        "Find the stock name in the given user query. User query: {{ query }}",
    ),
    (
        TICKER_SYSTEM,
        "You are a helpful AI assistant. Your job is to find the most suitable ticker from a provided dictionary. \
         A ticker is the code name of a stock. The dictionary contains company names as keys and tickers as values. \
         You have to give me the one most suitable ticker for the given stock.",
    ),
    (
        TICKER_USER,
        "Here is the user provided dictionary: {{ candidates }}. \
         You have to find out which stock name is closest to {{ stock_name }} and give me the corresponding ticker.",
    ),
    (
        BUSINESS_DIGEST,
        r"You are a professional business data reporter.

You will be given a text of news articles collected from multiple sources.

Instructions:
* Identify and REMOVE duplicate or near-duplicate news (even if the wording or source is different).
* FILTER OUT news that is NOT related to business, finance, markets, companies, economy, or investments.
* GROUP related news together (e.g., multiple articles about the same company or event).
* Produce a CLEAR and CONCISE summary of the remaining business news in 10-20 lines.

Just give me the summarised output in 4-5 lines and nothing else. Don't give any heading to the output. Give the output in pointer form with the mark '*'.
### Input News:
{{ headlines }}",
    ),
    (
        STOCK_DIGEST,
        r"You are a professional business data reporter.

You will be given a text of news articles collected from multiple sources.

Instructions:
1. Identify and REMOVE duplicate or near-duplicate news (even if the wording or source is different).
2. FILTER OUT news that is NOT related to business, finance, markets, companies, economy, or investments.
3. GROUP related news together (e.g., multiple articles about the same company or event).
4. Produce a CLEAR and CONCISE summary of the remaining business news in 5-10 lines.

Just give me the summarised output in paragraph format and nothing else.
### Input News:
{{ headlines }}",
    ),
    (
        ANALYST_SYSTEM,
        r"You are a professional stock market equity research analyst.
Your job is to analyze a stock objectively using:
- Fundamental financial data
- Latest company-specific news
- Broader business and macroeconomic news

You must think like a real analyst:
- Weigh positives vs negatives
- Avoid hype or emotional bias
- Clearly justify every conclusion

Your final output must be structured, concise, and actionable.",
    ),
    (
        ANALYST_USER,
        r"User Query: {{ query }}
Latest Stock-Specific News: {{ news }}
Fundamental Data of the Stock:
{{ fundamentals }}
Analyze the stock as a professional investment analyst and provide an investment recommendation.",
    ),
];

/// Named prompt templates
pub struct PromptLibrary {
    env: Environment<'static>,
}

impl PromptLibrary {
    /// Library with the built-in prompts
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        for (name, source) in TEMPLATES {
            env.add_template(name, source)?;
        }
        Ok(Self { env })
    }

    /// Render a template by name
    pub fn render<S: Serialize>(&self, name: &str, ctx: S) -> Result<String> {
        let template = self.env.get_template(name)?;
        Ok(template.render(ctx)?)
    }

    /// Names of all registered templates
    pub fn names(&self) -> Vec<&str> {
        self.env.templates().map(|(name, _)| name).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::context;

    #[test]
    fn test_all_templates_registered() {
        let prompts = PromptLibrary::new().unwrap();
        let names = prompts.names();
        for (name, _) in TEMPLATES {
            assert!(names.contains(&name), "missing {name}");
        }
    }

    #[test]
    fn test_intent_prompt_embeds_query() {
        let prompts = PromptLibrary::new().unwrap();
        let text = prompts
            .render(INTENT_USER, context! { query => "Should I buy Infosys now?" })
            .unwrap();
        assert!(text.contains("User query:\nShould I buy Infosys now?"));
        assert!(text.ends_with("Respond ONLY with the category name."));
    }

    #[test]
    fn test_missing_variable_is_an_error() {
        let prompts = PromptLibrary::new().unwrap();
        assert!(prompts.render(TICKER_USER, context! { stock_name => "TCS" }).is_err());
    }

    #[test]
    fn test_no_html_escaping() {
        let prompts = PromptLibrary::new().unwrap();
        let text = prompts
            .render(STOCK_DIGEST, context! { headlines => "M&M <Q3> results" })
            .unwrap();
        assert!(text.ends_with("M&M <Q3> results"));
    }
}

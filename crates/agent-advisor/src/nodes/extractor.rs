//! Company name extraction

use super::Services;
use crate::error::Result;
use crate::prompts;
use agent_llm::{Message, StructuredOutput, extract};
use minijinja::context;
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::{info, instrument, warn};

/// Structured answer of the extractor
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct StockNameExtraction {
    /// Company or stock name mentioned in the query, empty if none
    #[serde(default)]
    pub stock_name: String,
}

impl StructuredOutput for StockNameExtraction {
    const NAME: &'static str = "extract_stock_name";
    const DESCRIPTION: &'static str = "Report the stock or company name mentioned in the user query";
}

/// Best-guess company name in the question, or an empty string
///
/// Never fails: an empty name sends later steps down their "no data" paths.
#[instrument(skip(services, query))]
pub async fn extract_stock_name(services: &Services, query: &str) -> String {
    match ask_for_name(services, query).await {
        Ok(name) => {
            info!("Extracted stock name: {name:?}");
            name
        }
        Err(e) => {
            warn!("Stock name extraction failed: {e}");
            String::new()
        }
    }
}

async fn ask_for_name(services: &Services, query: &str) -> Result<String> {
    let system = services.prompts.render(prompts::STOCK_NAME_SYSTEM, context! {})?;
    let user = services
        .prompts
        .render(prompts::STOCK_NAME_USER, context! { query })?;

    let request = services.request().system(system).add_message(Message::user(user)).build();
    let extraction: StockNameExtraction = extract(services.llm.as_ref(), request).await?;
    Ok(extraction.stock_name.trim().to_string())
}

//! Buy/sell recommendation

use super::Services;
use super::fundamentals::Fundamentals;
use crate::error::{AdvisorError, Result};
use crate::prompts;
use agent_llm::Message;
use minijinja::context;
use tracing::{info, instrument};

/// Analyst-style recommendation from the question, news and fundamentals
///
/// Failures are not absorbed here; they end the turn.
#[instrument(skip_all)]
pub async fn recommend(
    services: &Services,
    query: &str,
    news: &str,
    fundamentals: &Fundamentals,
) -> Result<String> {
    let system = services.prompts.render(prompts::ANALYST_SYSTEM, context! {})?;
    let user = services.prompts.render(
        prompts::ANALYST_USER,
        context! { query, news, fundamentals => fundamentals.render() },
    )?;

    let request = services.request().system(system).add_message(Message::user(user)).build();
    let text = services.llm.complete(request).await?.text();
    if text.trim().is_empty() {
        return Err(AdvisorError::Other("empty recommendation from model".to_string()));
    }
    info!("Recommendation ready ({} chars)", text.len());
    Ok(text)
}

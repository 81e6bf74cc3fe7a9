//! Intent classification

use super::Services;
use crate::error::Result;
use crate::intent::{IntentDecision, IntentRoute};
use crate::prompts;
use agent_llm::{Message, extract};
use minijinja::context;
use tracing::{info, instrument, warn};

/// Classify a question into an intent route
///
/// Not caught locally: transport and decoding failures fail the turn.
#[instrument(skip(services, query))]
pub async fn classify(services: &Services, query: &str) -> Result<IntentRoute> {
    let system = services.prompts.render(prompts::INTENT_SYSTEM, context! {})?;
    let user = services
        .prompts
        .render(prompts::INTENT_USER, context! { query })?;

    let request = services.request().system(system).add_message(Message::user(user)).build();
    let decision: IntentDecision = extract(services.llm.as_ref(), request).await?;

    let route = decision.route();
    match &route {
        IntentRoute::Known(intent) => info!("Classified intent: {intent}"),
        IntentRoute::Unrecognized(label) => warn!("Classifier returned unknown label {label:?}"),
    }
    Ok(route)
}

//! Free-form replies for casual questions

use super::Services;
use agent_llm::Message;
use tracing::{instrument, warn};

/// Reply shown when the model could not be reached
pub const APOLOGY: &str = "Sorry, I couldn't come up with a reply right now. Please try again.";

/// Answer the question directly, with no data lookups
#[instrument(skip(services, query))]
pub async fn reply(services: &Services, query: &str) -> String {
    let request = services.request().add_message(Message::user(query)).build();

    match services.llm.complete(request).await {
        Ok(response) => {
            let text = response.text();
            if text.trim().is_empty() { APOLOGY.to_string() } else { text }
        }
        Err(e) => {
            warn!("General reply failed: {e}");
            APOLOGY.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::testing::{ScriptedLlm, llm_only, user_text};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_reply_is_verbatim() {
        let llm = Arc::new(ScriptedLlm::text("Hello! How can I help with the markets?"));
        let services = llm_only(llm.clone());

        let text = reply(&services, "hi there").await;
        assert_eq!(text, "Hello! How can I help with the markets?");

        let requests = llm.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(user_text(&requests[0]), "hi there");
        assert!(requests[0].system.is_none());
        assert!(requests[0].tools.is_none());
    }

    #[tokio::test]
    async fn test_failure_degrades_to_apology() {
        let services = llm_only(Arc::new(ScriptedLlm::failing()));
        assert_eq!(reply(&services, "hi").await, APOLOGY);
    }
}

//! Advisor graph
//!
//! The router drives a turn through the steps:
//! 1. Classify the intent
//! 2. Answer directly, digest the business feed, or extract a company name
//! 3. For stock news, digest that company's news and stop
//! 4. Otherwise resolve the ticker, then fetch fundamentals and news together
//! 5. Combine both into a recommendation

use crate::error::{AdvisorError, Result};
use crate::intent::{Intent, IntentRoute};
use crate::nodes::news::NewsVariant;
use crate::nodes::{
    Services, classifier, extractor, fundamentals, general, news, synthesizer, ticker,
};
use crate::state::{Step, TurnState};
use tracing::{debug, info, instrument, warn};

/// Where a turn goes after classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentBranch {
    /// Free-form reply
    GeneralTalk,
    /// Business digest
    BusinessNews,
    /// Company name extraction and everything after it
    StockPath,
}

/// Where a stock turn goes after the company name is known
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockBranch {
    /// Digest the company's news and stop
    NewsOnly,
    /// Full recommendation
    Recommendation,
}

/// First decision point
///
/// Labels outside the known set follow the stock path unless `strict` is on.
pub fn route_after_intent(route: &IntentRoute, strict: bool) -> Result<IntentBranch> {
    match route {
        IntentRoute::Known(Intent::GeneralTalk) => Ok(IntentBranch::GeneralTalk),
        IntentRoute::Known(Intent::BusinessNews) => Ok(IntentBranch::BusinessNews),
        IntentRoute::Known(Intent::StockNews | Intent::BuySell) => Ok(IntentBranch::StockPath),
        IntentRoute::Unrecognized(label) if strict => {
            Err(AdvisorError::UnrecognizedIntent(label.clone()))
        }
        IntentRoute::Unrecognized(label) => {
            warn!("Unrecognized intent {label:?}, falling back to the stock path");
            Ok(IntentBranch::StockPath)
        }
    }
}

/// Second decision point
pub fn route_after_stock_name(route: &IntentRoute) -> StockBranch {
    match route {
        IntentRoute::Known(Intent::StockNews) => StockBranch::NewsOnly,
        IntentRoute::Known(Intent::GeneralTalk | Intent::BusinessNews | Intent::BuySell)
        | IntentRoute::Unrecognized(_) => StockBranch::Recommendation,
    }
}

/// Runs turns through the step graph
pub struct AdvisorGraph {
    services: Services,
    strict_intent: bool,
}

impl AdvisorGraph {
    /// Create a graph over the given collaborators
    pub fn new(services: Services, strict_intent: bool) -> Self {
        Self {
            services,
            strict_intent,
        }
    }

    /// Collaborators the steps run against
    pub fn services(&self) -> &Services {
        &self.services
    }

    /// Drive a turn until a terminal step sets the final result
    #[instrument(skip_all, fields(turn_id = %state.turn_id()))]
    pub async fn run(&self, state: &mut TurnState) -> Result<()> {
        let mut next = Some(Step::ClassifyIntent);
        while let Some(step) = next {
            if state.has_visited(step) {
                return Err(AdvisorError::Other(format!("step {step} visited twice")));
            }
            debug!("Entering step {step}");
            next = self.run_step(step, state).await?;
        }

        match state.final_result() {
            Some(result) if !result.is_empty() => {
                info!("Turn finished after {} steps", state.visited().len());
                Ok(())
            }
            _ => Err(AdvisorError::Other("turn ended without a result".to_string())),
        }
    }

    async fn run_step(&self, step: Step, state: &mut TurnState) -> Result<Option<Step>> {
        let services = &self.services;
        state.visit(step);

        match step {
            Step::ClassifyIntent => {
                let route = classifier::classify(services, state.query()).await?;
                let branch = route_after_intent(&route, self.strict_intent);
                state.set_intent(route)?;
                Ok(Some(match branch? {
                    IntentBranch::GeneralTalk => Step::GeneralTalk,
                    IntentBranch::BusinessNews => Step::BusinessNews,
                    IntentBranch::StockPath => Step::ExtractStockName,
                }))
            }
            Step::GeneralTalk => {
                let reply = general::reply(services, state.query()).await;
                state.set_final_result(reply)?;
                Ok(None)
            }
            Step::BusinessNews => {
                let digest = news::summarize(services, NewsVariant::BusinessDigest, "").await;
                state.set_final_result(digest)?;
                Ok(None)
            }
            Step::ExtractStockName => {
                let name = extractor::extract_stock_name(services, state.query()).await;
                state.set_stock_name(name)?;
                let route = state
                    .intent()
                    .ok_or_else(|| AdvisorError::Other("intent missing before extraction".to_string()))?;
                Ok(Some(match route_after_stock_name(route) {
                    StockBranch::NewsOnly => Step::StockNewsOnly,
                    StockBranch::Recommendation => Step::ResolveTicker,
                }))
            }
            Step::StockNewsOnly => {
                let name = state.stock_name().unwrap_or_default();
                let digest = news::summarize(services, NewsVariant::StockOnly, name).await;
                state.set_final_result(digest)?;
                Ok(None)
            }
            Step::ResolveTicker => {
                let name = state.stock_name().unwrap_or_default();
                let symbol = ticker::resolve_ticker(services, name).await;
                state.set_ticker(symbol)?;
                Ok(Some(Step::Fundamentals))
            }
            Step::Fundamentals => {
                // Both branches run together; each writes its own field.
                state.visit(Step::StockNews);
                let symbol = state.ticker().unwrap_or_default();
                let name = state.stock_name().unwrap_or_default();
                let (facts, digest) = tokio::join!(
                    fundamentals::lookup(services, symbol),
                    news::summarize(services, NewsVariant::StockBriefing, name),
                );
                state.set_fundamentals(facts)?;
                state.set_stock_news_summary(digest)?;
                Ok(Some(Step::Recommend))
            }
            Step::StockNews => Err(AdvisorError::Other(
                "stock news only runs alongside fundamentals".to_string(),
            )),
            Step::Recommend => {
                let facts = state
                    .fundamentals()
                    .ok_or_else(|| AdvisorError::Other("fundamentals missing at the join".to_string()))?;
                let digest = state.stock_news_summary().unwrap_or_default();
                let text = synthesizer::recommend(services, state.query(), digest, facts).await?;
                state.set_final_result(text)?;
                Ok(None)
            }
        }
    }
}

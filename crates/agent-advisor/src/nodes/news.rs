//! News digests
//!
//! Headlines are fetched once, split into fixed-size batches and condensed
//! batch by batch. The per-batch summaries are joined in batch order.

use super::Services;
use crate::api::{NewsEntry, NewsQuery};
use crate::error::{AdvisorError, Result};
use crate::prompts;
use agent_llm::Message;
use minijinja::context;
use tracing::{debug, info, instrument, warn};

/// Topic of the market-wide feed
pub const BUSINESS_TOPIC: &str = "business";

/// Reply when the business digest could not be produced
pub const BUSINESS_NEWS_ERROR: &str = "Error in fetching the recent news. Please Try Again";

/// Reply when a stock digest could not be produced
pub const STOCK_NEWS_ERROR: &str = "No Data available or Error in fetching news";

/// The three digest flavours
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewsVariant {
    /// Bullet digest of the business topic feed, ends the turn
    BusinessDigest,
    /// Paragraph digest of a stock search, feeds the recommendation
    StockBriefing,
    /// Paragraph digest of a stock search, ends the turn
    StockOnly,
}

impl NewsVariant {
    /// Feed to read for this variant
    pub fn query(self, stock_name: &str) -> NewsQuery {
        match self {
            Self::BusinessDigest => NewsQuery::Topic(BUSINESS_TOPIC.to_string()),
            Self::StockBriefing | Self::StockOnly => NewsQuery::Search(stock_name.to_string()),
        }
    }

    /// Prompt used for each batch
    pub fn template(self) -> &'static str {
        match self {
            Self::BusinessDigest => prompts::BUSINESS_DIGEST,
            Self::StockBriefing | Self::StockOnly => prompts::STOCK_DIGEST,
        }
    }

    /// Text returned in place of a digest
    pub fn failure_message(self) -> &'static str {
        match self {
            Self::BusinessDigest => BUSINESS_NEWS_ERROR,
            Self::StockBriefing | Self::StockOnly => STOCK_NEWS_ERROR,
        }
    }
}

/// Headline titles for a query
///
/// Topic feeds bundle related stories under one entry, so their nested
/// titles are used; an entry without any counts as its own title.
pub fn headline_titles(query: &NewsQuery, entries: Vec<NewsEntry>) -> Vec<String> {
    match query {
        NewsQuery::Topic(_) => entries
            .into_iter()
            .flat_map(|entry| {
                if entry.sub_articles.is_empty() {
                    vec![entry.title]
                } else {
                    entry.sub_articles
                }
            })
            .collect(),
        NewsQuery::Search(_) => entries.into_iter().map(|entry| entry.title).collect(),
    }
}

/// Digest for a variant, or its failure message
#[instrument(skip(services))]
pub async fn summarize(services: &Services, variant: NewsVariant, stock_name: &str) -> String {
    match digest(services, variant, stock_name).await {
        Ok(summary) => {
            info!("News digest ready ({} chars)", summary.len());
            summary
        }
        Err(e) => {
            warn!("News digest failed: {e}");
            variant.failure_message().to_string()
        }
    }
}

async fn digest(services: &Services, variant: NewsVariant, stock_name: &str) -> Result<String> {
    let query = variant.query(stock_name);
    let entries = services.news.headlines(&query).await?;
    let titles = headline_titles(&query, entries);
    if titles.is_empty() {
        return Err(AdvisorError::Api(format!("no headlines for {query:?}")));
    }

    let batch_size = services.news_batch_size.max(1);
    debug!("Summarizing {} headlines in batches of {batch_size}", titles.len());

    let mut summaries = Vec::with_capacity(titles.len().div_ceil(batch_size));
    for batch in titles.chunks(batch_size) {
        let prompt = services
            .prompts
            .render(variant.template(), context! { headlines => batch.join("\n") })?;
        let request = services.request().add_message(Message::user(prompt)).build();
        let response = services.llm.complete(request).await?;
        summaries.push(response.text());
    }

    let summary = summaries.join("\n");
    if summary.trim().is_empty() {
        return Err(AdvisorError::Api("model returned an empty digest".to_string()));
    }
    Ok(summary)
}

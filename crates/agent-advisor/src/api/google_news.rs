//! Google News RSS client
//!
//! Topic feeds group several outlets' coverage of one story into a single
//! item whose HTML description lists the grouped articles. Those become
//! [`NewsEntry::sub_articles`].

use super::{NewsEntry, NewsQuery, NewsSource};
use crate::cache::ResponseCache;
use crate::config::AdvisorConfig;
use crate::error::{AdvisorError, Result};
use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use std::num::NonZeroU32;
use std::sync::{Arc, LazyLock};
use tracing::{debug, instrument};

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

static LIST_ITEM_LINK: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?s)<li>\s*<a[^>]*>(.*?)</a>").ok());

/// Google News RSS client
#[derive(Clone)]
pub struct GoogleNewsClient {
    client: Client,
    base_url: String,
    country: String,
    language: String,
    rate_limiter: SharedRateLimiter,
    cache: ResponseCache<NewsQuery, Vec<NewsEntry>>,
}

impl GoogleNewsClient {
    /// Create a new client from the advisor configuration
    pub fn new(config: &AdvisorConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        let quota = Quota::per_minute(
            NonZeroU32::new(config.rate_limit_per_minute).unwrap_or(NonZeroU32::MIN),
        );

        Ok(Self {
            client,
            base_url: config.news_base_url.trim_end_matches('/').to_string(),
            country: config.news_country.to_uppercase(),
            language: config.news_language.to_lowercase(),
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
            cache: ResponseCache::new(config.cache_ttl_news),
        })
    }

    /// Feed URL for a query, without the edition parameters
    fn feed_url(&self, query: &NewsQuery) -> String {
        match query {
            NewsQuery::Topic(topic) => format!(
                "{}/headlines/section/topic/{}",
                self.base_url,
                topic.to_uppercase()
            ),
            NewsQuery::Search(_) => format!("{}/search", self.base_url),
        }
    }

    fn edition_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("hl", self.language.clone()),
            ("gl", self.country.clone()),
            ("ceid", format!("{}:{}", self.country, self.language)),
        ]
    }

    #[instrument(skip(self))]
    async fn fetch(&self, query: &NewsQuery) -> Result<Vec<NewsEntry>> {
        self.rate_limiter.until_ready().await;

        let mut params = self.edition_params();
        if let NewsQuery::Search(text) = query {
            params.push(("q", text.clone()));
        }

        let response = self
            .client
            .get(self.feed_url(query))
            .query(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AdvisorError::Api(format!(
                "Google News returned {status} for {query:?}"
            )));
        }

        let body = response.text().await?;
        let entries = parse_feed(&body)?;
        debug!("Feed for {query:?} has {} entries", entries.len());
        Ok(entries)
    }
}

#[async_trait]
impl NewsSource for GoogleNewsClient {
    async fn headlines(&self, query: &NewsQuery) -> Result<Vec<NewsEntry>> {
        self.cache
            .get_or_fetch(query.clone(), || self.fetch(query))
            .await
    }
}

// ============================================================================
// Feed parsing
// ============================================================================

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
}

/// Parse an RSS document into entries
fn parse_feed(xml: &str) -> Result<Vec<NewsEntry>> {
    let rss: Rss = quick_xml::de::from_str(xml)?;

    Ok(rss
        .channel
        .items
        .into_iter()
        .map(|item| NewsEntry {
            sub_articles: sub_article_titles(&item.description),
            title: item.title.trim().to_string(),
        })
        .collect())
}

/// Titles of the `<li><a>` links in an item description
fn sub_article_titles(description: &str) -> Vec<String> {
    let Some(re) = LIST_ITEM_LINK.as_ref() else {
        return Vec::new();
    };

    re.captures_iter(description)
        .filter_map(|caps| caps.get(1))
        .map(|m| {
            let raw = m.as_str();
            quick_xml::escape::unescape(raw)
                .map_or_else(|_| raw.to_string(), |s| s.into_owned())
                .trim()
                .to_string()
        })
        .filter(|title| !title.is_empty())
        .collect()
}

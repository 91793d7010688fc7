//! RSS/Atom ingestion. One fetcher polls every configured feed
//! concurrently; a feed that is down or unparseable is logged and skipped,
//! never failing the batch.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{info, warn};

use newsroom_common::{NewsItem, NewsroomError};
use newsroom_pipeline::ItemFetcher;

const FETCH_TIMEOUT_SECS: u64 = 15;
const MAX_ITEMS_PER_FEED: usize = 20;

pub struct FeedFetcher {
    client: reqwest::Client,
    feeds: Vec<String>,
}

impl FeedFetcher {
    pub fn new(feeds: Vec<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
            .user_agent("newsroom-monitor/0.1")
            .build()
            .context("Failed to build feed HTTP client")?;
        Ok(Self { client, feeds })
    }

    async fn fetch_one(&self, feed_url: &str) -> Result<Vec<NewsItem>> {
        let resp = self
            .client
            .get(feed_url)
            .send()
            .await
            .context("Feed fetch failed")?;
        let bytes = resp.bytes().await.context("Failed to read feed body")?;
        let feed = feed_rs::parser::parse(&bytes[..])
            .map_err(|e| NewsroomError::Feed(e.to_string()))?;

        let source = feed
            .title
            .map(|t| t.content)
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| feed_url.to_string());

        let items: Vec<NewsItem> = feed
            .entries
            .into_iter()
            .take(MAX_ITEMS_PER_FEED)
            .filter_map(|entry| {
                let link = entry
                    .links
                    .first()
                    .map(|l| l.href.clone())
                    .or_else(|| entry.id.starts_with("http").then(|| entry.id.clone()))?;
                let title = entry.title.map(|t| t.content)?;
                let published = entry
                    .published
                    .or(entry.updated)
                    .map(|dt| dt.with_timezone(&chrono::Utc));

                Some(NewsItem {
                    title,
                    link,
                    source: source.clone(),
                    published,
                })
            })
            .collect();

        info!(feed_url, items = items.len(), "Feed parsed");
        Ok(items)
    }
}

#[async_trait]
impl ItemFetcher for FeedFetcher {
    async fn fetch_items(&self) -> Result<Vec<NewsItem>> {
        let fetches = self.feeds.iter().map(|url| async move {
            (url.as_str(), self.fetch_one(url).await)
        });

        let mut items = Vec::new();
        for (url, result) in futures::future::join_all(fetches).await {
            match result {
                Ok(batch) => items.extend(batch),
                Err(e) => warn!(feed_url = url, error = %e, "Skipping feed this cycle"),
            }
        }
        Ok(items)
    }
}

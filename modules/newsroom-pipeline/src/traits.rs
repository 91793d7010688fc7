//! Collaborator seams: ingestion in, delivery out.
//!
//! Both are traits so the cycle runner can be exercised with in-memory
//! fakes: no network, no database file, `cargo test` in seconds.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use newsroom_common::NewsItem;

/// Produces the candidate item set for one polling cycle. Implementations
/// isolate per-source failures internally; an error from this method means
/// the whole batch is unavailable.
#[async_trait]
pub trait ItemFetcher: Send + Sync {
    async fn fetch_items(&self) -> Result<Vec<NewsItem>>;
}

/// What happened to a single send attempt. An explicit outcome, not an
/// error type hierarchy: the cycle runner loops on these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    /// Channel asked us to back off; retry the same message after the delay.
    RateLimited { retry_after: Duration },
    /// Transient network trouble; retry after a fixed backoff, bounded.
    Transient(String),
    /// Not worth retrying; abandon this message only.
    Permanent(String),
}

/// Hands one formatted message to the outbound channel.
#[async_trait]
pub trait DeliveryChannel: Send + Sync {
    async fn deliver(&self, target: &str, text: &str) -> DeliveryOutcome;
}

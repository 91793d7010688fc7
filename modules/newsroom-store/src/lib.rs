//! Durable record of everything the pipeline has already judged.
//!
//! `SeenStore` is the single seam between the evaluation pipeline and
//! persistence: `SqliteStore` is the production implementation, `MemoryStore`
//! backs tests. The store is the only shared mutable resource in the system
//! and is written by one sequential evaluator at a time.

pub mod memory;
pub mod sqlite;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Append-only table of processed items plus the narrative fingerprint table.
///
/// All mutating operations are durable before returning, and inserting an
/// existing key or fingerprint is a no-op, never an error.
#[async_trait]
pub trait SeenStore: Send + Sync {
    /// Exact-match lookup of a normalized dedup key.
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Comparison texts of records created at or after `cutoff`, newest
    /// first, capped at `limit`. Both bounds exist so a fuzzy pass is never
    /// linear in total history.
    async fn recent(&self, cutoff: DateTime<Utc>, limit: u32) -> Result<Vec<String>>;

    /// Record an item. Idempotent on `key`.
    async fn insert(&self, key: &str, normalized_text: &str, timestamp: DateTime<Utc>)
        -> Result<()>;

    /// True if `fingerprint` was last seen at or after `cutoff`.
    async fn event_seen(&self, fingerprint: &str, cutoff: DateTime<Utc>) -> Result<bool>;

    /// Create the fingerprint or refresh its last-seen time.
    async fn event_touch(&self, fingerprint: &str, timestamp: DateTime<Utc>) -> Result<()>;

    /// Remove fingerprints last seen before `cutoff`. Returns rows removed.
    async fn cleanup_events(&self, cutoff: DateTime<Utc>) -> Result<u64>;
}

//! Narrative grouping — second-layer dedup for "same story, different
//! headline".
//!
//! Items that survive the duplicate detector are reduced to a coarse event
//! fingerprint (see `newsroom_common::text::event_fingerprint`). A
//! fingerprint seen within its TTL suppresses the item. Checking and marking
//! are separate calls: the cycle marks a fingerprint only once the item
//! reaches a recorded outcome, so an item abandoned mid-delivery leaves no
//! trace and gets a clean run next cycle. Repeat coverage refreshes the
//! last-seen time, keeping a sustained story suppressed until it goes quiet
//! for a full TTL.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use newsroom_common::config::GroupingConfig;
use newsroom_common::text::event_fingerprint;
use newsroom_store::SeenStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupVerdict {
    /// First coverage of this story within the TTL window.
    NewStory,
    /// Story already covered recently under some headline.
    RecentlyCovered,
}

pub struct NarrativeGrouper {
    enabled: bool,
    ttl: Duration,
}

impl NarrativeGrouper {
    pub fn new(config: &GroupingConfig) -> Self {
        Self {
            enabled: config.enabled,
            ttl: Duration::minutes(config.event_ttl_minutes),
        }
    }

    /// Check the title's fingerprint against the TTL window. Read-only;
    /// disabled grouping reports every item as a new story.
    pub async fn check(
        &self,
        store: &dyn SeenStore,
        title: &str,
        now: DateTime<Utc>,
    ) -> Result<GroupVerdict> {
        if !self.enabled {
            return Ok(GroupVerdict::NewStory);
        }

        let fingerprint = event_fingerprint(title);
        if store.event_seen(&fingerprint, now - self.ttl).await? {
            debug!(fingerprint, "Story already covered within TTL");
            Ok(GroupVerdict::RecentlyCovered)
        } else {
            Ok(GroupVerdict::NewStory)
        }
    }

    /// Create or refresh the title's fingerprint. No-op when disabled.
    pub async fn mark(
        &self,
        store: &dyn SeenStore,
        title: &str,
        now: DateTime<Utc>,
    ) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        store.event_touch(&event_fingerprint(title), now).await
    }

    /// Drop fingerprints that have been quiet for a full TTL. Run once per
    /// cycle so `event_seen` scans stay small.
    pub async fn sweep(&self, store: &dyn SeenStore, now: DateTime<Utc>) -> Result<u64> {
        if !self.enabled {
            return Ok(0);
        }
        let removed = store.cleanup_events(now - self.ttl).await?;
        if removed > 0 {
            debug!(removed, "Swept expired event fingerprints");
        }
        Ok(removed)
    }
}

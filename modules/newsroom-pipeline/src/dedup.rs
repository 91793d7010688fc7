//! Two-tier duplicate detection.
//!
//! Tier 1 is an exact lookup of the normalized (title, link) key — cheap,
//! catches the same headline re-fetched across polling cycles. Tier 2 is a
//! similarity scan over a bounded recent window — catches re-wordings of the
//! same headline. Tiers short-circuit: an exact hit never reaches the fuzzy
//! scan.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};

use newsroom_common::config::DedupConfig;
use newsroom_common::text::{compute_key, normalize};
use newsroom_common::NewsItem;
use newsroom_store::SeenStore;

/// The outcome of the duplicate check for a single incoming item.
#[derive(Debug, Clone, PartialEq)]
pub enum DedupVerdict {
    /// No match — the item is a novelty.
    Fresh,
    /// Normalized key already stored. Not re-stored, not re-evaluated.
    ExactDuplicate,
    /// A recent record's text is at or above the similarity threshold.
    /// Still recorded so future exact checks catch it.
    FuzzyDuplicate { similarity: f64 },
}

pub struct DuplicateDetector {
    threshold: f64,
    lookback: Duration,
    max_records: u32,
}

impl DuplicateDetector {
    pub fn new(config: &DedupConfig) -> Self {
        Self {
            threshold: config.similarity_threshold,
            lookback: Duration::minutes(config.fuzzy_lookback_minutes),
            max_records: config.fuzzy_max_records,
        }
    }

    /// Run both tiers. Returns the item's normalized key alongside the
    /// verdict so callers never recompute it.
    pub async fn check(
        &self,
        store: &dyn SeenStore,
        item: &NewsItem,
        now: DateTime<Utc>,
    ) -> Result<(String, DedupVerdict)> {
        let key = compute_key(&item.title, &item.link);

        if store.exists(&key).await? {
            return Ok((key, DedupVerdict::ExactDuplicate));
        }

        let recent = store.recent(now - self.lookback, self.max_records).await?;
        let candidate = normalize(&item.title);
        let verdict = match best_similarity(&candidate, &recent) {
            Some(similarity) if similarity >= self.threshold => {
                DedupVerdict::FuzzyDuplicate { similarity }
            }
            _ => DedupVerdict::Fresh,
        };
        Ok((key, verdict))
    }
}

/// Highest Sørensen–Dice bigram ratio between `candidate` and any recent
/// text. Returns None when the window is empty.
fn best_similarity(candidate: &str, recent: &[String]) -> Option<f64> {
    recent
        .iter()
        .map(|existing| strsim::sorensen_dice(candidate, existing))
        .fold(None, |best, ratio| match best {
            Some(b) if b >= ratio => Some(b),
            _ => Some(ratio),
        })
}

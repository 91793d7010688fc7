//! One polling cycle: fetch, evaluate each candidate in order, deliver
//! survivors, record every judgement.
//!
//! Evaluation is strictly sequential per item. The only pre-store work is a
//! cheap in-batch (title, link) prefilter; after that, every terminal branch
//! records the item at most once. A failed evaluation of one item never
//! stops the rest of the batch.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use newsroom_common::text::normalize;
use newsroom_common::{FileConfig, NewsItem, NewsroomError};
use newsroom_store::SeenStore;

use crate::classifier::classify;
use crate::dedup::{DedupVerdict, DuplicateDetector};
use crate::grouper::{GroupVerdict, NarrativeGrouper};
use crate::impact::{GateReason, ImpactScorer};
use crate::message::build_message;
use crate::traits::{DeliveryChannel, DeliveryOutcome, ItemFetcher};

/// Counters for one cycle, logged at cycle end.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CycleStats {
    pub fetched: usize,
    pub batch_duplicates: usize,
    pub malformed: usize,
    pub exact_duplicates: usize,
    pub fuzzy_duplicates: usize,
    pub narrative_duplicates: usize,
    pub locked_out: usize,
    pub rejected: usize,
    pub no_target: usize,
    pub delivered: usize,
    pub delivery_failed: usize,
    pub failed: usize,
}

/// Terminal branch taken for a single item.
#[derive(Debug, Clone, PartialEq)]
enum ItemOutcome {
    Malformed,
    ExactDuplicate,
    FuzzyDuplicate,
    NarrativeDuplicate,
    LockedOut,
    Rejected(GateReason),
    NoTarget,
    Delivered,
    DeliveryFailed,
}

pub struct CycleRunner {
    store: Arc<dyn SeenStore>,
    fetcher: Arc<dyn ItemFetcher>,
    channel: Arc<dyn DeliveryChannel>,
    config: FileConfig,
    detector: DuplicateDetector,
    grouper: NarrativeGrouper,
    scorer: ImpactScorer,
    /// Captured once at process start; the boot lockout horizon is measured
    /// from here, not from each cycle.
    boot_time: DateTime<Utc>,
}

impl CycleRunner {
    pub fn new(
        config: FileConfig,
        store: Arc<dyn SeenStore>,
        fetcher: Arc<dyn ItemFetcher>,
        channel: Arc<dyn DeliveryChannel>,
    ) -> Self {
        let detector = DuplicateDetector::new(&config.dedup);
        let grouper = NarrativeGrouper::new(&config.grouping);
        let scorer = ImpactScorer::new(config.scoring.clone());
        Self {
            store,
            fetcher,
            channel,
            config,
            detector,
            grouper,
            scorer,
            boot_time: Utc::now(),
        }
    }

    /// Run one full cycle. Errors out only when the batch as a whole is
    /// unavailable or the store is down; per-item failures are counted and
    /// logged instead.
    pub async fn run_cycle(&self) -> Result<CycleStats> {
        let run_id = Uuid::new_v4();
        let now = Utc::now();
        let mut stats = CycleStats::default();

        self.grouper.sweep(self.store.as_ref(), now).await?;

        let mut items = self
            .fetcher
            .fetch_items()
            .await
            .context("Failed to fetch candidate items")?;
        stats.fetched = items.len();

        // In-batch prefilter on (title, link) — the one check that never
        // touches the store.
        let mut seen_pairs = HashSet::new();
        items.retain(|i| seen_pairs.insert((i.title.clone(), i.link.clone())));
        stats.batch_duplicates = stats.fetched - items.len();

        // Oldest first; items without a timestamp sort as "now", i.e. last.
        items.sort_by_key(|i| i.published.unwrap_or(now));

        for item in &items {
            match self.evaluate(item).await {
                Ok(outcome) => {
                    stats.count(&outcome);
                }
                Err(e) => {
                    // A store fault is fatal for the whole cycle: with the
                    // store unreachable, exact dedup cannot be trusted and
                    // already-seen items would be re-delivered.
                    if matches!(
                        e.downcast_ref::<NewsroomError>(),
                        Some(NewsroomError::Database(_))
                    ) {
                        return Err(e.context("Store unavailable, aborting cycle"));
                    }
                    stats.failed += 1;
                    warn!(
                        run_id = %run_id,
                        title = item.title.as_str(),
                        error = %e,
                        "Item evaluation failed"
                    );
                }
            }
        }

        info!(
            run_id = %run_id,
            fetched = stats.fetched,
            batch_duplicates = stats.batch_duplicates,
            exact = stats.exact_duplicates,
            fuzzy = stats.fuzzy_duplicates,
            narrative = stats.narrative_duplicates,
            locked_out = stats.locked_out,
            rejected = stats.rejected,
            delivered = stats.delivered,
            delivery_failed = stats.delivery_failed,
            failed = stats.failed,
            "Cycle complete"
        );
        Ok(stats)
    }

    async fn evaluate(&self, item: &NewsItem) -> Result<ItemOutcome> {
        if item.title.trim().is_empty() || item.link.trim().is_empty() {
            return Ok(ItemOutcome::Malformed);
        }

        let store = self.store.as_ref();
        let now = Utc::now();
        let (key, verdict) = self.detector.check(store, item, now).await?;
        let normalized = normalize(&item.title);

        match verdict {
            DedupVerdict::ExactDuplicate => {
                // Already judged in an earlier cycle; nothing to store.
                return Ok(ItemOutcome::ExactDuplicate);
            }
            DedupVerdict::FuzzyDuplicate { similarity } => {
                debug!(title = item.title.as_str(), similarity, "Fuzzy duplicate");
                store.insert(&key, &normalized, now).await?;
                return Ok(ItemOutcome::FuzzyDuplicate);
            }
            DedupVerdict::Fresh => {}
        }

        if self.locked_out(item) {
            debug!(title = item.title.as_str(), "Predates boot lockout horizon");
            store.insert(&key, &normalized, now).await?;
            return Ok(ItemOutcome::LockedOut);
        }

        let group = self.grouper.check(store, &item.title, now).await?;
        if group == GroupVerdict::RecentlyCovered {
            self.record_story(item, &key, &normalized, now).await?;
            return Ok(ItemOutcome::NarrativeDuplicate);
        }

        let category = classify(item, &self.config.classifier);
        let decision = self.scorer.should_publish(item);
        if !decision.accepted {
            info!(
                title = item.title.as_str(),
                score = decision.score,
                reason = decision.reason.as_str(),
                "Rejected by publish gate"
            );
            self.record_story(item, &key, &normalized, now).await?;
            return Ok(ItemOutcome::Rejected(decision.reason));
        }

        let Some(target) = self.config.target_for(category) else {
            debug!(category = %category, "No delivery target configured");
            self.record_story(item, &key, &normalized, now).await?;
            return Ok(ItemOutcome::NoTarget);
        };

        let text = build_message(item, category);
        if self.deliver_with_retry(target, &text).await {
            info!(
                title = item.title.as_str(),
                category = %category,
                score = decision.score,
                "Delivered"
            );
            self.record_story(item, &key, &normalized, now).await?;
            Ok(ItemOutcome::Delivered)
        } else {
            // Deliberately unrecorded, fingerprint untouched: the next cycle
            // re-fetches the item and gets another delivery attempt
            // (at-least-once forwarding).
            Ok(ItemOutcome::DeliveryFailed)
        }
    }

    /// Record a post-grouper terminal outcome: refresh the story fingerprint
    /// and mark the item seen.
    async fn record_story(
        &self,
        item: &NewsItem,
        key: &str,
        normalized: &str,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.grouper.mark(self.store.as_ref(), &item.title, now).await?;
        self.store.insert(key, normalized, now).await
    }

    fn locked_out(&self, item: &NewsItem) -> bool {
        let horizon =
            self.boot_time - Duration::minutes(self.config.lockout.boot_lookback_minutes);
        match item.published {
            Some(published) => published < horizon,
            // No timestamp to judge; falls through to normal gating.
            None => false,
        }
    }

    /// Drive one message through the channel's typed outcomes. Rate-limit
    /// signals are always honored; transient failures retry a bounded
    /// number of times; permanent failures abandon this message only.
    async fn deliver_with_retry(&self, target: &str, text: &str) -> bool {
        let delivery = &self.config.delivery;
        tokio::time::sleep(std::time::Duration::from_secs(delivery.send_delay_seconds)).await;

        let mut transient_attempts = 0u32;
        loop {
            match self.channel.deliver(target, text).await {
                DeliveryOutcome::Delivered => return true,
                DeliveryOutcome::RateLimited { retry_after } => {
                    info!(target, delay_secs = retry_after.as_secs(), "Rate limited, retrying");
                    tokio::time::sleep(retry_after).await;
                }
                DeliveryOutcome::Transient(reason) => {
                    transient_attempts += 1;
                    if transient_attempts > delivery.max_transient_retries {
                        warn!(target, reason, "Transient failures exhausted, abandoning message");
                        return false;
                    }
                    warn!(target, reason, attempt = transient_attempts, "Transient delivery failure");
                    tokio::time::sleep(std::time::Duration::from_secs(
                        delivery.transient_backoff_seconds,
                    ))
                    .await;
                }
                DeliveryOutcome::Permanent(reason) => {
                    warn!(target, reason, "Permanent delivery failure, abandoning message");
                    return false;
                }
            }
        }
    }
}

impl CycleStats {
    fn count(&mut self, outcome: &ItemOutcome) {
        match outcome {
            ItemOutcome::Malformed => self.malformed += 1,
            ItemOutcome::ExactDuplicate => self.exact_duplicates += 1,
            ItemOutcome::FuzzyDuplicate => self.fuzzy_duplicates += 1,
            ItemOutcome::NarrativeDuplicate => self.narrative_duplicates += 1,
            ItemOutcome::LockedOut => self.locked_out += 1,
            ItemOutcome::Rejected(_) => self.rejected += 1,
            ItemOutcome::NoTarget => self.no_target += 1,
            ItemOutcome::Delivered => self.delivered += 1,
            ItemOutcome::DeliveryFailed => self.delivery_failed += 1,
        }
    }
}

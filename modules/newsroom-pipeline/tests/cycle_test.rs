//! End-to-end cycle tests with in-memory collaborators: scripted fetcher,
//! recording delivery channel, memory store. No network, no database file.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use newsroom_common::{FileConfig, NewsItem, NewsroomError};
use newsroom_pipeline::{CycleRunner, DeliveryChannel, DeliveryOutcome, ItemFetcher};
use newsroom_store::{MemoryStore, SeenStore};

// ---------------------------------------------------------------------------
// Collaborator fakes
// ---------------------------------------------------------------------------

/// Returns one pre-loaded batch per cycle, then empty batches.
struct ScriptedFetcher {
    batches: Mutex<VecDeque<Vec<NewsItem>>>,
}

impl ScriptedFetcher {
    fn new(batches: Vec<Vec<NewsItem>>) -> Self {
        Self {
            batches: Mutex::new(batches.into()),
        }
    }
}

#[async_trait]
impl ItemFetcher for ScriptedFetcher {
    async fn fetch_items(&self) -> Result<Vec<NewsItem>> {
        Ok(self.batches.lock().unwrap().pop_front().unwrap_or_default())
    }
}

/// Records every attempt; pops scripted outcomes first, then delivers.
#[derive(Default)]
struct RecordingChannel {
    script: Mutex<VecDeque<DeliveryOutcome>>,
    sent: Mutex<Vec<(String, String)>>,
    attempts: Mutex<u32>,
}

impl RecordingChannel {
    fn with_script(outcomes: Vec<DeliveryOutcome>) -> Self {
        Self {
            script: Mutex::new(outcomes.into()),
            ..Default::default()
        }
    }

    fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    fn attempts(&self) -> u32 {
        *self.attempts.lock().unwrap()
    }
}

#[async_trait]
impl DeliveryChannel for RecordingChannel {
    async fn deliver(&self, target: &str, text: &str) -> DeliveryOutcome {
        *self.attempts.lock().unwrap() += 1;
        let outcome = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(DeliveryOutcome::Delivered);
        if outcome == DeliveryOutcome::Delivered {
            self.sent
                .lock()
                .unwrap()
                .push((target.to_string(), text.to_string()));
        }
        outcome
    }
}

/// Answers reads from a real store but fails every record write.
struct InsertFailingStore {
    inner: MemoryStore,
}

#[async_trait]
impl SeenStore for InsertFailingStore {
    async fn exists(&self, key: &str) -> Result<bool> {
        self.inner.exists(key).await
    }

    async fn recent(&self, cutoff: DateTime<Utc>, limit: u32) -> Result<Vec<String>> {
        self.inner.recent(cutoff, limit).await
    }

    async fn insert(
        &self,
        _key: &str,
        _normalized_text: &str,
        _timestamp: DateTime<Utc>,
    ) -> Result<()> {
        Err(NewsroomError::Database("disk I/O error".to_string()).into())
    }

    async fn event_seen(&self, fingerprint: &str, cutoff: DateTime<Utc>) -> Result<bool> {
        self.inner.event_seen(fingerprint, cutoff).await
    }

    async fn event_touch(&self, fingerprint: &str, timestamp: DateTime<Utc>) -> Result<()> {
        self.inner.event_touch(fingerprint, timestamp).await
    }

    async fn cleanup_events(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        self.inner.cleanup_events(cutoff).await
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn test_config() -> FileConfig {
    let mut config = FileConfig::default();
    config.delivery.breaking_target = "chat-breaking".to_string();
    config.delivery.macro_target = "chat-macro".to_string();
    config.delivery.sports_target = "chat-sports".to_string();
    config.delivery.send_delay_seconds = 0;
    config
}

fn item(title: &str, link: &str, source: &str, minutes_ago: Option<i64>) -> NewsItem {
    NewsItem {
        title: title.to_string(),
        link: link.to_string(),
        source: source.to_string(),
        published: minutes_ago.map(|m| Utc::now() - Duration::minutes(m)),
    }
}

fn runner(
    config: FileConfig,
    store: Arc<MemoryStore>,
    fetcher: ScriptedFetcher,
    channel: Arc<RecordingChannel>,
) -> CycleRunner {
    CycleRunner::new(config, store, Arc::new(fetcher), channel)
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn macro_story_is_delivered_then_exact_suppressed() {
    let boe = item(
        "Bank of England raises interest rates to 5.25%",
        "https://bbc.co.uk/news/1",
        "BBC Business",
        Some(10),
    );
    let store = Arc::new(MemoryStore::new());
    let channel = Arc::new(RecordingChannel::default());
    let fetcher = ScriptedFetcher::new(vec![vec![boe.clone()], vec![boe]]);
    let runner = runner(test_config(), store.clone(), fetcher, channel.clone());

    let first = runner.run_cycle().await.unwrap();
    assert_eq!(first.delivered, 1);
    assert_eq!(store.record_count(), 1);

    let sent = channel.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "chat-macro");
    assert!(sent[0].1.contains("📊 MACRO"));
    assert!(sent[0].1.contains("BANK OF ENGLAND RAISES INTEREST RATES TO 5.25%"));

    // Verbatim re-fetch next cycle: exact tier, no second delivery.
    let second = runner.run_cycle().await.unwrap();
    assert_eq!(second.exact_duplicates, 1);
    assert_eq!(second.delivered, 0);
    assert_eq!(channel.sent().len(), 1);
    assert_eq!(store.record_count(), 1);
}

#[tokio::test]
async fn fuzzy_rewording_is_recorded_but_not_delivered() {
    let original = item(
        "Bank of England raises interest rates to 5.25%",
        "https://bbc.co.uk/news/1",
        "BBC Business",
        Some(10),
    );
    let rewording = item(
        "Bank of England raises interest rates to 5.5%",
        "https://news.sky.com/story/2",
        "Sky News",
        Some(5),
    );
    let store = Arc::new(MemoryStore::new());
    let channel = Arc::new(RecordingChannel::default());
    let fetcher = ScriptedFetcher::new(vec![vec![original], vec![rewording]]);
    let runner = runner(test_config(), store.clone(), fetcher, channel.clone());

    runner.run_cycle().await.unwrap();
    let second = runner.run_cycle().await.unwrap();

    assert_eq!(second.fuzzy_duplicates, 1);
    assert_eq!(second.delivered, 0);
    assert_eq!(channel.sent().len(), 1);
    // The fuzzy duplicate is recorded so future exact checks catch it.
    assert_eq!(store.record_count(), 2);
}

#[tokio::test]
async fn narrative_grouping_suppresses_same_story_under_new_headline() {
    // Same core token set, different enough surface text to clear the
    // fuzzy tier.
    let first = item(
        "Rail strike talks collapse",
        "https://bbc.co.uk/news/1",
        "BBC News",
        Some(30),
    );
    let second = item(
        "What we know about the rail strike talks collapse",
        "https://news.sky.com/story/2",
        "Sky News",
        Some(5),
    );
    let store = Arc::new(MemoryStore::new());
    let channel = Arc::new(RecordingChannel::default());
    let fetcher = ScriptedFetcher::new(vec![vec![first, second]]);
    let runner = runner(test_config(), store.clone(), fetcher, channel.clone());

    let stats = runner.run_cycle().await.unwrap();
    assert_eq!(stats.delivered, 1);
    assert_eq!(stats.narrative_duplicates, 1);
    assert_eq!(channel.sent().len(), 1);
    assert!(channel.sent()[0].1.contains("RAIL STRIKE TALKS COLLAPSE"));
    assert_eq!(store.record_count(), 2);
}

#[tokio::test]
async fn rejected_item_is_recorded_and_never_rescored() {
    let noise = item(
        "Police say missing teenager found",
        "https://news.sky.com/story/9",
        "Sky News",
        Some(10),
    );
    let store = Arc::new(MemoryStore::new());
    let channel = Arc::new(RecordingChannel::default());
    let fetcher = ScriptedFetcher::new(vec![vec![noise.clone()], vec![noise]]);
    let runner = runner(test_config(), store.clone(), fetcher, channel.clone());

    let first = runner.run_cycle().await.unwrap();
    assert_eq!(first.rejected, 1);
    assert_eq!(channel.sent().len(), 0);
    assert_eq!(store.record_count(), 1);

    let second = runner.run_cycle().await.unwrap();
    assert_eq!(second.exact_duplicates, 1);
    assert_eq!(second.rejected, 0);
}

#[tokio::test]
async fn boot_lockout_records_old_items_without_delivering() {
    // Default lookback is 120 minutes; this one is three hours old and
    // would otherwise be accepted.
    let backlog = item(
        "Inflation falls to 3.2% in latest figures",
        "https://bbc.co.uk/news/7",
        "BBC Business",
        Some(180),
    );
    let undated = item(
        "Unemployment climbs in latest labour market data",
        "https://bbc.co.uk/news/8",
        "BBC Business",
        None,
    );
    let store = Arc::new(MemoryStore::new());
    let channel = Arc::new(RecordingChannel::default());
    let fetcher = ScriptedFetcher::new(vec![vec![backlog, undated]]);
    let runner = runner(test_config(), store.clone(), fetcher, channel.clone());

    let stats = runner.run_cycle().await.unwrap();
    assert_eq!(stats.locked_out, 1);
    // No timestamp means no lockout judgement; normal gating applies.
    assert_eq!(stats.delivered, 1);
    assert_eq!(channel.sent().len(), 1);
    assert!(channel.sent()[0].1.contains("UNEMPLOYMENT"));
    assert_eq!(store.record_count(), 2);
}

#[tokio::test]
async fn malformed_items_never_reach_the_store() {
    let no_title = item("", "https://bbc.co.uk/news/1", "BBC News", Some(5));
    let no_link = item("Inflation falls to 3.2%", "", "BBC News", Some(5));
    let store = Arc::new(MemoryStore::new());
    let channel = Arc::new(RecordingChannel::default());
    let fetcher = ScriptedFetcher::new(vec![vec![no_title, no_link]]);
    let runner = runner(test_config(), store.clone(), fetcher, channel.clone());

    let stats = runner.run_cycle().await.unwrap();
    assert_eq!(stats.malformed, 2);
    assert_eq!(store.record_count(), 0);
    assert_eq!(channel.sent().len(), 0);
}

#[tokio::test]
async fn in_batch_prefilter_drops_repeated_pairs_before_the_store() {
    let boe = item(
        "Bank of England raises interest rates to 5.25%",
        "https://bbc.co.uk/news/1",
        "BBC Business",
        Some(10),
    );
    let store = Arc::new(MemoryStore::new());
    let channel = Arc::new(RecordingChannel::default());
    let fetcher = ScriptedFetcher::new(vec![vec![boe.clone(), boe]]);
    let runner = runner(test_config(), store.clone(), fetcher, channel.clone());

    let stats = runner.run_cycle().await.unwrap();
    assert_eq!(stats.fetched, 2);
    assert_eq!(stats.batch_duplicates, 1);
    assert_eq!(stats.delivered, 1);
    assert_eq!(store.record_count(), 1);
}

#[tokio::test]
async fn items_are_evaluated_oldest_first_with_undated_last() {
    let oldest = item(
        "Inflation falls sharply in services",
        "https://bbc.co.uk/news/1",
        "BBC Business",
        Some(45),
    );
    let newer = item(
        "Unemployment climbs in the north",
        "https://bbc.co.uk/news/2",
        "BBC Business",
        Some(5),
    );
    let undated = item(
        "Interest rate decision due",
        "https://bbc.co.uk/news/3",
        "BBC Business",
        None,
    );
    let store = Arc::new(MemoryStore::new());
    let channel = Arc::new(RecordingChannel::default());
    // Deliberately shuffled.
    let fetcher = ScriptedFetcher::new(vec![vec![undated, newer, oldest]]);
    let runner = runner(test_config(), store.clone(), fetcher, channel.clone());

    let stats = runner.run_cycle().await.unwrap();
    assert_eq!(stats.delivered, 3);

    let sent = channel.sent();
    assert!(sent[0].1.contains("INFLATION FALLS SHARPLY"));
    assert!(sent[1].1.contains("UNEMPLOYMENT CLIMBS"));
    assert!(sent[2].1.contains("INTEREST RATE DECISION"));
}

#[tokio::test(start_paused = true)]
async fn rate_limited_delivery_retries_same_message() {
    let boe = item(
        "Bank of England raises interest rates to 5.25%",
        "https://bbc.co.uk/news/1",
        "BBC Business",
        Some(10),
    );
    let store = Arc::new(MemoryStore::new());
    let channel = Arc::new(RecordingChannel::with_script(vec![
        DeliveryOutcome::RateLimited {
            retry_after: StdDuration::from_secs(30),
        },
        DeliveryOutcome::Delivered,
    ]));
    let fetcher = ScriptedFetcher::new(vec![vec![boe]]);
    let runner = runner(test_config(), store.clone(), fetcher, channel.clone());

    let stats = runner.run_cycle().await.unwrap();
    assert_eq!(stats.delivered, 1);
    assert_eq!(channel.attempts(), 2);
    assert_eq!(store.record_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn transient_failures_are_bounded_then_message_abandoned() {
    let boe = item(
        "Bank of England raises interest rates to 5.25%",
        "https://bbc.co.uk/news/1",
        "BBC Business",
        Some(10),
    );
    let store = Arc::new(MemoryStore::new());
    // Default max_transient_retries is 3: first attempt plus three retries.
    let channel = Arc::new(RecordingChannel::with_script(vec![
        DeliveryOutcome::Transient("timeout".to_string()),
        DeliveryOutcome::Transient("timeout".to_string()),
        DeliveryOutcome::Transient("timeout".to_string()),
        DeliveryOutcome::Transient("timeout".to_string()),
    ]));
    let fetcher = ScriptedFetcher::new(vec![vec![boe.clone()], vec![boe]]);
    let runner = runner(test_config(), store.clone(), fetcher, channel.clone());

    let first = runner.run_cycle().await.unwrap();
    assert_eq!(first.delivery_failed, 1);
    assert_eq!(channel.attempts(), 4);
    // Not recorded: the next cycle gets another shot at delivering it.
    assert_eq!(store.record_count(), 0);

    let second = runner.run_cycle().await.unwrap();
    assert_eq!(second.delivered, 1);
    assert_eq!(store.record_count(), 1);
}

#[tokio::test]
async fn permanent_failure_abandons_only_that_message() {
    let bad = item(
        "Inflation falls sharply in services",
        "https://bbc.co.uk/news/1",
        "BBC Business",
        Some(20),
    );
    let good = item(
        "Unemployment climbs in the north",
        "https://bbc.co.uk/news/2",
        "BBC Business",
        Some(5),
    );
    let store = Arc::new(MemoryStore::new());
    let channel = Arc::new(RecordingChannel::with_script(vec![
        DeliveryOutcome::Permanent("target not found".to_string()),
    ]));
    let fetcher = ScriptedFetcher::new(vec![vec![bad, good]]);
    let runner = runner(test_config(), store.clone(), fetcher, channel.clone());

    let stats = runner.run_cycle().await.unwrap();
    assert_eq!(stats.delivery_failed, 1);
    assert_eq!(stats.delivered, 1);
    assert_eq!(channel.sent().len(), 1);
    assert!(channel.sent()[0].1.contains("UNEMPLOYMENT"));
}

#[tokio::test]
async fn store_write_failure_is_fatal_for_the_cycle() {
    let mut config = test_config();
    config.grouping.enabled = false;

    let boe = item(
        "Bank of England raises interest rates to 5.25%",
        "https://bbc.co.uk/news/1",
        "BBC Business",
        Some(10),
    );
    let channel = Arc::new(RecordingChannel::default());
    let fetcher = ScriptedFetcher::new(vec![vec![boe]]);
    let runner = CycleRunner::new(
        config,
        Arc::new(InsertFailingStore {
            inner: MemoryStore::new(),
        }),
        Arc::new(fetcher),
        channel.clone(),
    );

    // The unrecordable item must surface as a cycle error, not be absorbed
    // into the per-item failure count while the loop keeps going.
    let result = runner.run_cycle().await;
    assert!(result.is_err());
    assert_eq!(channel.sent().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn send_delay_precedes_every_delivery() {
    let mut config = test_config();
    config.delivery.send_delay_seconds = 2;

    let first = item(
        "Inflation falls sharply in services",
        "https://bbc.co.uk/news/1",
        "BBC Business",
        Some(20),
    );
    let second = item(
        "Unemployment climbs in the north",
        "https://bbc.co.uk/news/2",
        "BBC Business",
        Some(5),
    );
    let store = Arc::new(MemoryStore::new());
    let channel = Arc::new(RecordingChannel::default());
    let fetcher = ScriptedFetcher::new(vec![vec![first, second]]);
    let runner = runner(config, store.clone(), fetcher, channel.clone());

    let started = tokio::time::Instant::now();
    let stats = runner.run_cycle().await.unwrap();
    assert_eq!(stats.delivered, 2);
    // Two sends, each preceded by the mandatory two-second pause.
    assert!(started.elapsed() >= StdDuration::from_secs(4));
}

#[tokio::test]
async fn category_without_target_is_recorded_not_sent() {
    let mut config = test_config();
    config.delivery.breaking_target = String::new();

    // Accepted by the gate ("strike" is whitelisted) but classified
    // BREAKING, whose target is unset.
    let strike = item(
        "Strike shuts rail network",
        "https://bbc.co.uk/news/1",
        "BBC News",
        Some(10),
    );
    let store = Arc::new(MemoryStore::new());
    let channel = Arc::new(RecordingChannel::default());
    let fetcher = ScriptedFetcher::new(vec![vec![strike]]);
    let runner = runner(config, store.clone(), fetcher, channel.clone());

    let stats = runner.run_cycle().await.unwrap();
    assert_eq!(stats.no_target, 1);
    assert_eq!(channel.sent().len(), 0);
    assert_eq!(store.record_count(), 1);
}

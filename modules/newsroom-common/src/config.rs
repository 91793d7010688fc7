//! TOML-backed configuration. Secrets (the bot token) stay as env vars.
//!
//! Every section has deployment defaults, so a partial file — or none, via
//! `FileConfig::default()` — yields a working config. Thresholds and keyword
//! lists are plain data here; the pipeline never reads globals.

use std::env;
use std::path::Path;

use anyhow::Result;
use serde::Deserialize;

use crate::error::NewsroomError;

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct FileConfig {
    pub service: ServiceConfig,
    pub dedup: DedupConfig,
    pub grouping: GroupingConfig,
    pub lockout: LockoutConfig,
    pub classifier: ClassifierConfig,
    pub scoring: ScoringConfig,
    pub delivery: DeliveryConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct ServiceConfig {
    /// Sleep between polling cycles, in seconds.
    pub poll_seconds: u64,
    /// Path to the SQLite database file.
    pub db_path: String,
    /// RSS/Atom feed URLs polled each cycle.
    pub feeds: Vec<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            poll_seconds: 600,
            db_path: "newsroom.db".to_string(),
            feeds: vec![
                "https://feeds.bbci.co.uk/news/uk/rss.xml".to_string(),
                "https://feeds.bbci.co.uk/news/world/rss.xml".to_string(),
                "https://feeds.bbci.co.uk/news/business/rss.xml".to_string(),
                "https://feeds.bbci.co.uk/sport/rss.xml".to_string(),
                "https://feeds.skynews.com/feeds/rss/uk.xml".to_string(),
                "https://feeds.skynews.com/feeds/rss/world.xml".to_string(),
                "https://www.ons.gov.uk/rss".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct DedupConfig {
    /// Fuzzy tier fires at or above this similarity ratio, in [0, 1].
    pub similarity_threshold: f64,
    /// Only records stored within this trailing window are fuzzy-compared.
    pub fuzzy_lookback_minutes: i64,
    /// Hard cap on records fetched for fuzzy comparison, newest first.
    pub fuzzy_max_records: u32,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.92,
            fuzzy_lookback_minutes: 180,
            fuzzy_max_records: 500,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct GroupingConfig {
    /// Disable to skip narrative grouping entirely.
    pub enabled: bool,
    /// A story fingerprint suppresses re-coverage for this long.
    pub event_ttl_minutes: i64,
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            event_ttl_minutes: 360,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct LockoutConfig {
    /// Items published earlier than (process start − this) are recorded but
    /// never delivered. Prevents a restart from flooding the channel.
    pub boot_lookback_minutes: i64,
}

impl Default for LockoutConfig {
    fn default() -> Self {
        Self {
            boot_lookback_minutes: 120,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct ClassifierConfig {
    pub sports: Vec<String>,
    #[serde(rename = "macro")]
    pub macro_terms: Vec<String>,
    pub politics: Vec<String>,
    pub celebrity: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            sports: to_strings(&[
                "football", "premier league", "goal", "fixture", "kick-off",
                "injury", "transfer", "manager", "coach", "club", "wicket",
                "grand slam",
            ]),
            macro_terms: to_strings(&[
                "inflation", "cpi", "ppi", "gdp", "recession", "interest rate",
                "interest rates", "bank of england", "boe", "bond yields",
                "gilts", "unemployment", "wages", "labour market", "sterling",
                "gbp", "pound",
            ]),
            politics: to_strings(&[
                "prime minister", "parliament", "mp", "mps", "labour",
                "conservative", "tory", "election", "government", "minister",
            ]),
            celebrity: to_strings(&[
                "royal", "prince", "princess", "king", "queen", "actor",
                "singer", "celebrity",
            ]),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct ScoringConfig {
    /// Accept threshold for the publish gate.
    pub accept_threshold: f64,
    /// Topically relevant terms; hits add a large positive weight and can
    /// override a blacklist hit.
    pub whitelist: Vec<String>,
    /// Human-interest/tragedy/noise terms; any hit adds a large negative weight.
    pub blacklist: Vec<String>,
    /// Domestic-relevance hints (place names, national institutions).
    pub regional_hints: Vec<String>,
    /// Domain trigger terms; smaller positive weight per hit.
    pub trigger_terms: Vec<String>,
    /// Curated high-signal source labels (matched against the source name).
    pub high_signal_sources: Vec<String>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            accept_threshold: 2.0,
            whitelist: to_strings(&[
                "inflation", "interest rate", "interest rates", "gdp",
                "recession", "bank of england", "budget", "tax", "energy prices",
                "strike", "nhs", "housing market", "unemployment",
            ]),
            blacklist: to_strings(&[
                "missing", "teenager", "teenage", "murder trial", "stabbing",
                "crash victim", "dies aged", "funeral", "lottery", "love island",
                "recipe", "horoscope",
            ]),
            regional_hints: to_strings(&[
                "uk", "britain", "british", "england", "scotland", "wales",
                "northern ireland", "london", "westminster", "downing street",
            ]),
            trigger_terms: to_strings(&[
                "rate rise", "rate cut", "base rate", "price cap", "bailout",
                "emergency", "shutdown", "default", "sanctions",
            ]),
            high_signal_sources: to_strings(&[
                "bbc news", "bbc business", "sky news", "ons",
                "office for national statistics",
            ]),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct DeliveryConfig {
    /// Per-category target chat ids. Empty string disables delivery for
    /// that category (items are still classified, gated, and recorded).
    pub breaking_target: String,
    pub macro_target: String,
    pub sports_target: String,
    /// Mandatory pause before every send.
    pub send_delay_seconds: u64,
    /// Fixed backoff after a transient delivery failure.
    pub transient_backoff_seconds: u64,
    /// Bounded retries for transient failures before abandoning a message.
    pub max_transient_retries: u32,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            breaking_target: String::new(),
            macro_target: String::new(),
            sports_target: String::new(),
            send_delay_seconds: 2,
            transient_backoff_seconds: 5,
            max_transient_retries: 3,
        }
    }
}

impl FileConfig {
    /// Load and parse a TOML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            NewsroomError::Config(format!("Failed to read {}: {e}", path.display()))
        })?;
        let config: FileConfig = toml::from_str(&content).map_err(|e| {
            NewsroomError::Config(format!("Failed to parse {}: {e}", path.display()))
        })?;
        Ok(config)
    }

    /// Target chat id for a category, or None if delivery for that category
    /// is disabled.
    pub fn target_for(&self, category: crate::types::Category) -> Option<&str> {
        let target = match category {
            crate::types::Category::Breaking => &self.delivery.breaking_target,
            crate::types::Category::Macro => &self.delivery.macro_target,
            crate::types::Category::Sports => &self.delivery.sports_target,
        };
        if target.is_empty() {
            None
        } else {
            Some(target)
        }
    }
}

/// Secrets loaded from the environment, never from the config file.
#[derive(Debug, Clone)]
pub struct Secrets {
    pub telegram_bot_token: String,
}

impl Secrets {
    pub fn from_env() -> Result<Self> {
        let telegram_bot_token = env::var("TELEGRAM_BOT_TOKEN").map_err(|_| {
            NewsroomError::Config("TELEGRAM_BOT_TOKEN environment variable is required".to_string())
        })?;
        Ok(Self { telegram_bot_token })
    }
}

fn to_strings(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

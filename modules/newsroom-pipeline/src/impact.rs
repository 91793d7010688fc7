//! Impact scoring and the publish gate.
//!
//! The score is a plain additive sum of independent signal checks so every
//! accept/reject is explainable from the config lists and a handful of
//! named weights. No normalization, no interaction terms.

use regex::Regex;

use newsroom_common::config::ScoringConfig;
use newsroom_common::NewsItem;

use crate::keywords::{any_term, count_terms};

/// Penalty applied once when any blacklist term is present.
const BLACKLIST_PENALTY: f64 = -3.0;
/// Bonus per whitelist term present.
const WHITELIST_BONUS: f64 = 2.0;
/// Bonus when a regional/domestic hint is present.
const REGIONAL_BONUS: f64 = 0.5;
/// Bonus when the title carries a number, currency amount, or percentage.
const NUMERIC_BONUS: f64 = 0.5;
/// Bonus when the source is on the curated high-signal list.
const HIGH_SIGNAL_SOURCE_BONUS: f64 = 0.5;
/// Bonus when a domain trigger term is present.
const TRIGGER_BONUS: f64 = 0.5;

/// Why the gate accepted or rejected an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateReason {
    Ok,
    Blacklist,
    LowImpact,
}

impl GateReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            GateReason::Ok => "ok",
            GateReason::Blacklist => "blacklist",
            GateReason::LowImpact => "low_impact",
        }
    }
}

/// The gate's verdict for one item. Rejected items are still recorded by
/// the cycle so they are never re-scored.
#[derive(Debug, Clone, PartialEq)]
pub struct GateDecision {
    pub accepted: bool,
    pub score: f64,
    pub reason: GateReason,
}

pub struct ImpactScorer {
    config: ScoringConfig,
    numeric: Regex,
}

impl ImpactScorer {
    pub fn new(config: ScoringConfig) -> Self {
        // Percentages, currency amounts, or magnitude-suffixed figures.
        let numeric = Regex::new(r"\d+(\.\d+)?%|[£$€]\s?\d|\b\d+(\.\d+)?\s?(bn|billion|million|trillion)\b")
            .expect("numeric signal pattern is valid");
        Self { config, numeric }
    }

    /// Additive impact score. Deterministic for a given item and config.
    pub fn score(&self, item: &NewsItem) -> f64 {
        let text = item.search_text();
        let source = item.source.to_lowercase();
        let mut score = 0.0;

        if any_term(&text, &self.config.blacklist) {
            score += BLACKLIST_PENALTY;
        }
        score += WHITELIST_BONUS * count_terms(&text, &self.config.whitelist) as f64;
        if any_term(&text, &self.config.regional_hints) {
            score += REGIONAL_BONUS;
        }
        if self.numeric.is_match(&item.title.to_lowercase()) {
            score += NUMERIC_BONUS;
        }
        if any_term(&source, &self.config.high_signal_sources) {
            score += HIGH_SIGNAL_SOURCE_BONUS;
        }
        if any_term(&text, &self.config.trigger_terms) {
            score += TRIGGER_BONUS;
        }

        score
    }

    /// The publish decision. A blacklist hit rejects unless a whitelist term
    /// overrides it or the score clears the threshold on its own; items with
    /// no whitelist backing must clear the threshold too.
    pub fn should_publish(&self, item: &NewsItem) -> GateDecision {
        let score = self.score(item);
        let text = item.search_text();
        let has_blacklist = any_term(&text, &self.config.blacklist);
        let has_whitelist = any_term(&text, &self.config.whitelist);
        let below_threshold = score < self.config.accept_threshold;

        let reason = if has_blacklist && !has_whitelist && below_threshold {
            GateReason::Blacklist
        } else if !has_whitelist && below_threshold {
            GateReason::LowImpact
        } else {
            GateReason::Ok
        };

        GateDecision {
            accepted: reason == GateReason::Ok,
            score,
            reason,
        }
    }
}

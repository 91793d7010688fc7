//! The evaluation pipeline: everything between "raw item arrived" and
//! "formatted message handed to the delivery channel".
//!
//! Stages run in a fixed order per item — exact/fuzzy dedup, boot lockout,
//! narrative grouping, classification, impact gate — and each terminal
//! branch records the item at most once. Evaluation is strictly sequential:
//! the store's check-then-insert pattern is only safe because a single
//! cycle runner writes at a time.

pub mod classifier;
pub mod cycle;
pub mod dedup;
pub mod grouper;
pub mod impact;
pub mod keywords;
pub mod message;
pub mod traits;

pub use classifier::classify;
pub use cycle::{CycleRunner, CycleStats};
pub use dedup::{DedupVerdict, DuplicateDetector};
pub use grouper::{GroupVerdict, NarrativeGrouper};
pub use impact::{GateDecision, GateReason, ImpactScorer};
pub use traits::{DeliveryChannel, DeliveryOutcome, ItemFetcher};

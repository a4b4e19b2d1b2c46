//! Confidence scoring for accepted statements.
//!
//! Combines classification strength, novelty relative to the nearest stored
//! neighbor, and source attribution into one `[0, 1]` score. The score is
//! informational metadata only — acceptance is decided solely by the dedup
//! engine.

use std::collections::BTreeMap;

use crate::config::ConfidenceConfig;

/// Score a candidate statement.
///
/// - `classification` — the per-topic scores from the classifier.
/// - `nearest_similarity` — cosine similarity of the nearest stored record,
///   `None` when the store is empty (maximally novel).
/// - `is_proxy` — statement was generated on the subject's behalf.
pub fn score(
    classification: &BTreeMap<String, f64>,
    nearest_similarity: Option<f64>,
    is_proxy: bool,
    config: &ConfidenceConfig,
) -> f64 {
    let max_topic = classification
        .values()
        .copied()
        .fold(0.0f64, f64::max)
        .clamp(0.0, 1.0);

    // Farther from the nearest neighbor = more confidently novel, capped.
    let distance = 1.0 - nearest_similarity.unwrap_or(0.0);
    let novelty = if config.novelty_cap > 0.0 {
        (distance.min(config.novelty_cap)) / config.novelty_cap
    } else {
        0.0
    };

    let mut value = config.classification_weight * max_topic + config.novelty_weight * novelty;
    if is_proxy {
        value -= config.proxy_penalty;
    }
    value.clamp(0.0, 1.0)
}

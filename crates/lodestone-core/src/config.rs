//! Engine configuration: matching policies and the pluggable callback seams.
//!
//! The three callbacks (extractor, normalizer, scorer) are stored as
//! `Arc<dyn Fn .. + Send + Sync>` so one configuration can be shared across
//! caller threads and so scorers handed to the fork-join combinators are
//! thread-safe by construction. All callbacks must be pure: the engine may
//! invoke them any number of times, from any thread, in any order.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::pipeline::{default_extractor, default_normalizer};
use crate::scoring::default_scorer;

/// Splits a raw keywords blob or query string into candidate tokens.
///
/// Token order is irrelevant; the pipeline deduplicates the output.
pub type KeywordsExtractor = Arc<dyn Fn(&str) -> Vec<String> + Send + Sync>;

/// Normalizes a single extracted token. Returning the empty string drops
/// the token.
pub type KeywordNormalizer = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Scores a query fragment against a keyword it matched. Must be pure and
/// return a non-negative value.
pub type MatchScorer = Arc<dyn Fn(&str, &str) -> f64 + Send + Sync>;

/// What to do when a query fragment matches no indexed fragment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmatchedPolicy {
    /// Only exact fragment lookups are attempted.
    Exact,
    /// Progressively trim the fragment's last character and retry until a
    /// match appears or a single character remains.
    #[default]
    Backtracking,
}

/// How per-fragment score maps are combined for multi-token queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccumulationPolicy {
    /// Keep every item that matched at least one fragment, summing scores.
    #[default]
    Union,
    /// Keep only items matched by every fragment, summing scores.
    /// Short-circuits as soon as the running intersection is empty.
    Intersection,
}

/// Complete engine configuration.
///
/// Construct via [`SearchEngine::builder`](crate::engine::SearchEngine::builder)
/// or start from `EngineConfig::default()` and replace individual fields.
#[derive(Clone)]
pub struct EngineConfig {
    /// Splits raw input into candidate tokens.
    pub keywords_extractor: KeywordsExtractor,
    /// Normalizes each token; empty output drops the token.
    pub keyword_normalizer: KeywordNormalizer,
    /// Scores a query fragment against a matched keyword.
    pub match_scorer: MatchScorer,
    /// Retry behavior for unmatched query fragments.
    pub unmatched_policy: UnmatchedPolicy,
    /// Combination strategy for multi-token queries.
    pub accumulation_policy: AccumulationPolicy,
    /// Dispatch per-fragment walks onto the rayon pool and tree-reduce.
    pub parallel_combine: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            keywords_extractor: Arc::new(default_extractor),
            keyword_normalizer: Arc::new(default_normalizer),
            match_scorer: Arc::new(default_scorer),
            unmatched_policy: UnmatchedPolicy::default(),
            accumulation_policy: AccumulationPolicy::default(),
            parallel_combine: false,
        }
    }
}

impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Callbacks are opaque; report only the declarative fields.
        f.debug_struct("EngineConfig")
            .field("unmatched_policy", &self.unmatched_policy)
            .field("accumulation_policy", &self.accumulation_policy)
            .field("parallel_combine", &self.parallel_combine)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_contract() {
        let config = EngineConfig::default();
        assert_eq!(config.unmatched_policy, UnmatchedPolicy::Backtracking);
        assert_eq!(config.accumulation_policy, AccumulationPolicy::Union);
        assert!(!config.parallel_combine);
    }

    #[test]
    fn policies_round_trip_json() {
        let encoded = serde_json::to_string(&UnmatchedPolicy::Backtracking).expect("serialize");
        assert_eq!(encoded, "\"backtracking\"");
        let decoded: AccumulationPolicy =
            serde_json::from_str("\"intersection\"").expect("deserialize");
        assert_eq!(decoded, AccumulationPolicy::Intersection);
    }

    #[test]
    fn debug_omits_callbacks() {
        let rendered = format!("{:?}", EngineConfig::default());
        assert!(rendered.contains("unmatched_policy"));
        assert!(!rendered.contains("keywords_extractor"));
    }
}

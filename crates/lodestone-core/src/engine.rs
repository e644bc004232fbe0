//! The search engine façade: configuration, ingestion, and queries.
//!
//! [`SearchEngine`] binds the input pipeline, the fragment graph, the
//! backtracking controller, and the combinators behind the public API.
//! The engine is passive: it owns no threads (beyond rayon tasks while a
//! parallel combine is in flight) and performs no I/O.
//!
//! # Concurrency
//!
//! The graph sits behind a readers/writer lock. Queries and read accessors
//! share the lock; `add_item`, `remove_item`, and `clear` take it
//! exclusively, so every mutation is atomic to observers and every query
//! sees one consistent snapshot. User callbacks run *before* the write
//! lock is acquired; a panicking extractor or normalizer therefore cannot
//! leave a half-applied mutation behind.
//!
//! Invalid requests (empty query or keywords, zero limit, nothing
//! surviving normalization) return the empty analogue of the result type
//! rather than an error.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::hash::Hash;

use parking_lot::RwLock;
use tracing::{debug, instrument, trace};

use crate::combine::{self, ScoreMap};
use crate::config::{AccumulationPolicy, EngineConfig, UnmatchedPolicy};
use crate::graph::FragmentGraph;
use crate::pipeline::prepare_keywords;
use crate::types::{ItemDetail, SearchReport, Stats};

/// In-memory incremental-substring search engine.
///
/// Items of an opaque payload type `T` are registered with free-form
/// keyword strings; queries match any contiguous substring of any keyword
/// and return the best-scoring items. Multiple engines may coexist; there
/// is no process-wide state.
///
/// # Example
///
/// ```
/// use lodestone_core::SearchEngine;
///
/// let engine = SearchEngine::new();
/// engine.add_item("Villain", "Roy Batty Lord Voldemort Colonel Kurtz");
/// engine.add_item("Hero", "Walt Kowalski Jake Blues Shaun");
///
/// assert_eq!(engine.find_item("walk"), Some("Hero"));
/// ```
pub struct SearchEngine<T> {
    config: EngineConfig,
    graph: RwLock<FragmentGraph<T>>,
}

/// Fluent configuration for [`SearchEngine`].
///
/// Obtained from [`SearchEngine::builder`]; every option has the default
/// documented on [`EngineConfig`].
#[derive(Default)]
pub struct SearchEngineBuilder {
    config: EngineConfig,
}

impl SearchEngineBuilder {
    /// Replaces the keywords extractor (raw string → candidate tokens).
    pub fn keywords_extractor(
        mut self,
        extractor: impl Fn(&str) -> Vec<String> + Send + Sync + 'static,
    ) -> Self {
        self.config.keywords_extractor = std::sync::Arc::new(extractor);
        self
    }

    /// Replaces the per-token normalizer. Returning the empty string drops
    /// the token.
    pub fn keyword_normalizer(
        mut self,
        normalizer: impl Fn(&str) -> String + Send + Sync + 'static,
    ) -> Self {
        self.config.keyword_normalizer = std::sync::Arc::new(normalizer);
        self
    }

    /// Replaces the match scorer. Must be pure; it may run from multiple
    /// threads when parallel combining is enabled.
    pub fn match_scorer(
        mut self,
        scorer: impl Fn(&str, &str) -> f64 + Send + Sync + 'static,
    ) -> Self {
        self.config.match_scorer = std::sync::Arc::new(scorer);
        self
    }

    /// Sets the retry behavior for unmatched query fragments.
    pub fn unmatched_policy(mut self, policy: UnmatchedPolicy) -> Self {
        self.config.unmatched_policy = policy;
        self
    }

    /// Sets the combination strategy for multi-token queries.
    pub fn accumulation_policy(mut self, policy: AccumulationPolicy) -> Self {
        self.config.accumulation_policy = policy;
        self
    }

    /// Enables or disables fork-join dispatch of per-fragment walks.
    pub fn parallel_combine(mut self, enabled: bool) -> Self {
        self.config.parallel_combine = enabled;
        self
    }

    /// Builds the engine.
    pub fn build<T>(self) -> SearchEngine<T>
    where
        T: Clone + Eq + Hash + Send + Sync,
    {
        SearchEngine::with_config(self.config)
    }
}

impl<T> SearchEngine<T>
where
    T: Clone + Eq + Hash + Send + Sync,
{
    /// Creates an engine with the default configuration.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Creates an engine from an explicit configuration.
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            graph: RwLock::new(FragmentGraph::new()),
        }
    }

    /// Starts building a custom-configured engine.
    pub fn builder() -> SearchEngineBuilder {
        SearchEngineBuilder::default()
    }

    /// Indexes `item` under the keywords extracted from `keywords`.
    ///
    /// Re-adding an existing item merges any new keywords into its set.
    /// Returns `true` when at least one keyword survived the pipeline and
    /// the item was indexed; `false` when the input was empty or collapsed
    /// to nothing under normalization (the item is then left untouched).
    #[instrument(skip_all, fields(keywords_len = keywords.len()))]
    pub fn add_item(&self, item: T, keywords: &str) -> bool {
        if keywords.is_empty() {
            return false;
        }

        let prepared = prepare_keywords(
            keywords,
            &self.config.keywords_extractor,
            &self.config.keyword_normalizer,
        );
        if prepared.is_empty() {
            debug!("no keywords survived the pipeline; item ignored");
            return false;
        }

        self.graph.write().register(item, &prepared)
    }

    /// Removes `item` and all of its keyword associations. Unknown items
    /// are a no-op.
    pub fn remove_item(&self, item: &T) {
        self.graph.write().unregister(item);
    }

    /// Returns the normalized keywords currently registered for `item`.
    pub fn keywords_of(&self, item: &T) -> BTreeSet<String> {
        self.graph.read().keywords_of(item)
    }

    /// Returns the top-scoring item for `query`, if any.
    pub fn find_item(&self, query: &str) -> Option<T> {
        self.search(query, 1).into_iter().next().map(|(item, _)| item)
    }

    /// Returns up to `limit` items for `query`, best first.
    pub fn find_items(&self, query: &str, limit: usize) -> Vec<T> {
        self.search(query, limit)
            .into_iter()
            .map(|(item, _)| item)
            .collect()
    }

    /// Like [`find_item`](Self::find_item), augmented with the item's
    /// current keywords and its score.
    pub fn find_item_with_detail(&self, query: &str) -> Option<ItemDetail<T>> {
        let (item, score) = self.search(query, 1).into_iter().next()?;
        let keywords = self.graph.read().keywords_of(&item);
        Some(ItemDetail {
            item,
            keywords,
            score,
        })
    }

    /// Like [`find_items`](Self::find_items), augmented with per-item
    /// keywords and scores and echoing the raw query string.
    ///
    /// The echo is preserved even when the query is invalid or matched
    /// nothing.
    pub fn find_items_with_detail(&self, query: &str, limit: usize) -> SearchReport<T> {
        let scored = self.search(query, limit);
        if scored.is_empty() {
            return SearchReport::empty(query);
        }

        let graph = self.graph.read();
        SearchReport {
            query: query.to_string(),
            hits: scored
                .into_iter()
                .map(|(item, score)| ItemDetail {
                    keywords: graph.keywords_of(&item),
                    item,
                    score,
                })
                .collect(),
        }
    }

    /// Removes every item, keyword, and fragment.
    pub fn clear(&self) {
        self.graph.write().clear();
    }

    /// O(1) size snapshot of the underlying graph.
    pub fn stats(&self) -> Stats {
        self.graph.read().stats()
    }

    /// Runs the full query path: pipeline → per-fragment walks (with
    /// backtracking) → combination → top-`limit` selection.
    #[instrument(skip_all, fields(query_len = query.len(), limit))]
    fn search(&self, query: &str, limit: usize) -> Vec<(T, f64)> {
        if query.is_empty() || limit == 0 {
            return Vec::new();
        }

        let prepared = prepare_keywords(
            query,
            &self.config.keywords_extractor,
            &self.config.keyword_normalizer,
        );
        if prepared.is_empty() {
            return Vec::new();
        }

        // Sorted fragment order keeps merge order, and therefore
        // floating-point sums, independent of hash iteration.
        let mut fragments: Vec<String> = prepared.into_iter().collect();
        fragments.sort_unstable();

        // One read guard for the whole query: a consistent snapshot.
        let graph = self.graph.read();
        let scorer = self.config.match_scorer.as_ref();
        let policy = self.config.unmatched_policy;
        let walk = |fragment: &str| walk_with_backoff(&graph, fragment, &scorer, policy);

        let scores = if fragments.len() == 1 {
            walk(&fragments[0])
        } else {
            match (self.config.accumulation_policy, self.config.parallel_combine) {
                (AccumulationPolicy::Union, false) => combine::union_all(&fragments, &walk),
                (AccumulationPolicy::Union, true) => combine::union_all_parallel(&fragments, &walk),
                (AccumulationPolicy::Intersection, false) => {
                    combine::intersect_all(&fragments, &walk)
                }
                (AccumulationPolicy::Intersection, true) => {
                    combine::intersect_all_parallel(&fragments, &walk)
                }
            }
        };
        drop(graph);

        debug!(matched = scores.len(), "query scored");
        sort_and_limit(scores, limit)
    }
}

impl<T> Default for SearchEngine<T>
where
    T: Clone + Eq + Hash + Send + Sync,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Walks one fragment, applying the unmatched policy: under
/// [`UnmatchedPolicy::Backtracking`] an empty result retries with the last
/// character trimmed, until a match appears or one character remains.
///
/// A query fragment of L characters therefore walks at most L times.
fn walk_with_backoff<T, F>(
    graph: &FragmentGraph<T>,
    fragment: &str,
    scorer: F,
    policy: UnmatchedPolicy,
) -> ScoreMap<T>
where
    T: Clone + Eq + Hash,
    F: Fn(&str, &str) -> f64 + Copy,
{
    let mut current = fragment;
    loop {
        let scores = graph.walk_and_score(current, scorer);
        if !scores.is_empty() || policy == UnmatchedPolicy::Exact {
            return scores;
        }
        match current.char_indices().last() {
            Some((boundary, _)) if boundary > 0 => {
                trace!(fragment = %current, "backtracking unmatched fragment");
                current = &current[..boundary];
            }
            _ => return scores,
        }
    }
}

/// Selects the `limit` highest-scoring entries, descending.
///
/// For maps larger than `limit` the top entries are partitioned out first
/// so only the returned prefix is sorted. Ties at the cutoff keep whichever
/// tied items the partition left in the prefix; all items sharing the
/// k-th highest score are eligible.
fn sort_and_limit<T>(scores: ScoreMap<T>, limit: usize) -> Vec<(T, f64)> {
    if limit == 0 {
        return Vec::new();
    }

    let mut hits: Vec<(T, f64)> = scores.into_iter().collect();
    let descending =
        |a: &(T, f64), b: &(T, f64)| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal);

    if hits.len() > limit {
        hits.select_nth_unstable_by(limit - 1, descending);
        hits.truncate(limit);
    }
    hits.sort_by(descending);
    hits
}

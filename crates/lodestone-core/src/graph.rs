//! The fragment graph: the indexed store behind every query.
//!
//! The graph is a bipartite many-to-many relation between *fragments*
//! (contiguous substrings of keywords) and *keywords* (whole normalized
//! tokens), plus the item sets hanging off each keyword. It is held as
//! three dictionaries with no back-pointers:
//!
//! - `item_keywords`: item → set of keywords registered for it
//! - `keyword_items`: keyword → set of items carrying it
//! - `fragment_edges`: fragment → (keyword → reference count)
//!
//! Registering a keyword of L characters materializes all L·(L+1)/2
//! contiguous substrings. Reference counts are per source position: the
//! keyword `banana` contributes 2 to the `an → banana` edge because `an`
//! occurs at two positions. Removal decrements through the identical
//! enumeration, so the two directions stay symmetric.
//!
//! Structural invariants, preserved by every mutation:
//!
//! 1. A keyword node exists iff at least one item references it.
//! 2. A fragment→keyword edge exists iff its reference count is ≥ 1.
//! 3. A fragment node exists iff it has at least one outbound edge.
//! 4. Every contiguous substring of a present keyword maps back to it.
//!
//! Keyword and fragment strings are interned as `Arc<str>`: each distinct
//! string is stored once no matter how many edges reference it. The inner
//! edge maps are ordered by keyword so walks visit keywords in a stable
//! order and per-item floating-point sums are reproducible.
//!
//! The graph itself is single-threaded; the engine wraps it in a
//! readers/writer lock.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::hash::Hash;
use std::sync::Arc;

use tracing::debug;

use crate::types::Stats;

/// In-memory index mapping fragments to keywords to items.
///
/// `T` is the caller's opaque payload; the graph stores clones and never
/// mutates them.
#[derive(Debug, Clone, Default)]
pub struct FragmentGraph<T> {
    /// Item → keywords registered for it.
    item_keywords: HashMap<T, HashSet<Arc<str>>>,
    /// Keyword → items carrying it.
    keyword_items: HashMap<Arc<str>, HashSet<T>>,
    /// Fragment → keywords containing it, with per-position reference counts.
    fragment_edges: HashMap<Arc<str>, BTreeMap<Arc<str>, usize>>,
}

impl<T> FragmentGraph<T>
where
    T: Clone + Eq + Hash,
{
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self {
            item_keywords: HashMap::new(),
            keyword_items: HashMap::new(),
            fragment_edges: HashMap::new(),
        }
    }

    /// Registers `item` under every keyword in `keywords`, creating keyword
    /// and fragment nodes as needed.
    ///
    /// Re-registering an existing item merges the new keywords into its
    /// set. Returns `false` without touching the graph when `keywords` is
    /// empty.
    ///
    /// Substring reference counts are incremented only when a keyword node
    /// is first created; a second item carrying the same keyword reuses the
    /// existing fragment edges.
    pub fn register(&mut self, item: T, keywords: &HashSet<String>) -> bool {
        if keywords.is_empty() {
            return false;
        }

        let mut interned = Vec::with_capacity(keywords.len());
        for keyword in keywords {
            let node = match self.keyword_items.get_key_value(keyword.as_str()) {
                Some((existing, _)) => existing.clone(),
                None => {
                    let created: Arc<str> = Arc::from(keyword.as_str());
                    self.keyword_items.insert(created.clone(), HashSet::new());
                    Self::index_fragments(&mut self.fragment_edges, &created);
                    created
                }
            };
            self.keyword_items
                .get_mut(&node)
                .expect("keyword node inserted above")
                .insert(item.clone());
            interned.push(node);
        }
        self.item_keywords.entry(item).or_default().extend(interned);

        debug!(
            keywords = keywords.len(),
            fragments = self.fragment_edges.len(),
            "registered item"
        );
        true
    }

    /// Removes `item` and everything only it was keeping alive: keywords
    /// whose item set becomes empty, and in turn fragment edges and
    /// fragment nodes whose reference counts drain to zero.
    ///
    /// Unknown items are a no-op, so the operation is idempotent.
    pub fn unregister(&mut self, item: &T) {
        let Some(keywords) = self.item_keywords.remove(item) else {
            return;
        };

        for keyword in &keywords {
            let Some(items) = self.keyword_items.get_mut(keyword) else {
                continue;
            };
            items.remove(item);
            if items.is_empty() {
                self.keyword_items.remove(keyword);
                Self::unindex_fragments(&mut self.fragment_edges, keyword);
            }
        }

        debug!(keywords = keywords.len(), "unregistered item");
    }

    /// Returns the keywords currently registered for `item`, or the empty
    /// set for unknown items.
    pub fn keywords_of(&self, item: &T) -> BTreeSet<String> {
        self.item_keywords
            .get(item)
            .map(|keywords| keywords.iter().map(|k| k.to_string()).collect())
            .unwrap_or_default()
    }

    /// Walks from the fragment node for `fragment` to every keyword
    /// containing it, scoring each `(fragment, keyword)` pair with `scorer`
    /// and summing per item.
    ///
    /// Returns the empty map when the fragment is not indexed.
    pub fn walk_and_score<F>(&self, fragment: &str, scorer: F) -> HashMap<T, f64>
    where
        F: Fn(&str, &str) -> f64,
    {
        let mut scores = HashMap::new();
        let Some(reachable) = self.fragment_edges.get(fragment) else {
            return scores;
        };

        for keyword in reachable.keys() {
            let score = scorer(fragment, keyword);
            let Some(items) = self.keyword_items.get(keyword) else {
                continue;
            };
            for item in items {
                *scores.entry(item.clone()).or_insert(0.0) += score;
            }
        }
        scores
    }

    /// Drops all items, keywords, and fragments.
    pub fn clear(&mut self) {
        self.item_keywords.clear();
        self.keyword_items.clear();
        self.fragment_edges.clear();
    }

    /// O(1) snapshot of the three node counts.
    pub fn stats(&self) -> Stats {
        Stats {
            items: self.item_keywords.len(),
            keywords: self.keyword_items.len(),
            fragments: self.fragment_edges.len(),
        }
    }

    /// Increments the reference count on every `(substring → keyword)` edge
    /// of a newly created keyword node.
    fn index_fragments(
        edges: &mut HashMap<Arc<str>, BTreeMap<Arc<str>, usize>>,
        keyword: &Arc<str>,
    ) {
        for_each_fragment(keyword, |fragment| {
            let node = match edges.get_key_value(fragment) {
                Some((existing, _)) => existing.clone(),
                None => Arc::from(fragment),
            };
            *edges
                .entry(node)
                .or_default()
                .entry(keyword.clone())
                .or_insert(0) += 1;
        });
    }

    /// Mirrors [`Self::index_fragments`]: decrements through the same
    /// enumeration, removing drained edges and orphaned fragment nodes.
    fn unindex_fragments(
        edges: &mut HashMap<Arc<str>, BTreeMap<Arc<str>, usize>>,
        keyword: &Arc<str>,
    ) {
        for_each_fragment(keyword, |fragment| {
            let Some(per_keyword) = edges.get_mut(fragment) else {
                return;
            };
            if let Some(count) = per_keyword.get_mut(keyword) {
                *count -= 1;
                if *count == 0 {
                    per_keyword.remove(keyword);
                }
            }
            if per_keyword.is_empty() {
                edges.remove(fragment);
            }
        });
    }

    /// Reference count on the `fragment → keyword` edge, 0 when absent.
    #[cfg(test)]
    fn reference_count(&self, fragment: &str, keyword: &str) -> usize {
        self.fragment_edges
            .get(fragment)
            .and_then(|per_keyword| per_keyword.get(keyword))
            .copied()
            .unwrap_or(0)
    }
}

/// Invokes `apply` for every contiguous substring of `keyword`, one call
/// per (start, end) position pair. Substring boundaries are char
/// boundaries, so multi-byte keywords enumerate correctly.
fn for_each_fragment(keyword: &str, mut apply: impl FnMut(&str)) {
    let bounds: Vec<usize> = keyword
        .char_indices()
        .map(|(at, _)| at)
        .chain(std::iter::once(keyword.len()))
        .collect();

    for start in 0..bounds.len() - 1 {
        for end in start + 1..bounds.len() {
            apply(&keyword[bounds[start]..bounds[end]]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::default_scorer;

    fn keywords(tokens: &[&str]) -> HashSet<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn register_indexes_every_substring() {
        let mut graph = FragmentGraph::new();
        assert!(graph.register("item", &keywords(&["cat"])));

        // c, a, t, ca, at, cat
        assert_eq!(graph.stats(), Stats { items: 1, keywords: 1, fragments: 6 });
        for fragment in ["c", "a", "t", "ca", "at", "cat"] {
            let scores = graph.walk_and_score(fragment, default_scorer);
            assert!(scores.contains_key("item"), "missing fragment {fragment}");
        }
    }

    #[test]
    fn register_with_no_keywords_is_ignored() {
        let mut graph = FragmentGraph::<&str>::new();
        assert!(!graph.register("item", &HashSet::new()));
        assert!(graph.stats().is_empty());
    }

    #[test]
    fn repeated_substrings_count_per_position() {
        let mut graph = FragmentGraph::new();
        graph.register("item", &keywords(&["banana"]));

        assert_eq!(graph.reference_count("an", "banana"), 2);
        assert_eq!(graph.reference_count("ana", "banana"), 2);
        assert_eq!(graph.reference_count("a", "banana"), 3);
        assert_eq!(graph.reference_count("banana", "banana"), 1);
        // 15 distinct substrings of "banana".
        assert_eq!(graph.stats().fragments, 15);
    }

    #[test]
    fn second_item_with_same_keyword_reuses_edges() {
        let mut graph = FragmentGraph::new();
        graph.register("first", &keywords(&["manager"]));
        let before = graph.reference_count("ana", "manager");

        graph.register("second", &keywords(&["manager"]));
        assert_eq!(graph.reference_count("ana", "manager"), before);
        assert_eq!(graph.stats().items, 2);
        assert_eq!(graph.stats().keywords, 1);
    }

    #[test]
    fn reregistering_merges_keywords() {
        let mut graph = FragmentGraph::new();
        graph.register("item", &keywords(&["red"]));
        graph.register("item", &keywords(&["blue"]));

        let known = graph.keywords_of(&"item");
        assert!(known.contains("red"));
        assert!(known.contains("blue"));
        assert_eq!(graph.stats().items, 1);
        assert_eq!(graph.stats().keywords, 2);
    }

    #[test]
    fn unregister_drains_everything_it_owned() {
        let mut graph = FragmentGraph::new();
        graph.register("item", &keywords(&["banana", "split"]));
        graph.unregister(&"item");

        assert!(graph.stats().is_empty());
        assert!(graph.walk_and_score("ana", default_scorer).is_empty());
    }

    #[test]
    fn unregister_keeps_keywords_shared_with_other_items() {
        let mut graph = FragmentGraph::new();
        graph.register("first", &keywords(&["manager"]));
        graph.register("second", &keywords(&["manager", "crypto"]));

        graph.unregister(&"first");

        let scores = graph.walk_and_score("mana", default_scorer);
        assert!(!scores.contains_key("first"));
        assert!(scores.contains_key("second"));
        assert_eq!(graph.stats().keywords, 2);
    }

    #[test]
    fn shared_fragment_survives_partial_removal() {
        let mut graph = FragmentGraph::new();
        graph.register("a", &keywords(&["cat"]));
        graph.register("b", &keywords(&["category"]));

        // "cat" is a fragment of both keywords.
        assert_eq!(graph.reference_count("cat", "cat"), 1);
        assert_eq!(graph.reference_count("cat", "category"), 1);

        graph.unregister(&"a");
        assert_eq!(graph.reference_count("cat", "cat"), 0);
        assert_eq!(graph.reference_count("cat", "category"), 1);
        assert!(graph
            .walk_and_score("cat", default_scorer)
            .contains_key("b"));
    }

    #[test]
    fn unregister_unknown_item_is_noop() {
        let mut graph = FragmentGraph::new();
        graph.register("item", &keywords(&["cat"]));
        let before = graph.stats();

        graph.unregister(&"ghost");
        graph.unregister(&"item");
        graph.unregister(&"item");

        assert_eq!(before.items, 1);
        assert!(graph.stats().is_empty());
    }

    #[test]
    fn walk_sums_scores_over_matching_keywords() {
        let mut graph = FragmentGraph::new();
        graph.register("item", &keywords(&["cat", "catalog"]));

        let scores = graph.walk_and_score("cat", default_scorer);
        let expected = default_scorer("cat", "cat") + default_scorer("cat", "catalog");
        assert!((scores["item"] - expected).abs() < 1e-12);
    }

    #[test]
    fn walk_of_unknown_fragment_is_empty() {
        let mut graph = FragmentGraph::new();
        graph.register("item", &keywords(&["cat"]));
        assert!(graph.walk_and_score("dog", default_scorer).is_empty());
    }

    #[test]
    fn multibyte_keywords_enumerate_on_char_boundaries() {
        let mut graph = FragmentGraph::new();
        graph.register("item", &keywords(&["éclair"]));

        // 6 chars -> 21 substrings, all distinct here.
        assert_eq!(graph.stats().fragments, 21);
        assert!(graph.walk_and_score("é", default_scorer).contains_key("item"));
        assert!(graph
            .walk_and_score("clai", default_scorer)
            .contains_key("item"));
    }

    #[test]
    fn clear_resets_all_maps() {
        let mut graph = FragmentGraph::new();
        graph.register("a", &keywords(&["one", "two"]));
        graph.register("b", &keywords(&["three"]));

        graph.clear();
        assert!(graph.stats().is_empty());
        assert!(graph.keywords_of(&"a").is_empty());
    }

    #[test]
    fn fragment_enumeration_covers_all_positions() {
        let mut seen = Vec::new();
        for_each_fragment("aba", |fragment| seen.push(fragment.to_string()));
        assert_eq!(seen, vec!["a", "ab", "aba", "b", "ba", "a"]);
    }
}

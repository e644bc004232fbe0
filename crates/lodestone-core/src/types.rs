//! Result records and index statistics.
//!
//! These are the shapes handed back across the public API: plain data,
//! cloned out of the index so callers never hold references into it.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A matched item together with the metadata a type-ahead UI typically
/// renders next to it.
///
/// The keyword set reflects the item's registration state at the time the
/// detail was assembled, not at the time the query was scored; the two can
/// differ if a writer ran in between.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemDetail<T> {
    /// The matched payload.
    pub item: T,
    /// All normalized keywords currently registered for the item.
    pub keywords: BTreeSet<String>,
    /// Accumulated score summed over every matching keyword.
    pub score: f64,
}

/// Full response for a detail query: the raw query string echoed back plus
/// the ranked hits.
///
/// The echo is preserved even when the query is invalid or matches nothing,
/// so UIs can correlate stale responses with the input field.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchReport<T> {
    /// The raw query string as supplied by the caller.
    pub query: String,
    /// Hits in descending score order, at most the requested limit.
    pub hits: Vec<ItemDetail<T>>,
}

impl<T> SearchReport<T> {
    /// An empty report echoing `query`.
    pub fn empty(query: &str) -> Self {
        Self {
            query: query.to_string(),
            hits: Vec::new(),
        }
    }
}

/// O(1) snapshot of index size, used by tests and host observability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    /// Number of registered items.
    pub items: usize,
    /// Number of distinct normalized keywords.
    pub keywords: usize,
    /// Number of distinct fragment nodes.
    pub fragments: usize,
}

impl Stats {
    /// Whether the index holds nothing at all.
    pub fn is_empty(&self) -> bool {
        self.items == 0 && self.keywords == 0 && self.fragments == 0
    }
}

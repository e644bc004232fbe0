//! Union and intersection combinators over per-fragment score maps.
//!
//! A multi-token query produces one `item → score` map per fragment; these
//! functions collapse them into a single map. Union keeps every item that
//! matched at least one fragment; intersection keeps only items matched by
//! every fragment. Both sum scores for coinciding items, and both merges
//! prefer to rebuild the smaller operand.
//!
//! The parallel variants dispatch the per-fragment walks onto the rayon
//! pool and combine with a divide-and-conquer reduction (leaves of at most
//! two fragments). The reduction tree yields the same membership as the
//! sequential fold; floating-point sums may differ in the last bits because
//! addition order differs, which the engine's contract permits.

use std::collections::HashMap;
use std::hash::Hash;

/// Accumulated scores for one or more fragments.
pub type ScoreMap<T> = HashMap<T, f64>;

/// Merges two score maps keeping every key, summing values for keys present
/// in both.
pub fn merge_union<T>(left: ScoreMap<T>, right: ScoreMap<T>) -> ScoreMap<T>
where
    T: Eq + Hash,
{
    // Fold the smaller map into the bigger one.
    let (mut into, from) = if left.len() >= right.len() {
        (left, right)
    } else {
        (right, left)
    };
    for (item, score) in from {
        *into.entry(item).or_insert(0.0) += score;
    }
    into
}

/// Merges two score maps keeping only keys present in both, summing their
/// values. Returns the empty map when the key sets are disjoint.
pub fn merge_intersection<T>(left: ScoreMap<T>, right: ScoreMap<T>) -> ScoreMap<T>
where
    T: Eq + Hash,
{
    // Retain on the smaller map; lookups go against the bigger one.
    let (mut kept, other) = if left.len() <= right.len() {
        (left, right)
    } else {
        (right, left)
    };
    kept.retain(|item, _| other.contains_key(item));
    for (item, score) in kept.iter_mut() {
        if let Some(extra) = other.get(item) {
            *score += extra;
        }
    }
    kept
}

/// Sequential union over `fragments`, walking each in order.
pub fn union_all<T, F>(fragments: &[String], walk: &F) -> ScoreMap<T>
where
    T: Eq + Hash,
    F: Fn(&str) -> ScoreMap<T>,
{
    let mut accumulated = ScoreMap::new();
    for fragment in fragments {
        accumulated = merge_union(accumulated, walk(fragment));
    }
    accumulated
}

/// Sequential intersection over `fragments`.
///
/// The accumulator only ever shrinks, so the fold returns the empty map the
/// moment any fragment produces no matches or the running intersection
/// drains.
pub fn intersect_all<T, F>(fragments: &[String], walk: &F) -> ScoreMap<T>
where
    T: Eq + Hash,
    F: Fn(&str) -> ScoreMap<T>,
{
    let mut accumulated: Option<ScoreMap<T>> = None;
    for fragment in fragments {
        let scores = walk(fragment);
        if scores.is_empty() {
            return ScoreMap::new();
        }
        accumulated = Some(match accumulated {
            None => scores,
            Some(previous) => {
                let merged = merge_intersection(previous, scores);
                if merged.is_empty() {
                    return merged;
                }
                merged
            }
        });
    }
    accumulated.unwrap_or_default()
}

/// Parallel union: walks run as rayon tasks, combined by a reduction tree.
pub fn union_all_parallel<T, F>(fragments: &[String], walk: &F) -> ScoreMap<T>
where
    T: Eq + Hash + Send,
    F: Fn(&str) -> ScoreMap<T> + Sync,
{
    reduce_parallel(fragments, walk, &merge_union)
}

/// Parallel intersection via the same reduction tree.
///
/// Unlike the sequential fold this cannot short-circuit globally, but an
/// empty map at any leaf empties every merge above it.
pub fn intersect_all_parallel<T, F>(fragments: &[String], walk: &F) -> ScoreMap<T>
where
    T: Eq + Hash + Send,
    F: Fn(&str) -> ScoreMap<T> + Sync,
{
    reduce_parallel(fragments, walk, &merge_intersection)
}

/// Divide-and-conquer reduction: split the fragment slice in half, walk the
/// halves concurrently, merge pairwise on the way back up. Leaves of one or
/// two fragments keep task granularity coarse enough to amortize overhead.
fn reduce_parallel<T, F, M>(fragments: &[String], walk: &F, merge: &M) -> ScoreMap<T>
where
    T: Eq + Hash + Send,
    F: Fn(&str) -> ScoreMap<T> + Sync,
    M: Fn(ScoreMap<T>, ScoreMap<T>) -> ScoreMap<T> + Sync,
{
    match fragments {
        [] => ScoreMap::new(),
        [only] => walk(only),
        [first, second] => merge(walk(first), walk(second)),
        _ => {
            let (left, right) = fragments.split_at(fragments.len() / 2);
            let (left_scores, right_scores) = rayon::join(
                || reduce_parallel(left, walk, merge),
                || reduce_parallel(right, walk, merge),
            );
            merge(left_scores, right_scores)
        }
    }
}

//! Input pipeline: raw strings in, deduplicated normalized keyword sets out.
//!
//! Every string entering the engine, whether a keyword blob on insertion
//! or a user query on search, passes through the same two stages:
//!
//! 1. **Extract**: split the raw string into candidate tokens. The default
//!    treats any run of non-word characters as a separator, so
//!    `"one two,three-four"` and `"one$two%three^four"` both yield four
//!    tokens.
//! 2. **Normalize**: clean each token individually. The default trims
//!    surrounding whitespace and lowercases. A token normalizing to the
//!    empty string is dropped.
//!
//! The surviving tokens are deduplicated into a set. This module is the
//! only place user-supplied callbacks run; the graph layer sees nothing but
//! non-empty normalized strings.

use std::collections::HashSet;

use tracing::trace;

use crate::config::{KeywordNormalizer, KeywordsExtractor};

/// Default keywords extractor: split on runs of non-word characters.
///
/// A word character is anything alphanumeric plus `_`, so punctuation,
/// symbols, and whitespace all separate tokens.
pub fn default_extractor(raw: &str) -> Vec<String> {
    raw.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Default keyword normalizer: trim surrounding whitespace and lowercase.
pub fn default_normalizer(token: &str) -> String {
    token.trim().to_lowercase()
}

/// Runs the extractor and normalizer over `raw` and deduplicates the
/// surviving tokens.
///
/// Returns the empty set when nothing survives, which callers treat as an
/// invalid (ignored) request rather than an error.
pub(crate) fn prepare_keywords(
    raw: &str,
    extractor: &KeywordsExtractor,
    normalizer: &KeywordNormalizer,
) -> HashSet<String> {
    let mut keywords = HashSet::new();
    for token in extractor(raw) {
        let normalized = normalizer(&token);
        if normalized.is_empty() {
            trace!(token = %token, "token dropped by normalizer");
            continue;
        }
        keywords.insert(normalized);
    }
    keywords
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn prepare_with_defaults(raw: &str) -> HashSet<String> {
        prepare_keywords(
            raw,
            &(Arc::new(default_extractor) as KeywordsExtractor),
            &(Arc::new(default_normalizer) as KeywordNormalizer),
        )
    }

    fn set(tokens: &[&str]) -> HashSet<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn extractor_splits_on_punctuation_and_whitespace() {
        assert_eq!(
            default_extractor("one two,three-four"),
            vec!["one", "two", "three", "four"]
        );
        assert_eq!(
            default_extractor("one$two%three^four"),
            vec!["one", "two", "three", "four"]
        );
    }

    #[test]
    fn extractor_keeps_underscores_and_digits() {
        assert_eq!(
            default_extractor("user_id 1234"),
            vec!["user_id", "1234"]
        );
    }

    #[test]
    fn extractor_of_only_separators_is_empty() {
        assert!(default_extractor("  ,,, --- !!! ").is_empty());
    }

    #[test]
    fn normalizer_trims_and_lowercases() {
        assert_eq!(default_normalizer("  New York  "), "new york");
        assert_eq!(default_normalizer("PYTHON"), "python");
    }

    #[test]
    fn prepare_deduplicates_after_normalization() {
        // "Cat" and "cat" collapse to one keyword.
        assert_eq!(prepare_with_defaults("Cat cat CAT dog"), set(&["cat", "dog"]));
    }

    #[test]
    fn prepare_drops_tokens_normalized_to_empty() {
        let extractor: KeywordsExtractor = Arc::new(default_extractor);
        let normalizer: KeywordNormalizer = Arc::new(|token: &str| {
            if token.len() < 3 {
                String::new()
            } else {
                token.to_lowercase()
            }
        });
        let keywords = prepare_keywords("an Example of it", &extractor, &normalizer);
        assert_eq!(keywords, set(&["example"]));
    }

    #[test]
    fn prepare_of_blank_input_is_empty() {
        assert!(prepare_with_defaults("").is_empty());
        assert!(prepare_with_defaults("   ").is_empty());
    }
}

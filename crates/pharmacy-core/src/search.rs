//! # Search Module
//!
//! Fuzzy name matching for pharmacies and masks using trigram similarity.
//!
//! ## How a Term Is Matched
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  "N95 Mask"                                                             │
//! │      │ lowercase, split on non-alphanumerics                            │
//! │      ▼                                                                  │
//! │  ["n95", "mask"]                                                        │
//! │      │ pad each word: two spaces before, one after                      │
//! │      ▼                                                                  │
//! │  ["  n95 ", "  mask "]                                                  │
//! │      │ every 3-char window, deduplicated                                │
//! │      ▼                                                                  │
//! │  {"  n"," n9","n95","95 ","  m"," ma","mas","ask","sk "}                │
//! │                                                                         │
//! │  similarity(A, B) = |A ∩ B| / |A ∪ B|                                   │
//! │  match when similarity > 0.1                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Ranking is by descending similarity. The sort is stable, so equal scores
//! keep the order the candidates were given in (pharmacies before masks,
//! ascending id). Pagination is applied to the ranked list.

use std::collections::BTreeSet;

use crate::types::{Mask, PageRequest, Pharmacy, SearchHit};

/// Minimum similarity (exclusive) for a candidate to match.
pub const SIMILARITY_THRESHOLD: f32 = 0.1;

// =============================================================================
// Trigrams
// =============================================================================

/// The distinct padded trigrams of a string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Trigrams(BTreeSet<[char; 3]>);

impl Trigrams {
    pub fn new(text: &str) -> Self {
        let mut set = BTreeSet::new();

        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let padded: Vec<char> = "  "
                .chars()
                .chain(word.chars().flat_map(char::to_lowercase))
                .chain(" ".chars())
                .collect();

            for window in padded.windows(3) {
                set.insert([window[0], window[1], window[2]]);
            }
        }

        Trigrams(set)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Shared trigrams over all distinct trigrams. Zero if either side is empty.
    pub fn similarity(&self, other: &Trigrams) -> f32 {
        if self.is_empty() || other.is_empty() {
            return 0.0;
        }
        let shared = self.0.intersection(&other.0).count();
        let union = self.len() + other.len() - shared;
        shared as f32 / union as f32
    }
}

/// Similarity of two strings.
///
/// ```rust
/// use pharmacy_core::search::similarity;
///
/// assert_eq!(similarity("N95", "n95"), 1.0);
/// assert!(similarity("NN", "N95") > 0.1);
/// assert_eq!(similarity("", "N95"), 0.0);
/// ```
pub fn similarity(a: &str, b: &str) -> f32 {
    Trigrams::new(a).similarity(&Trigrams::new(b))
}

// =============================================================================
// Ranking
// =============================================================================

/// Anything with a searchable name.
pub trait Named {
    fn name(&self) -> &str;
}

impl Named for Pharmacy {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for Mask {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for SearchHit {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Keeps the candidates whose name matches `term` and orders them by
/// descending similarity.
pub fn rank<T: Named>(term: &str, candidates: Vec<T>) -> Vec<T> {
    let needle = Trigrams::new(term);
    if needle.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<(f32, T)> = candidates
        .into_iter()
        .filter_map(|c| {
            let score = needle.similarity(&Trigrams::new(c.name()));
            (score > SIMILARITY_THRESHOLD).then_some((score, c))
        })
        .collect();

    // Scores are finite, so total_cmp agrees with the usual float order.
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    scored.into_iter().map(|(_, c)| c).collect()
}

/// Drops `page.skip` items, keeps at most `page.limit`.
pub fn paginate<T>(items: Vec<T>, page: PageRequest) -> Vec<T> {
    items
        .into_iter()
        .skip(page.skip as usize)
        .take(page.limit as usize)
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EntityKind;

    fn hit(id: i64, name: &str, kind: EntityKind) -> SearchHit {
        SearchHit {
            id,
            name: name.to_string(),
            kind,
        }
    }

    #[test]
    fn test_trigrams_of_single_word() {
        let t = Trigrams::new("Cat");
        let expected: BTreeSet<[char; 3]> = [
            [' ', ' ', 'c'],
            [' ', 'c', 'a'],
            ['c', 'a', 't'],
            ['a', 't', ' '],
        ]
        .into_iter()
        .collect();
        assert_eq!(t.0, expected);
    }

    #[test]
    fn test_trigrams_split_words_and_dedupe() {
        // "ab" → "  a", " ab", "ab " ; the second "ab" adds nothing
        assert_eq!(Trigrams::new("ab ab").len(), 3);
        assert_eq!(Trigrams::new("ab-AB").len(), 3);
        assert!(Trigrams::new("  ").is_empty());
        assert!(Trigrams::new("()").is_empty());
    }

    #[test]
    fn test_similarity_values() {
        assert_eq!(similarity("Cat", "cat"), 1.0);

        // {"  n"} shared out of 6 distinct
        let s = similarity("NN", "N95");
        assert!((s - 1.0 / 6.0).abs() < 1e-6);

        // "ww" shares only "  w" with "wired dog" (12 distinct trigrams)
        let s = similarity("WW", "Wired dog");
        assert!((s - 1.0 / 12.0).abs() < 1e-6);
        assert!(s <= SIMILARITY_THRESHOLD);
    }

    #[test]
    fn test_rank_filters_and_orders() {
        let candidates = vec![
            hit(1, "Carepoint", EntityKind::Pharmacy),
            hit(2, "Medical Mask", EntityKind::Pharmacy),
            hit(1, "Masquerade", EntityKind::Mask),
            hit(2, "Mask", EntityKind::Mask),
        ];

        let ranked = rank("mask", candidates);
        let names: Vec<&str> = ranked.iter().map(|h| h.name.as_str()).collect();

        assert_eq!(names[0], "Mask");
        assert_eq!(names[1], "Medical Mask");
        assert!(!names.contains(&"Carepoint"));
    }

    #[test]
    fn test_rank_is_stable_for_equal_scores() {
        let candidates = vec![
            hit(5, "Mask", EntityKind::Pharmacy),
            hit(1, "Mask", EntityKind::Mask),
            hit(2, "Mask", EntityKind::Mask),
        ];

        let ranked = rank("mask", candidates);
        let order: Vec<(EntityKind, i64)> = ranked.iter().map(|h| (h.kind, h.id)).collect();
        assert_eq!(
            order,
            vec![
                (EntityKind::Pharmacy, 5),
                (EntityKind::Mask, 1),
                (EntityKind::Mask, 2)
            ]
        );
    }

    #[test]
    fn test_empty_term_matches_nothing() {
        let candidates = vec![hit(1, "Mask", EntityKind::Mask)];
        assert!(rank("", candidates.clone()).is_empty());
        assert!(rank("   ", candidates).is_empty());
    }

    #[test]
    fn test_paginate_law() {
        let items: Vec<i32> = (0..25).collect();
        for skip in [0u32, 3, 10, 24] {
            for limit in [1u32, 4, 10] {
                let mut joined = paginate(items.clone(), PageRequest::new(skip, limit));
                joined.extend(paginate(items.clone(), PageRequest::new(skip + limit, limit)));
                assert_eq!(joined, paginate(items.clone(), PageRequest::new(skip, 2 * limit)));
            }
        }
        assert!(paginate(items, PageRequest::new(100, 10)).is_empty());
    }
}

//! Fair merge of multiple ordered candidate lists.
//!
//! Candidate resources arrive from several logically distinct queues
//! (never-synced repositories, repositories needing a retry, ...) of very
//! different sizes. Draining them FIFO-per-queue would let a large queue
//! starve the small ones; `interleave` spreads every list proportionally
//! over the merged order instead.

use std::collections::HashSet;
use std::hash::Hash;

/// Spreads each list's elements evenly over the unit interval regardless of
/// list length; without it a zero-length divisor would be possible.
const LENGTH_EPSILON: f64 = 1e-6;

/// Merge ordered candidate lists into one fairly-spread order.
///
/// The `j`-th element (1-based) of list `i` (0-based) is assigned the
/// coefficient `(j - 0.5 + i/1000) / (n_i + ε)`, and all elements are
/// stable-sorted ascending by coefficient. The `-0.5` offset plus division
/// by the list length spreads each list evenly over `[0, 1)`, so a 2-element
/// and a 200-element list interleave proportionally. The `i/1000` term
/// breaks ties between equal-length lists in favor of the lower-indexed one,
/// making the merge fully deterministic; it assumes fewer than 1000 input
/// lists, which is far above anything the schedulers feed it.
///
/// Duplicates are dropped (keeping the earliest occurrence) and the result
/// is truncated to `limit`. Within one list, relative order is preserved.
/// Pure and total: no side effects, no panics, all-empty input yields an
/// empty vec.
pub fn interleave<T>(lists: Vec<Vec<T>>, limit: usize) -> Vec<T>
where
    T: Clone + Eq + Hash,
{
    let total: usize = lists.iter().map(Vec::len).sum();
    let mut tagged: Vec<(f64, T)> = Vec::with_capacity(total);

    for (list_index, list) in lists.into_iter().enumerate() {
        let length = list.len() as f64;
        let tie_break = list_index as f64 / 1000.0;

        for (index, element) in list.into_iter().enumerate() {
            let position = (index + 1) as f64;
            let coefficient = (position - 0.5 + tie_break) / (length + LENGTH_EPSILON);
            tagged.push((coefficient, element));
        }
    }

    // Stable sort keeps within-list order for identical coefficients.
    tagged.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut seen = HashSet::new();
    let mut merged = Vec::new();
    for (_, element) in tagged {
        if merged.len() == limit {
            break;
        }
        if seen.insert(element.clone()) {
            merged.push(element);
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn single_list_keeps_its_order() {
        let merged = interleave(vec![vec!["a", "b", "c"]], 10);
        assert_eq!(merged, vec!["a", "b", "c"]);
    }

    #[test]
    fn all_empty_input_yields_empty() {
        let merged: Vec<u32> = interleave(vec![vec![], vec![], vec![]], 10);
        assert!(merged.is_empty());
        let merged: Vec<u32> = interleave(vec![], 10);
        assert!(merged.is_empty());
    }

    #[test]
    fn short_list_is_not_starved_by_long_one() {
        let short = vec!["s1", "s2"];
        let long = vec!["l1", "l2", "l3", "l4", "l5", "l6", "l7", "l8"];
        let merged = interleave(vec![short, long], 10);

        // With lengths 2 and 8, the short list must surface within the
        // first ceil(10/2) = 5 positions.
        let first_short = merged
            .iter()
            .position(|e| e.starts_with('s'))
            .expect("short list element present");
        assert!(first_short < 5, "short list starved: {merged:?}");

        // Within-list order is preserved on both sides.
        let shorts: Vec<_> = merged.iter().filter(|e| e.starts_with('s')).collect();
        assert_eq!(shorts, vec![&"s1", &"s2"]);
        let longs: Vec<_> = merged.iter().filter(|e| e.starts_with('l')).collect();
        assert_eq!(
            longs,
            vec![&"l1", &"l2", &"l3", &"l4", &"l5", &"l6", &"l7", &"l8"]
        );
    }

    #[test]
    fn equal_length_lists_alternate_with_lower_index_first() {
        let merged = interleave(vec![vec!["a1", "a2"], vec!["b1", "b2"]], 10);
        assert_eq!(merged, vec!["a1", "b1", "a2", "b2"]);
    }

    #[test]
    fn duplicates_keep_earliest_occurrence() {
        let merged = interleave(vec![vec!["a", "b"], vec!["b", "c"]], 10);
        assert_eq!(merged.iter().filter(|e| **e == "b").count(), 1);
        assert_eq!(merged.len(), 3);
    }

    #[test]
    fn truncates_to_limit() {
        let merged = interleave(vec![vec![1, 2, 3], vec![4, 5, 6]], 4);
        assert_eq!(merged.len(), 4);
    }

    #[test]
    fn zero_limit_yields_empty() {
        let merged = interleave(vec![vec![1, 2, 3]], 0);
        assert!(merged.is_empty());
    }

    proptest! {
        #[test]
        fn is_deterministic(
            lists in prop::collection::vec(
                prop::collection::vec(0u16..64, 0..24),
                0..6,
            ),
            limit in 0usize..48,
        ) {
            prop_assert_eq!(
                interleave(lists.clone(), limit),
                interleave(lists, limit)
            );
        }

        #[test]
        fn output_is_deduped_subset_of_input(
            lists in prop::collection::vec(
                prop::collection::vec(0u16..64, 0..24),
                0..6,
            ),
            limit in 0usize..48,
        ) {
            let distinct: HashSet<u16> =
                lists.iter().flatten().copied().collect();
            let merged = interleave(lists, limit);

            let unique: HashSet<u16> = merged.iter().copied().collect();
            prop_assert_eq!(unique.len(), merged.len(), "duplicates in output");
            prop_assert!(merged.iter().all(|e| distinct.contains(e)));
            prop_assert_eq!(merged.len(), distinct.len().min(limit));
        }
    }
}

//! Set algebra over row-index bitmaps.
//!
//! These two primitives are all the search engine combines candidate sets
//! with: union within a field's alternatives, intersection across fields.

use roaring::RoaringBitmap;

use crate::metrics::SearchMetrics;

/// Intersect row sets, cheapest-first.
///
/// The operand count is low (we're not adding ninety query parameters to
/// these URNs), so sort ascending by cardinality, seed the accumulator with a
/// copy of the smallest set, and let each remaining operand filter it. Bails
/// out as soon as the accumulator empties. Every membership test ticks the
/// `set_check` counter.
pub fn intersection(metrics: &SearchMetrics, sets: &[&RoaringBitmap]) -> RoaringBitmap {
    if sets.is_empty() {
        return RoaringBitmap::new();
    }

    let mut ordered: Vec<&RoaringBitmap> = sets.to_vec();
    ordered.sort_by_key(|set| set.len());

    let mut acc = ordered[0].clone();

    for set in &ordered[1..] {
        let mut kept = RoaringBitmap::new();
        for row in &acc {
            metrics.record_check();
            if set.contains(row) {
                kept.insert(row);
            }
        }
        acc = kept;

        if acc.is_empty() {
            break;
        }
    }

    acc
}

/// Union `from` into `into`, returning `into`.
pub fn union_into<'a>(into: &'a mut RoaringBitmap, from: &RoaringBitmap) -> &'a mut RoaringBitmap {
    *into |= from;
    into
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bitmap(rows: &[u32]) -> RoaringBitmap {
        rows.iter().copied().collect()
    }

    #[test]
    fn intersection_of_nothing_is_empty() {
        let metrics = SearchMetrics::default();
        assert!(intersection(&metrics, &[]).is_empty());
    }

    #[test]
    fn intersection_of_one_set_is_an_independent_copy() {
        let metrics = SearchMetrics::default();
        let only = bitmap(&[1, 2, 3]);
        let mut out = intersection(&metrics, &[&only]);
        out.remove(2);
        assert_eq!(only, bitmap(&[1, 2, 3]));
        assert_eq!(out, bitmap(&[1, 3]));
    }

    #[test]
    fn intersection_is_commutative_over_operand_order() {
        let metrics = SearchMetrics::default();
        let a = bitmap(&[1, 2, 3, 4]);
        let b = bitmap(&[2, 4, 6]);
        let c = bitmap(&[4, 2]);
        assert_eq!(
            intersection(&metrics, &[&a, &b, &c]),
            intersection(&metrics, &[&c, &a, &b]),
        );
        assert_eq!(intersection(&metrics, &[&a, &b, &c]), bitmap(&[2, 4]));
    }

    #[test]
    fn intersection_with_a_disjoint_set_is_empty() {
        let metrics = SearchMetrics::default();
        let a = bitmap(&[1, 2]);
        let b = bitmap(&[3, 4]);
        assert!(intersection(&metrics, &[&a, &b]).is_empty());
    }

    #[test]
    fn membership_tests_tick_the_counter() {
        let metrics = SearchMetrics::default();
        let a = bitmap(&[1, 2, 3]);
        let b = bitmap(&[2, 3]);
        intersection(&metrics, &[&a, &b]);
        // The accumulator is seeded from the smaller set, so two checks.
        assert_eq!(metrics.set_check_count(), 2);
    }

    #[test]
    fn union_into_contains_both_operands() {
        let mut a = bitmap(&[1, 2]);
        let b = bitmap(&[2, 9]);
        union_into(&mut a, &b);
        assert_eq!(a, bitmap(&[1, 2, 9]));
    }
}

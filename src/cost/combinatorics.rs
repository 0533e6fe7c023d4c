//! Counting helpers for finishing-order tuples.
//!
//! Counts are checked: callers bound a walk with `tuple_upper_bound`
//! before running it, and every product reports overflow as `None`.

use crate::types::ProgramNumber;

/// Permutations of `n` taken `k` at a time: n·(n−1)···(n−k+1).
/// Zero when `k > n`, `None` when the product overflows.
pub fn falling_factorial(n: u64, k: u64) -> Option<u64> {
    if k > n {
        return Some(0);
    }
    (0..k).try_fold(1u64, |acc, i| acc.checked_mul(n - i))
}

/// Product of the set sizes: the cross-product count before repeats are
/// excluded. `None` on overflow.
pub fn tuple_upper_bound(sets: &[Vec<ProgramNumber>]) -> Option<u64> {
    sets.iter().try_fold(1u64, |acc, s| acc.checked_mul(s.len() as u64))
}

/// Visit every tuple drawn one-per-set (in position order) that names no
/// entrant twice.
pub fn for_each_distinct_tuple<F>(sets: &[Vec<ProgramNumber>], mut visit: F)
where
    F: FnMut(&[ProgramNumber]),
{
    if sets.is_empty() || sets.iter().any(|s| s.is_empty()) {
        return;
    }
    let mut chosen: Vec<ProgramNumber> = Vec::with_capacity(sets.len());
    walk(sets, &mut chosen, &mut visit);
}

fn walk<F>(sets: &[Vec<ProgramNumber>], chosen: &mut Vec<ProgramNumber>, visit: &mut F)
where
    F: FnMut(&[ProgramNumber]),
{
    let depth = chosen.len();
    if depth == sets.len() {
        visit(chosen);
        return;
    }
    for &entrant in &sets[depth] {
        if chosen.contains(&entrant) {
            continue;
        }
        chosen.push(entrant);
        walk(sets, chosen, visit);
        chosen.pop();
    }
}

/// Number of one-per-set tuples with no repeated entrant.
pub fn count_distinct_tuples(sets: &[Vec<ProgramNumber>]) -> u64 {
    let mut count = 0u64;
    for_each_distinct_tuple(sets, |_| count += 1);
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_falling_factorial() {
        assert_eq!(falling_factorial(3, 3), Some(6));
        assert_eq!(falling_factorial(5, 4), Some(120));
        assert_eq!(falling_factorial(8, 2), Some(56));
        assert_eq!(falling_factorial(2, 3), Some(0));
        assert_eq!(falling_factorial(7, 0), Some(1));
    }

    #[test]
    fn test_falling_factorial_overflow_is_none() {
        assert_eq!(falling_factorial(70_000, 4), None);
        assert_eq!(falling_factorial(u64::MAX, 2), None);
    }

    #[test]
    fn test_tuple_upper_bound() {
        assert_eq!(tuple_upper_bound(&[vec![1, 2], vec![1, 2, 3]]), Some(6));
        assert_eq!(tuple_upper_bound(&[vec![1], vec![]]), Some(0));
        let wide: Vec<ProgramNumber> = (1..=70_000).collect();
        assert_eq!(tuple_upper_bound(&vec![wide; 4]), None);
    }

    #[test]
    fn test_box_count_matches_falling_factorial() {
        for n in 1..=8u32 {
            let pool: Vec<ProgramNumber> = (1..=n).collect();
            for k in 2..=4usize {
                let sets = vec![pool.clone(); k];
                assert_eq!(
                    count_distinct_tuples(&sets),
                    falling_factorial(n as u64, k as u64).unwrap(),
                    "n={n} k={k}"
                );
            }
        }
    }

    #[test]
    fn test_overlapping_sets_exclude_repeats() {
        // 1st {1,2}, 2nd {1,2,3}: (1,2) (1,3) (2,1) (2,3)
        let sets = vec![vec![1, 2], vec![1, 2, 3]];
        assert_eq!(count_distinct_tuples(&sets), 4);
    }

    #[test]
    fn test_empty_set_yields_nothing() {
        assert_eq!(count_distinct_tuples(&[vec![1], vec![]]), 0);
        assert_eq!(count_distinct_tuples(&[]), 0);
    }

    #[test]
    fn test_visit_order_is_position_order() {
        let mut seen = Vec::new();
        for_each_distinct_tuple(&[vec![1, 2], vec![2, 3]], |t| seen.push(t.to_vec()));
        assert_eq!(seen, vec![vec![1, 2], vec![1, 3], vec![2, 3]]);
    }
}

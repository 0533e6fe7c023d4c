//! Expected-value heuristic used to rank candidate structures.
//!
//! This is a ranking device, not a market model: it inflates each
//! successive finishing position by a fixed factor and caps the result
//! per family. The payout estimator has its own scenario model and the
//! two are allowed to disagree.

use std::collections::HashMap;

use crate::cost::combinatorics::for_each_distinct_tuple;
use crate::sanitize::sanitize_odds;
use crate::types::{BetFamily, EntrantTier, ProgramNumber};

/// Ceiling for the odds-implied fallback probability.
pub const MAX_IMPLIED_PROBABILITY: f64 = 0.7;
/// Public-bias correction applied to `1 / (odds + 1)`.
pub const IMPLIED_BIAS: f64 = 1.1;

pub const EXACTA_SECOND_INFLATION: f64 = 1.3;
pub const TRIFECTA_SECOND_INFLATION: f64 = 1.2;
pub const TRIFECTA_THIRD_INFLATION: f64 = 1.1;

pub const EXACTA_HIT_CAP: f64 = 0.5;
pub const TRIFECTA_HIT_CAP: f64 = 0.25;
pub const SUPERFECTA_HIT_CAP: f64 = 0.1;

/// Win probability for ranking: the model figure when present, otherwise
/// `min(0.7, 1.1 / (odds + 1))`.
pub fn win_probability(entrant: &EntrantTier) -> f64 {
    match entrant.win_probability {
        Some(p) if p.is_finite() => p.clamp(0.0, 1.0),
        _ => (IMPLIED_BIAS / (sanitize_odds(entrant.odds) + 1.0)).min(MAX_IMPLIED_PROBABILITY),
    }
}

/// Approximate chance that one of the tuples covered by `sets` hits.
pub fn hit_probability(family: BetFamily, sets: &[Vec<ProgramNumber>], probs: &HashMap<ProgramNumber, f64>) -> f64 {
    let p = |n: &ProgramNumber| probs.get(n).copied().unwrap_or(0.0);

    match family {
        BetFamily::Exacta => {
            let mut sum = 0.0;
            for_each_distinct_tuple(&sets[..2.min(sets.len())], |t| {
                if t.len() == 2 {
                    sum += p(&t[0]) * EXACTA_SECOND_INFLATION * p(&t[1]);
                }
            });
            sum.min(EXACTA_HIT_CAP)
        }
        BetFamily::Trifecta => trifecta_hit(sets, &p),
        BetFamily::Superfecta => {
            let Some(fourth) = sets.get(3).filter(|s| !s.is_empty()) else {
                return 0.0;
            };
            let mean_fourth = fourth.iter().map(&p).sum::<f64>() / fourth.len() as f64;
            (trifecta_hit(sets, &p) * mean_fourth).min(SUPERFECTA_HIT_CAP)
        }
    }
}

fn trifecta_hit<P>(sets: &[Vec<ProgramNumber>], p: &P) -> f64
where
    P: Fn(&ProgramNumber) -> f64,
{
    let mut sum = 0.0;
    for_each_distinct_tuple(&sets[..3.min(sets.len())], |t| {
        if t.len() == 3 {
            sum += p(&t[0]) * TRIFECTA_SECOND_INFLATION * p(&t[1]) * TRIFECTA_THIRD_INFLATION * p(&t[2]);
        }
    });
    sum.min(TRIFECTA_HIT_CAP)
}

/// Likely payout for a structure built from runners priced at `odds`:
/// `stake × multiplier × avg^(k−1) × (min + max) / 2`.
pub fn likely_payout(family: BetFamily, odds: &[f64], stake: f64, multiplier: f64) -> f64 {
    if odds.is_empty() {
        return 0.0;
    }
    let odds: Vec<f64> = odds.iter().copied().map(sanitize_odds).collect();
    let avg = odds.iter().sum::<f64>() / odds.len() as f64;
    let min = odds.iter().copied().fold(f64::INFINITY, f64::min);
    let max = odds.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let k = family.positions() as i32;

    stake * multiplier * avg.powi(k - 1) * (min + max) / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entrant(n: u32, odds: f64, p: Option<f64>) -> EntrantTier {
        EntrantTier {
            program_number: n,
            name: format!("H{n}"),
            tier: 1,
            win_probability: p,
            odds,
            confidence: 50.0,
        }
    }

    #[test]
    fn test_win_probability_prefers_model() {
        assert_eq!(win_probability(&entrant(1, 5.0, Some(0.31))), 0.31);
        assert_eq!(win_probability(&entrant(1, 5.0, Some(1.7))), 1.0);
    }

    #[test]
    fn test_win_probability_implied_fallback() {
        // 1.1 / 5 = 0.22
        assert!((win_probability(&entrant(1, 4.0, None)) - 0.22).abs() < 1e-12);
        // 1.1 / 1.2 > 0.7 → capped
        assert_eq!(win_probability(&entrant(1, 0.2, None)), 0.7);
        assert!(win_probability(&entrant(1, 4.0, Some(f64::NAN))) > 0.0);
    }

    #[test]
    fn test_exacta_hit_probability() {
        let probs: HashMap<ProgramNumber, f64> = [(1, 0.4), (2, 0.2)].into_iter().collect();
        let sets = vec![vec![1], vec![2]];
        let hit = hit_probability(BetFamily::Exacta, &sets, &probs);
        assert!((hit - 0.4 * 1.3 * 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_exacta_hit_capped() {
        let probs: HashMap<ProgramNumber, f64> = (1..=6).map(|n| (n, 0.5)).collect();
        let pool: Vec<ProgramNumber> = (1..=6).collect();
        let hit = hit_probability(BetFamily::Exacta, &[pool.clone(), pool], &probs);
        assert_eq!(hit, EXACTA_HIT_CAP);
    }

    #[test]
    fn test_trifecta_hit_probability() {
        let probs: HashMap<ProgramNumber, f64> = [(1, 0.3), (2, 0.2), (3, 0.1)].into_iter().collect();
        let sets = vec![vec![1], vec![2], vec![3]];
        let hit = hit_probability(BetFamily::Trifecta, &sets, &probs);
        assert!((hit - 0.3 * 1.2 * 0.2 * 1.1 * 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_superfecta_scales_by_fourth_mean() {
        let probs: HashMap<ProgramNumber, f64> =
            [(1, 0.3), (2, 0.2), (3, 0.1), (4, 0.1), (5, 0.3)].into_iter().collect();
        let sets = vec![vec![1], vec![2], vec![3], vec![4, 5]];
        let hit = hit_probability(BetFamily::Superfecta, &sets, &probs);
        let tri = 0.3 * 1.2 * 0.2 * 1.1 * 0.1;
        assert!((hit - tri * 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_likely_payout_formula() {
        // avg 4, min 2, max 6 → 1 × 1.2 × 4 × 4 = 19.2
        let p = likely_payout(BetFamily::Exacta, &[2.0, 4.0, 6.0], 1.0, 1.2);
        assert!((p - 19.2).abs() < 1e-9);
        assert_eq!(likely_payout(BetFamily::Exacta, &[], 1.0, 1.2), 0.0);
    }
}

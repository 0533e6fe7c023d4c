//! Numeric sanitation.
//!
//! Every stake, budget, odds figure and entrant set passes through here
//! before it reaches a calculator. Nothing in this module fails: bad input
//! is clamped, defaulted or silently dropped.

use rust_decimal::prelude::*;
use std::collections::HashSet;

use crate::types::{ProgramNumber, MAX_STAKE, MIN_STAKE};

/// Stake used when the caller passes something non-finite.
pub const DEFAULT_STAKE: f64 = 1.0;
/// Budget used when the caller passes something non-finite.
pub const DEFAULT_BUDGET: f64 = 20.0;
pub const MIN_BUDGET: f64 = 1.0;
pub const MAX_BUDGET: f64 = 1000.0;
/// Odds used when the caller passes something non-finite.
pub const DEFAULT_ODDS: f64 = 10.0;
pub const MIN_ODDS: f64 = 0.1;
pub const MAX_ODDS: f64 = 999.0;

/// Clamp `value` into `[min, max]`, substituting `default` for NaN/∞.
/// Never returns a non-finite number.
pub fn clamp(value: f64, default: f64, min: f64, max: f64) -> f64 {
    if !value.is_finite() {
        return default;
    }
    value.max(min).min(max)
}

/// Round to cents, half away from zero.
pub fn round2(value: f64) -> f64 {
    round_dp(value, 2)
}

/// Round to `dp` decimal places, half away from zero. Non-finite input
/// collapses to zero.
pub fn round_dp(value: f64, dp: u32) -> f64 {
    Decimal::from_f64(value)
        .map(|d| d.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|d| d.to_f64())
        .unwrap_or(0.0)
}

/// `round2(count * stake)` computed in decimal so that, e.g., 3 × $0.10
/// is exactly $0.30.
pub fn money_product(count: u64, stake: f64) -> f64 {
    let Some(stake) = Decimal::from_f64(stake) else {
        return 0.0;
    };
    (Decimal::from(count) * stake)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or(0.0)
}

pub fn sanitize_stake(stake: f64) -> f64 {
    round2(clamp(stake, DEFAULT_STAKE, MIN_STAKE, MAX_STAKE))
}

pub fn sanitize_budget(budget: f64) -> f64 {
    round2(clamp(budget, DEFAULT_BUDGET, MIN_BUDGET, MAX_BUDGET))
}

pub fn sanitize_odds(odds: f64) -> f64 {
    clamp(odds, DEFAULT_ODDS, MIN_ODDS, MAX_ODDS)
}

/// Keep positive program numbers that fit a `ProgramNumber`, first
/// occurrence wins.
pub fn sanitize_entrants(raw: &[i64]) -> Vec<ProgramNumber> {
    let mut seen = HashSet::new();
    raw.iter()
        .filter_map(|&n| ProgramNumber::try_from(n).ok())
        .filter(|&n| n > 0)
        .filter(|n| seen.insert(*n))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_non_finite_returns_default() {
        assert_eq!(clamp(f64::NAN, 5.0, 0.0, 10.0), 5.0);
        assert_eq!(clamp(f64::INFINITY, 5.0, 0.0, 10.0), 5.0);
        assert_eq!(clamp(f64::NEG_INFINITY, 5.0, 0.0, 10.0), 5.0);
    }

    #[test]
    fn test_clamp_bounds() {
        assert_eq!(clamp(-3.0, 1.0, 0.0, 10.0), 0.0);
        assert_eq!(clamp(30.0, 1.0, 0.0, 10.0), 10.0);
        assert_eq!(clamp(4.5, 1.0, 0.0, 10.0), 4.5);
    }

    #[test]
    fn test_round2_half_away_from_zero() {
        assert_eq!(round2(1.236), 1.24);
        assert_eq!(round2(-1.236), -1.24);
        assert_eq!(round2(2.344), 2.34);
        assert_eq!(round2(0.1 + 0.2), 0.3);
    }

    #[test]
    fn test_money_product_exact() {
        assert_eq!(money_product(3, 0.1), 0.3);
        assert_eq!(money_product(120, 0.5), 60.0);
        assert_eq!(money_product(0, 2.0), 0.0);
    }

    #[test]
    fn test_stake_clamped_and_rounded() {
        assert_eq!(sanitize_stake(0.0), 0.1);
        assert_eq!(sanitize_stake(-4.0), 0.1);
        assert_eq!(sanitize_stake(250.0), 100.0);
        assert_eq!(sanitize_stake(1.237), 1.24);
        assert_eq!(sanitize_stake(f64::NAN), DEFAULT_STAKE);
    }

    #[test]
    fn test_budget_clamped() {
        assert_eq!(sanitize_budget(0.0), 1.0);
        assert_eq!(sanitize_budget(5000.0), 1000.0);
        assert_eq!(sanitize_budget(f64::NAN), DEFAULT_BUDGET);
    }

    #[test]
    fn test_sanitize_entrants_dedupes_and_filters() {
        assert_eq!(sanitize_entrants(&[1, 1, 2, 2]), vec![1, 2]);
        assert_eq!(sanitize_entrants(&[0, -3, 5, 5, 4]), vec![5, 4]);
        assert_eq!(sanitize_entrants(&[i64::MAX, 7]), vec![7]);
        assert!(sanitize_entrants(&[]).is_empty());
    }
}

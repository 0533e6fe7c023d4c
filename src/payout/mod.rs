//! Payout estimation.
//!
//! Builds a handful of named finishing scenarios (chalk, mixed, longshot,
//! upset) from market odds and turns them into a payout range. The
//! scenario weights are fixed heuristics, not a joint distribution, and
//! this model is deliberately independent from the optimizer's ranking
//! heuristic.

pub mod scenarios;

use tracing::debug;

use crate::sanitize::{money_product, round2, round_dp, sanitize_odds, sanitize_stake};
use crate::types::{
    format_money, BetFamily, EntrantWithOdds, PayoutEstimate, PayoutRange, PayoutScenario, RoiRange,
    TicketCost,
};
use scenarios::build_scenarios;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Pool takeout and payout multipliers per bet family. Shared by the
/// scenario path and the quick path so the two stay consistent.
#[derive(Debug, Clone, PartialEq)]
pub struct PayoutConfig {
    pub exacta_takeout: f64,
    pub trifecta_takeout: f64,
    pub superfecta_takeout: f64,
    pub exacta_multiplier: f64,
    pub trifecta_multiplier: f64,
    pub superfecta_multiplier: f64,
}

impl Default for PayoutConfig {
    fn default() -> Self {
        Self {
            exacta_takeout: 0.20,
            trifecta_takeout: 0.25,
            superfecta_takeout: 0.25,
            exacta_multiplier: 1.0,
            trifecta_multiplier: 0.85,
            superfecta_multiplier: 0.7,
        }
    }
}

impl PayoutConfig {
    pub fn takeout_for(&self, family: BetFamily) -> f64 {
        match family {
            BetFamily::Exacta => self.exacta_takeout,
            BetFamily::Trifecta => self.trifecta_takeout,
            BetFamily::Superfecta => self.superfecta_takeout,
        }
    }

    pub fn multiplier_for(&self, family: BetFamily) -> f64 {
        match family {
            BetFamily::Exacta => self.exacta_multiplier,
            BetFamily::Trifecta => self.trifecta_multiplier,
            BetFamily::Superfecta => self.superfecta_multiplier,
        }
    }

    /// Payout for one winning combination whose odds multiply to
    /// `odds_product`.
    pub fn payout(&self, family: BetFamily, odds_product: f64, stake: f64) -> f64 {
        let takeout = self.takeout_for(family).clamp(0.0, 1.0);
        round2(odds_product * self.multiplier_for(family) * stake * (1.0 - takeout))
    }
}

// ---------------------------------------------------------------------------
// Estimator
// ---------------------------------------------------------------------------

pub struct PayoutEstimator {
    config: PayoutConfig,
}

impl Default for PayoutEstimator {
    fn default() -> Self {
        Self::new(PayoutConfig::default())
    }
}

impl PayoutEstimator {
    pub fn new(config: PayoutConfig) -> Self {
        Self { config }
    }

    /// Scenario-based payout estimate for one winning combination at
    /// `stake`, with the ticket's total cost derived from `combinations`.
    pub fn estimate(
        &self,
        family: BetFamily,
        entrants: &[EntrantWithOdds],
        stake: f64,
        combinations: u64,
    ) -> PayoutEstimate {
        let stake = sanitize_stake(stake);
        let total_cost = money_product(combinations, stake);

        if entrants.len() < 2 {
            return invalid(
                family,
                stake,
                combinations,
                total_cost,
                format!("Payout estimate needs at least 2 horses with odds, got {}", entrants.len()),
            );
        }

        let scenarios = build_scenarios(&self.config, family, entrants, stake);
        if scenarios.is_empty() {
            return invalid(
                family,
                stake,
                combinations,
                total_cost,
                format!(
                    "{family} payout needs at least {} horses with odds, got {}",
                    family.positions(),
                    entrants.len()
                ),
            );
        }

        let range = aggregate(&scenarios, stake);
        debug!(
            family = %family,
            scenarios = scenarios.len(),
            minimum = format!("${:.2}", range.minimum),
            maximum = format!("${:.2}", range.maximum),
            likely = format!("${:.2}", range.likely),
            "Payout estimated"
        );

        PayoutEstimate {
            bet_family: family,
            stake,
            combinations,
            total_cost,
            range,
            scenarios,
            valid: true,
            error: None,
        }
    }

    /// Estimate the payout of an already-priced ticket.
    pub fn estimate_ticket(&self, cost: &TicketCost, entrants: &[EntrantWithOdds]) -> PayoutEstimate {
        self.estimate(cost.bet_family, entrants, cost.stake, cost.combinations)
    }

    /// Odds-only estimate for when entrant identities are unavailable.
    /// Minimum uses the shortest prices, maximum the longest, likely the
    /// mean price (held inside the min/max band).
    pub fn quick_estimate(
        &self,
        family: BetFamily,
        odds: &[f64],
        stake: f64,
        combinations: u64,
    ) -> PayoutEstimate {
        let stake = sanitize_stake(stake);
        let total_cost = money_product(combinations, stake);
        let k = family.positions();

        let mut sorted: Vec<f64> = odds
            .iter()
            .copied()
            .filter(|o| o.is_finite() && *o > 0.0)
            .map(sanitize_odds)
            .collect();
        if sorted.len() < k {
            return invalid(
                family,
                stake,
                combinations,
                total_cost,
                format!("{family} payout needs at least {k} odds, got {}", sorted.len()),
            );
        }
        sorted.sort_by(|a, b| a.total_cmp(b));

        let low: f64 = sorted[..k].iter().product();
        let high: f64 = sorted[sorted.len() - k..].iter().product();
        let mean = sorted.iter().sum::<f64>() / sorted.len() as f64;

        let minimum = self.config.payout(family, low, stake);
        let maximum = self.config.payout(family, high, stake);
        let likely = self
            .config
            .payout(family, mean.powi(k as i32), stake)
            .clamp(minimum, maximum);

        PayoutEstimate {
            bet_family: family,
            stake,
            combinations,
            total_cost,
            range: PayoutRange {
                minimum,
                maximum,
                likely,
                display: range_display(minimum, maximum),
                per_unit_ratio: round2(likely / stake),
            },
            scenarios: Vec::new(),
            valid: true,
            error: None,
        }
    }
}

/// Scenario estimate with the default tables.
pub fn estimate_payout(
    family: BetFamily,
    entrants: &[EntrantWithOdds],
    stake: f64,
    combinations: u64,
) -> PayoutEstimate {
    PayoutEstimator::default().estimate(family, entrants, stake, combinations)
}

/// Odds-only estimate with the default tables.
pub fn quick_payout_estimate(family: BetFamily, odds: &[f64], stake: f64, combinations: u64) -> PayoutEstimate {
    PayoutEstimator::default().quick_estimate(family, odds, stake, combinations)
}

/// ROI bounds, `(payout − cost) / cost`, at the minimum, maximum and
/// likely payout. Zero-cost estimates report zero ROI.
pub fn roi(estimate: &PayoutEstimate) -> RoiRange {
    let cost = estimate.total_cost;
    if !estimate.valid || cost <= 0.0 {
        return RoiRange {
            minimum: 0.0,
            maximum: 0.0,
            likely: 0.0,
        };
    }
    let ratio = |payout: f64| round_dp((payout - cost) / cost, 4);
    RoiRange {
        minimum: ratio(estimate.range.minimum),
        maximum: ratio(estimate.range.maximum),
        likely: ratio(estimate.range.likely),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn aggregate(scenarios: &[PayoutScenario], stake: f64) -> PayoutRange {
    let minimum = scenarios.iter().map(|s| s.payout).fold(f64::INFINITY, f64::min);
    let maximum = scenarios.iter().map(|s| s.payout).fold(f64::NEG_INFINITY, f64::max);
    let weight: f64 = scenarios.iter().map(|s| s.probability).sum();
    let likely = if weight > 0.0 {
        round2(scenarios.iter().map(|s| s.payout * s.probability).sum::<f64>() / weight)
    } else {
        minimum
    };

    PayoutRange {
        minimum,
        maximum,
        likely,
        display: range_display(minimum, maximum),
        per_unit_ratio: round2(likely / stake),
    }
}

fn range_display(minimum: f64, maximum: f64) -> String {
    format!("{} - {}", format_money(minimum), format_money(maximum))
}

fn invalid(family: BetFamily, stake: f64, combinations: u64, total_cost: f64, error: String) -> PayoutEstimate {
    debug!(family = %family, error = %error, "Payout estimate unavailable");
    PayoutEstimate {
        bet_family: family,
        stake,
        combinations,
        total_cost,
        range: PayoutRange::empty(),
        scenarios: Vec::new(),
        valid: false,
        error: Some(error),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn field(odds: &[f64]) -> Vec<EntrantWithOdds> {
        odds.iter()
            .enumerate()
            .map(|(i, &o)| EntrantWithOdds::new(i as u32 + 1, format!("Horse {}", i + 1), o, 50.0))
            .collect()
    }

    #[test]
    fn test_config_default_tables() {
        let cfg = PayoutConfig::default();
        assert_eq!(cfg.takeout_for(BetFamily::Exacta), 0.20);
        assert_eq!(cfg.takeout_for(BetFamily::Superfecta), 0.25);
        assert_eq!(cfg.multiplier_for(BetFamily::Trifecta), 0.85);
    }

    #[test]
    fn test_exacta_chalk_payout() {
        // 2 × 3 × 1.0 × $2 × 0.8 = $9.60
        let est = estimate_payout(BetFamily::Exacta, &field(&[3.0, 2.0, 6.0]), 2.0, 1);
        assert!(est.valid);
        let chalk = est.scenarios.iter().find(|s| s.name == "Chalk").unwrap();
        assert_eq!(chalk.entrants, vec![2, 1]);
        assert_eq!(chalk.payout, 9.6);
        assert_eq!(chalk.display, "$9.60");
    }

    #[test]
    fn test_likely_is_weighted_mean() {
        let est = estimate_payout(BetFamily::Trifecta, &field(&[2.0, 4.0, 5.0, 8.0, 12.0, 20.0]), 1.0, 6);
        let weight: f64 = est.scenarios.iter().map(|s| s.probability).sum();
        let mean = est.scenarios.iter().map(|s| s.payout * s.probability).sum::<f64>() / weight;
        assert_eq!(est.range.likely, round2(mean));
        assert!(est.range.minimum <= est.range.likely);
        assert!(est.range.likely <= est.range.maximum);
        assert_eq!(est.total_cost, 6.0);
    }

    #[test]
    fn test_no_longshot_means_no_upset() {
        let est = estimate_payout(BetFamily::Exacta, &field(&[2.0, 3.0, 4.5, 6.0, 9.0]), 1.0, 1);
        assert!(est.valid);
        assert!(est.scenarios.iter().all(|s| s.name != "Upset" && s.name != "Bomb"));

        let est = estimate_payout(BetFamily::Trifecta, &field(&[2.0, 3.0, 4.5, 6.0, 9.0]), 1.0, 1);
        assert!(est.scenarios.iter().all(|s| s.name != "Bomb" && s.name != "Longshot"));
    }

    #[test]
    fn test_too_few_entrants() {
        let est = estimate_payout(BetFamily::Exacta, &field(&[2.0]), 1.0, 1);
        assert!(!est.valid);
        assert!(est.error.unwrap().contains("at least 2"));

        let est = estimate_payout(BetFamily::Superfecta, &field(&[2.0, 3.0, 4.0]), 1.0, 1);
        assert!(!est.valid);
        assert!(est.error.unwrap().contains("at least 4"));
    }

    #[test]
    fn test_quick_estimate_bounds() {
        // exacta: low 2×3 = 6, high 8×10 = 80, mean 5.75 → 33.0625
        let est = quick_payout_estimate(BetFamily::Exacta, &[10.0, 2.0, 3.0, 8.0], 1.0, 12);
        assert!(est.valid);
        assert_eq!(est.range.minimum, 4.8);
        assert_eq!(est.range.maximum, 64.0);
        assert_eq!(est.range.likely, 26.45);
        assert_eq!(est.range.display, "$4.80 - $64.00");
        assert_eq!(est.total_cost, 12.0);
        assert!(est.scenarios.is_empty());
    }

    #[test]
    fn test_quick_likely_held_inside_band() {
        let est = quick_payout_estimate(BetFamily::Exacta, &[1.0, 2.0, 3.0, 100.0], 1.0, 1);
        assert!(est.range.likely <= est.range.maximum);
        assert!(est.range.likely >= est.range.minimum);
    }

    #[test]
    fn test_quick_and_scenario_share_tables() {
        // Chalk is the shortest-priced finish, the same as quick minimum.
        let odds = [2.0, 3.5, 5.0, 7.0];
        let full = estimate_payout(BetFamily::Trifecta, &field(&odds), 1.0, 1);
        let quick = quick_payout_estimate(BetFamily::Trifecta, &odds, 1.0, 1);
        let chalk = full.scenarios.iter().find(|s| s.name == "Chalk").unwrap();
        assert_eq!(chalk.payout, quick.range.minimum);
    }

    #[test]
    fn test_quick_estimate_drops_bad_odds() {
        let est = quick_payout_estimate(BetFamily::Exacta, &[f64::NAN, -2.0, 4.0], 1.0, 1);
        assert!(!est.valid);
    }

    #[test]
    fn test_roi_bounds() {
        let est = quick_payout_estimate(BetFamily::Exacta, &[10.0, 2.0, 3.0, 8.0], 1.0, 12);
        let r = roi(&est);
        // (4.80 − 12) / 12 = −0.6
        assert_eq!(r.minimum, -0.6);
        // (64 − 12) / 12 = 4.3333
        assert_eq!(r.maximum, 4.3333);
        assert!(r.likely > r.minimum && r.likely < r.maximum);
    }

    #[test]
    fn test_roi_zero_cost() {
        let est = quick_payout_estimate(BetFamily::Exacta, &[2.0, 3.0], 1.0, 0);
        assert_eq!(roi(&est), RoiRange { minimum: 0.0, maximum: 0.0, likely: 0.0 });
    }

    #[test]
    fn test_estimate_ticket_uses_cost_fields() {
        let cost = crate::cost::calculate_box(BetFamily::Exacta, &[1, 2, 3], 2.0);
        let est = PayoutEstimator::default().estimate_ticket(&cost, &field(&[2.0, 4.0, 6.0]));
        assert_eq!(est.combinations, 6);
        assert_eq!(est.total_cost, 12.0);
        assert_eq!(est.stake, 2.0);
    }

    #[test]
    fn test_estimate_is_deterministic() {
        let entrants = field(&[2.0, 4.0, 5.0, 8.0, 12.0, 20.0]);
        let a = estimate_payout(BetFamily::Superfecta, &entrants, 0.5, 24);
        let b = estimate_payout(BetFamily::Superfecta, &entrants, 0.5, 24);
        assert_eq!(a, b);
    }
}

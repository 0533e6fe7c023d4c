//! Structure optimizer: catalog generation, stake selection and
//! expected-value ranking under a hard budget.

pub mod candidates;
pub mod scoring;

use std::collections::HashMap;

use tracing::{debug, info};

use crate::cost::calculate_cost;
use crate::sanitize::{round2, round_dp, sanitize_budget, sanitize_odds};
use crate::types::{
    format_money, BetFamily, CandidateStructure, EntrantTier, OptimizationResult, ProgramNumber, Ticket,
    TicketCost, STAKE_DENOMINATIONS,
};
use candidates::{build_catalog, CatalogEntry, TieredPool};
use scoring::{hit_probability, likely_payout, win_probability};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Optimizer tunables (defaults, overridden by config.toml at runtime).
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizerConfig {
    /// Cap on the full-pool box, bounding combinatorial blow-up.
    pub max_box_size: usize,
    /// Largest base stake considered per family.
    pub exacta_stake_cap: f64,
    pub trifecta_stake_cap: f64,
    pub superfecta_stake_cap: f64,
    /// Payout multiplier used by the ranking heuristic.
    pub exacta_payout_multiplier: f64,
    pub trifecta_payout_multiplier: f64,
    pub superfecta_payout_multiplier: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            max_box_size: 5,
            exacta_stake_cap: 5.0,
            trifecta_stake_cap: 2.0,
            superfecta_stake_cap: 0.5,
            exacta_payout_multiplier: 1.2,
            trifecta_payout_multiplier: 2.5,
            superfecta_payout_multiplier: 8.0,
        }
    }
}

impl OptimizerConfig {
    pub fn stake_cap_for(&self, family: BetFamily) -> f64 {
        match family {
            BetFamily::Exacta => self.exacta_stake_cap,
            BetFamily::Trifecta => self.trifecta_stake_cap,
            BetFamily::Superfecta => self.superfecta_stake_cap,
        }
    }

    pub fn payout_multiplier_for(&self, family: BetFamily) -> f64 {
        match family {
            BetFamily::Exacta => self.exacta_payout_multiplier,
            BetFamily::Trifecta => self.trifecta_payout_multiplier,
            BetFamily::Superfecta => self.superfecta_payout_multiplier,
        }
    }
}

// ---------------------------------------------------------------------------
// Optimizer
// ---------------------------------------------------------------------------

pub struct StructureOptimizer {
    config: OptimizerConfig,
}

impl Default for StructureOptimizer {
    fn default() -> Self {
        Self::new(OptimizerConfig::default())
    }
}

impl StructureOptimizer {
    pub fn new(config: OptimizerConfig) -> Self {
        Self { config }
    }

    /// Find the highest expected-value structure for `family` that fits
    /// `budget`.
    ///
    /// Steps:
    /// 1. Clamp the budget and merge the tiers into one deduplicated pool.
    /// 2. Build the family's candidate catalog.
    /// 3. Price each candidate at the largest stake that fits.
    /// 4. Score, drop anything invalid or over budget, rank by EV.
    pub fn optimize(
        &self,
        budget: f64,
        tier1: &[EntrantTier],
        tier2: &[EntrantTier],
        tier3: &[EntrantTier],
        family: BetFamily,
        field_size: u32,
    ) -> OptimizationResult {
        let budget = sanitize_budget(budget);
        let pool = TieredPool::new(tier1, tier2, tier3);

        let required = family.min_entrants();
        if pool.len() < required {
            return OptimizationResult::invalid(
                family,
                budget,
                format!(
                    "Need at least {required} classified horses for a {family}, got {}",
                    pool.len()
                ),
            );
        }

        let field_size = (field_size as usize).max(pool.len());
        let probs: HashMap<ProgramNumber, f64> =
            pool.all().map(|e| (e.program_number, win_probability(e))).collect();

        let catalog = build_catalog(family, &pool, self.config.max_box_size);
        let mut candidates: Vec<CandidateStructure> = catalog
            .into_iter()
            .map(|entry| self.score(entry, family, budget, &pool, &probs, field_size))
            .filter(|c| {
                let keep = c.cost.valid && c.cost.total <= budget;
                if !keep {
                    debug!(
                        family = %family,
                        label = %c.label,
                        total = format!("${:.2}", c.cost.total),
                        budget = format!("${:.2}", budget),
                        error = ?c.cost.error,
                        "Candidate dropped"
                    );
                }
                keep
            })
            .collect();

        if candidates.is_empty() {
            return OptimizationResult::invalid(
                family,
                budget,
                format!("No {family} structure fits a {} budget", format_money(budget)),
            );
        }

        // Stable: equal EVs keep catalog order.
        candidates.sort_by(|a, b| b.expected_value.total_cmp(&a.expected_value));

        let best = &mut candidates[0];
        best.recommended = true;
        best.rationale = format!("Recommended: {}", best.rationale);
        let recommended = best.clone();

        let budget_used = recommended.cost.total;
        let budget_remaining = round2(budget - budget_used);
        let summary = format!(
            "{family}: {} for {} ({} combinations at {}), EV {}. {} of the structures fit a {} budget.",
            recommended.label,
            format_money(recommended.cost.total),
            recommended.cost.combinations,
            format_money(recommended.stake),
            signed_money(recommended.expected_value),
            candidates.len(),
            format_money(budget),
        );

        info!(
            family = %family,
            candidates = candidates.len(),
            pick = %recommended.label,
            cost = format!("${:.2}", budget_used),
            ev = format!("${:.2}", recommended.expected_value),
            "Optimization complete"
        );

        OptimizationResult {
            bet_family: family,
            budget,
            candidates,
            recommended: Some(recommended),
            budget_used,
            budget_remaining,
            summary,
            valid: true,
            error: None,
        }
    }

    /// Price and score one catalog entry.
    fn score(
        &self,
        entry: CatalogEntry,
        family: BetFamily,
        budget: f64,
        pool: &TieredPool,
        probs: &HashMap<ProgramNumber, f64>,
        field_size: usize,
    ) -> CandidateStructure {
        let cost = self.select_stake(&entry.ticket, family, budget);
        let runners = entry.entrants();
        let odds: Vec<f64> = runners
            .iter()
            .filter_map(|n| pool.find(*n))
            .map(|e| sanitize_odds(e.odds))
            .collect();

        let hit = hit_probability(family, &entry.position_sets, probs);
        let payout = likely_payout(family, &odds, cost.stake, self.config.payout_multiplier_for(family));
        let expected_value = round2(hit * payout - cost.total);
        let hit_probability = round_dp(hit, 4);
        let budget_remaining = round2(budget - cost.total);

        let rationale = format!(
            "{}: {}. Covers {} of {} runners, hit chance {:.1}%, expected value {}. {} left of {}.",
            entry.label,
            cost.explanation,
            runners.len(),
            field_size,
            hit_probability * 100.0,
            signed_money(expected_value),
            format_money(budget_remaining.max(0.0)),
            format_money(budget),
        );

        debug!(
            family = %family,
            label = %entry.label,
            combinations = cost.combinations,
            stake = format!("${:.2}", cost.stake),
            hit = format!("{:.2}%", hit * 100.0),
            ev = format!("${:.2}", expected_value),
            "Candidate scored"
        );

        CandidateStructure {
            label: entry.label,
            shape: entry.ticket.shape(),
            stake: cost.stake,
            cost,
            expected_value,
            hit_probability,
            position_sets: entry.position_sets,
            budget_remaining,
            recommended: false,
            rationale,
        }
    }

    /// Largest denomination up to the family cap whose total fits the
    /// budget. When nothing fits, the smallest denomination is used even
    /// though it overshoots; the caller's budget filter drops it.
    pub fn select_stake(&self, ticket: &Ticket, family: BetFamily, budget: f64) -> TicketCost {
        let cap = self.config.stake_cap_for(family);
        for &stake in STAKE_DENOMINATIONS.iter().rev().filter(|&&d| d <= cap) {
            let cost = calculate_cost(ticket, family, stake);
            if !cost.valid || cost.total <= budget {
                return cost;
            }
        }
        calculate_cost(ticket, family, STAKE_DENOMINATIONS[0])
    }
}

/// Optimize with the default configuration.
pub fn optimize(
    budget: f64,
    tier1: &[EntrantTier],
    tier2: &[EntrantTier],
    tier3: &[EntrantTier],
    family: BetFamily,
    field_size: u32,
) -> OptimizationResult {
    StructureOptimizer::default().optimize(budget, tier1, tier2, tier3, family, field_size)
}

pub(crate) fn signed_money(amount: f64) -> String {
    if amount < 0.0 {
        format!("-{}", format_money(-amount))
    } else {
        format!("+{}", format_money(amount))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

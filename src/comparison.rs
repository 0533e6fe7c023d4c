//! Comparison aggregator.
//!
//! Runs the structure optimizer for every bet family against the same
//! pool and budget and ranks the families by the expected value of their
//! recommended ticket.

use tracing::info;

use crate::optimizer::{signed_money, StructureOptimizer};
use crate::sanitize::sanitize_budget;
use crate::types::{format_money, BetComparison, BetFamily, ComparisonRow, EntrantTier};

pub struct ComparisonAggregator {
    optimizer: StructureOptimizer,
}

impl Default for ComparisonAggregator {
    fn default() -> Self {
        Self::new(StructureOptimizer::default())
    }
}

impl ComparisonAggregator {
    pub fn new(optimizer: StructureOptimizer) -> Self {
        Self { optimizer }
    }

    /// Rank exacta, trifecta and superfecta for one pool.
    ///
    /// Only valid results whose recommended ticket fits the budget become
    /// rows. Rows are ordered by score (the recommended ticket's expected
    /// value), ties broken by hit probability and then family order.
    pub fn compare(
        &self,
        budget: f64,
        tier1: &[EntrantTier],
        tier2: &[EntrantTier],
        tier3: &[EntrantTier],
        field_size: u32,
    ) -> BetComparison {
        let budget = sanitize_budget(budget);

        let mut rows: Vec<ComparisonRow> = Vec::new();
        let mut skipped: Vec<String> = Vec::new();
        for &family in BetFamily::ALL {
            let result = self.optimizer.optimize(budget, tier1, tier2, tier3, family, field_size);
            let in_budget = result
                .recommended
                .as_ref()
                .filter(|pick| result.valid && pick.cost.total <= budget)
                .map(|pick| pick.expected_value);
            match in_budget {
                Some(score) => {
                    rows.push(ComparisonRow {
                        bet_family: family,
                        result,
                        score,
                        recommended: false,
                    });
                }
                None => {
                    skipped.push(format!(
                        "{family} ({})",
                        result.error.as_deref().unwrap_or("over budget")
                    ));
                }
            }
        }

        if rows.is_empty() {
            let error = format!("No bet family fits a {} budget: {}", format_money(budget), skipped.join("; "));
            return BetComparison {
                budget,
                rows,
                recommended: None,
                summary: error.clone(),
                valid: false,
                error: Some(error),
            };
        }

        rows.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| hit_of(b).total_cmp(&hit_of(a)))
        });
        rows[0].recommended = true;
        let best = rows[0].bet_family;

        let mut summary = format!(
            "{best} ranks first of {} with EV {}",
            rows.len(),
            signed_money(rows[0].score)
        );
        if !skipped.is_empty() {
            summary.push_str(&format!("; skipped {}", skipped.join(", ")));
        }

        info!(
            budget = format!("${:.2}", budget),
            families = rows.len(),
            best = %best,
            score = format!("${:.2}", rows[0].score),
            "Comparison complete"
        );

        BetComparison {
            budget,
            rows,
            recommended: Some(best),
            summary,
            valid: true,
            error: None,
        }
    }
}

fn hit_of(row: &ComparisonRow) -> f64 {
    row.result
        .recommended
        .as_ref()
        .map(|c| c.hit_probability)
        .unwrap_or(0.0)
}

/// Compare with the default optimizer.
pub fn compare_bet_families(
    budget: f64,
    tier1: &[EntrantTier],
    tier2: &[EntrantTier],
    tier3: &[EntrantTier],
    field_size: u32,
) -> BetComparison {
    ComparisonAggregator::default().compare(budget, tier1, tier2, tier3, field_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entrant(n: u32, odds: f64, p: f64) -> EntrantTier {
        EntrantTier {
            program_number: n,
            name: format!("Horse {n}"),
            tier: 1,
            win_probability: Some(p),
            odds,
            confidence: 80.0,
        }
    }

    #[test]
    fn test_exactly_one_recommended_row() {
        let t1 = vec![entrant(1, 2.0, 0.3), entrant(2, 3.5, 0.2)];
        let t2 = vec![entrant(3, 5.0, 0.15), entrant(4, 7.0, 0.1)];
        let t3 = vec![entrant(5, 15.0, 0.05)];
        let cmp = compare_bet_families(60.0, &t1, &t2, &t3, 9);
        assert!(cmp.valid);
        assert_eq!(cmp.rows.iter().filter(|r| r.recommended).count(), 1);
        assert!(cmp.rows[0].recommended);
        assert_eq!(cmp.recommended, Some(cmp.rows[0].bet_family));
        for pair in cmp.rows.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
        for row in &cmp.rows {
            assert!(row.result.valid);
            assert!(row.result.budget_used <= 60.0);
        }
    }

    #[test]
    fn test_families_without_enough_horses_are_skipped() {
        let t1 = vec![entrant(1, 2.0, 0.3), entrant(2, 3.5, 0.2)];
        let t2 = vec![entrant(3, 5.0, 0.15)];
        let cmp = compare_bet_families(20.0, &t1, &t2, &[], 6);
        assert!(cmp.valid);
        assert!(cmp.rows.iter().all(|r| r.bet_family != BetFamily::Superfecta));
        assert!(cmp.summary.contains("Superfecta"));
    }

    #[test]
    fn test_no_family_possible() {
        let cmp = compare_bet_families(20.0, &[entrant(1, 2.0, 0.5)], &[], &[], 6);
        assert!(!cmp.valid);
        assert!(cmp.rows.is_empty());
        assert!(cmp.recommended.is_none());
        assert!(cmp.error.unwrap().contains("No bet family fits"));
    }
}

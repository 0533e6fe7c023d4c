//! Request/report plumbing for the command-line front end.
//!
//! A request carries entrants that were already scored and tiered
//! upstream; the report bundles the family comparison with a payout
//! estimate and ROI band for each family's recommended ticket.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::comparison::ComparisonAggregator;
use crate::config::AppConfig;
use crate::optimizer::candidates::TieredPool;
use crate::optimizer::StructureOptimizer;
use crate::payout::{roi, PayoutEstimator};
use crate::types::{BetComparison, BetFamily, EntrantTier, EntrantWithOdds, PayoutEstimate, RoiRange, ToteError};

/// One recommendation request.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RaceRequest {
    #[serde(default)]
    pub budget: Option<f64>,
    #[serde(default)]
    pub field_size: Option<u32>,
    pub entrants: Vec<EntrantTier>,
}

impl RaceRequest {
    /// Split entrants by tier. Anything outside 1–3 is rejected.
    pub fn split_tiers(&self) -> Result<[Vec<EntrantTier>; 3], ToteError> {
        let mut tiers: [Vec<EntrantTier>; 3] = Default::default();
        for e in &self.entrants {
            match e.tier {
                1..=3 => tiers[usize::from(e.tier - 1)].push(e.clone()),
                other => {
                    return Err(ToteError::InvalidRequest(format!(
                        "entrant #{} has tier {other}, expected 1-3",
                        e.program_number
                    )))
                }
            }
        }
        Ok(tiers)
    }
}

/// Payout outlook for one family's recommended ticket.
#[derive(Debug, Clone, Serialize)]
pub struct FamilyOutlook {
    pub bet_family: BetFamily,
    pub estimate: PayoutEstimate,
    pub roi: RoiRange,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecommendationReport {
    pub generated_at: DateTime<Utc>,
    pub comparison: BetComparison,
    pub outlooks: Vec<FamilyOutlook>,
}

/// Run the comparison and payout estimates for `request`.
pub fn build_report(request: &RaceRequest, cfg: &AppConfig) -> Result<RecommendationReport, ToteError> {
    let [tier1, tier2, tier3] = request.split_tiers()?;
    // Same dedupe the optimizer applies: a horse listed twice keeps its first tier.
    let pool = TieredPool::new(&tier1, &tier2, &tier3);
    let budget = request.budget.unwrap_or(cfg.defaults.budget);
    let field_size = request
        .field_size
        .unwrap_or(cfg.defaults.field_size)
        .max(pool.len() as u32);

    debug!(
        entrants = request.entrants.len(),
        classified = pool.len(),
        tier1 = tier1.len(),
        tier2 = tier2.len(),
        tier3 = tier3.len(),
        budget,
        field_size,
        "Request parsed"
    );

    let aggregator = ComparisonAggregator::new(StructureOptimizer::new(cfg.optimizer_config()));
    let comparison = aggregator.compare(budget, &tier1, &tier2, &tier3, field_size);
    if !comparison.valid {
        warn!(error = ?comparison.error, "No bet family fits the request");
    }

    if pool.is_empty() {
        return Ok(RecommendationReport {
            generated_at: Utc::now(),
            comparison,
            outlooks: Vec::new(),
        });
    }

    let estimator = PayoutEstimator::new(cfg.payout_config());
    let outlooks = comparison
        .rows
        .iter()
        .filter_map(|row| {
            let pick = row.result.recommended.as_ref()?;
            let runners: Vec<EntrantWithOdds> = pool
                .all()
                .filter(|e| pick.position_sets.iter().any(|set| set.contains(&e.program_number)))
                .map(EntrantWithOdds::from)
                .collect();
            let estimate = estimator.estimate_ticket(&pick.cost, &runners);
            Some(FamilyOutlook {
                bet_family: row.bet_family,
                roi: roi(&estimate),
                estimate,
            })
        })
        .collect();

    Ok(RecommendationReport {
        generated_at: Utc::now(),
        comparison,
        outlooks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(json: &str) -> RaceRequest {
        serde_json::from_str(json).unwrap()
    }

    const SAMPLE: &str = r#"{
        "budget": 40,
        "field_size": 9,
        "entrants": [
            {"program_number": 1, "name": "Alpha", "tier": 1, "win_probability": 0.28, "odds": 2.5, "confidence": 88},
            {"program_number": 4, "name": "Bravo", "tier": 1, "odds": 3.0, "confidence": 81},
            {"program_number": 2, "name": "Charlie", "tier": 2, "odds": 5.0, "confidence": 64},
            {"program_number": 7, "name": "Delta", "tier": 2, "odds": 8.0, "confidence": 58},
            {"program_number": 9, "name": "Echo", "tier": 3, "odds": 15.0, "confidence": 31}
        ]
    }"#;

    #[test]
    fn test_split_tiers() {
        let req = request(SAMPLE);
        let [t1, t2, t3] = req.split_tiers().unwrap();
        assert_eq!(t1.len(), 2);
        assert_eq!(t2.len(), 2);
        assert_eq!(t3.len(), 1);
    }

    #[test]
    fn test_bad_tier_rejected() {
        let req = request(r#"{"entrants":[{"program_number":1,"name":"X","tier":4,"odds":3,"confidence":10}]}"#);
        let err = req.split_tiers().unwrap_err();
        assert!(err.to_string().contains("tier 4"));
    }

    #[test]
    fn test_report_has_outlook_per_row() {
        let report = build_report(&request(SAMPLE), &AppConfig::default()).unwrap();
        assert!(report.comparison.valid);
        assert_eq!(report.outlooks.len(), report.comparison.rows.len());
        for outlook in &report.outlooks {
            let row = report
                .comparison
                .rows
                .iter()
                .find(|r| r.bet_family == outlook.bet_family)
                .unwrap();
            let pick = row.result.recommended.as_ref().unwrap();
            assert_eq!(outlook.estimate.combinations, pick.cost.combinations);
            assert_eq!(outlook.estimate.total_cost, pick.cost.total);
        }
    }

    #[test]
    fn test_horse_listed_in_two_tiers_appears_once() {
        let req = request(
            r#"{
            "budget": 40,
            "entrants": [
                {"program_number": 1, "name": "Alpha", "tier": 1, "odds": 2.0, "confidence": 90},
                {"program_number": 2, "name": "Bravo", "tier": 1, "odds": 3.0, "confidence": 85},
                {"program_number": 3, "name": "Charlie", "tier": 2, "odds": 5.0, "confidence": 70},
                {"program_number": 1, "name": "Alpha", "tier": 2, "odds": 2.0, "confidence": 60},
                {"program_number": 4, "name": "Delta", "tier": 3, "odds": 12.0, "confidence": 30}
            ]
        }"#,
        );
        let report = build_report(&req, &AppConfig::default()).unwrap();
        assert!(!report.outlooks.is_empty());
        for outlook in &report.outlooks {
            for scenario in &outlook.estimate.scenarios {
                let mut seen = scenario.entrants.clone();
                seen.sort_unstable();
                seen.dedup();
                assert_eq!(seen.len(), scenario.entrants.len(), "{}", scenario.description);
            }
        }
    }

    #[test]
    fn test_request_defaults_from_config() {
        let req = request(r#"{"entrants":[]}"#);
        let report = build_report(&req, &AppConfig::default()).unwrap();
        assert!(!report.comparison.valid);
        assert_eq!(report.comparison.budget, AppConfig::default().defaults.budget);
        assert!(report.outlooks.is_empty());
    }
}

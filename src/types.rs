//! Shared types for the TOTE wager engine.
//!
//! These types form the data model used across the cost calculator,
//! payout estimator, structure optimizer and comparison aggregator.
//! Everything here is built fresh per call and never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Saddle-cloth / program number of an entrant.
pub type ProgramNumber = u32;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Exotic bet family, keyed by how many finishing positions it covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BetFamily {
    Exacta,
    Trifecta,
    Superfecta,
}

impl BetFamily {
    /// All families, in ascending position count.
    pub const ALL: &'static [BetFamily] = &[
        BetFamily::Exacta,
        BetFamily::Trifecta,
        BetFamily::Superfecta,
    ];

    /// Number of finishing positions the ticket must name.
    pub fn positions(&self) -> usize {
        match self {
            BetFamily::Exacta => 2,
            BetFamily::Trifecta => 3,
            BetFamily::Superfecta => 4,
        }
    }

    /// Fewest distinct entrants any ticket of this family can be built from.
    pub fn min_entrants(&self) -> usize {
        self.positions()
    }
}

impl fmt::Display for BetFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BetFamily::Exacta => write!(f, "Exacta"),
            BetFamily::Trifecta => write!(f, "Trifecta"),
            BetFamily::Superfecta => write!(f, "Superfecta"),
        }
    }
}

/// Parse a bet family name (case-insensitive).
impl std::str::FromStr for BetFamily {
    type Err = ToteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "exacta" | "ex" => Ok(BetFamily::Exacta),
            "trifecta" | "tri" => Ok(BetFamily::Trifecta),
            "superfecta" | "super" => Ok(BetFamily::Superfecta),
            _ => Err(ToteError::UnknownBetFamily(s.to_string())),
        }
    }
}

/// Ticket shape tag. Closed set: adding a shape is a compile-checked change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TicketShape {
    Box,
    KeyOver,
    KeyUnder,
    Wheel,
    PartWheel,
    Straight,
}

impl fmt::Display for TicketShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TicketShape::Box => write!(f, "box"),
            TicketShape::KeyOver => write!(f, "key over"),
            TicketShape::KeyUnder => write!(f, "key under"),
            TicketShape::Wheel => write!(f, "wheel"),
            TicketShape::PartWheel => write!(f, "part-wheel"),
            TicketShape::Straight => write!(f, "straight"),
        }
    }
}

/// A ticket request: the shape together with the horses named for each
/// finishing position. Entrant numbers are raw caller input and get
/// sanitized by the cost calculator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Ticket {
    /// Every entrant may fill every position.
    Box { entrants: Vec<i64> },
    /// Key pinned to 1st. `others` holds one set per remaining position,
    /// or a single set shared by all of them.
    KeyOver { key: Vec<i64>, others: Vec<Vec<i64>> },
    /// Key pinned to 2nd; same `others` convention as `KeyOver`.
    KeyUnder { key: Vec<i64>, others: Vec<Vec<i64>> },
    /// Key wins; the rest of a `field_size` field fills the other positions.
    Wheel { key: Vec<i64>, field_size: u32 },
    /// Independently chosen set per position.
    PartWheel { positions: Vec<Vec<i64>> },
    /// Exactly one entrant per position.
    Straight { positions: Vec<i64> },
}

impl Ticket {
    pub fn shape(&self) -> TicketShape {
        match self {
            Ticket::Box { .. } => TicketShape::Box,
            Ticket::KeyOver { .. } => TicketShape::KeyOver,
            Ticket::KeyUnder { .. } => TicketShape::KeyUnder,
            Ticket::Wheel { .. } => TicketShape::Wheel,
            Ticket::PartWheel { .. } => TicketShape::PartWheel,
            Ticket::Straight { .. } => TicketShape::Straight,
        }
    }
}

/// Allowed base-stake denominations, ascending.
pub const STAKE_DENOMINATIONS: [f64; 6] = [0.10, 0.50, 1.0, 2.0, 5.0, 10.0];

/// Stake bounds applied to every caller-supplied stake.
pub const MIN_STAKE: f64 = 0.10;
pub const MAX_STAKE: f64 = 100.0;

/// Ordinal label for a 1-based finishing position ("1st", "2nd", ...).
pub fn ordinal(position: usize) -> String {
    let suffix = match position {
        1 => "st",
        2 => "nd",
        3 => "rd",
        _ => "th",
    };
    format!("{position}{suffix}")
}

/// Render a set of program numbers as "1, 2, 3".
pub fn format_set(set: &[ProgramNumber]) -> String {
    set.iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Render a dollar amount the way the UI expects it.
pub fn format_money(amount: f64) -> String {
    format!("${amount:.2}")
}

// ---------------------------------------------------------------------------
// Cost
// ---------------------------------------------------------------------------

/// Priced ticket. `total == round2(combinations * stake)`; an invalid
/// ticket always carries zero total and zero combinations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TicketCost {
    pub total: f64,
    pub combinations: u64,
    pub cost_per_combination: f64,
    pub stake: f64,
    pub bet_family: BetFamily,
    pub shape: TicketShape,
    pub explanation: String,
    /// One line per finishing position, e.g. "1st: 4, 7".
    pub breakdown: Vec<String>,
    pub valid: bool,
    pub error: Option<String>,
}

impl fmt::Display for TicketCost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.explanation)
    }
}

// ---------------------------------------------------------------------------
// Entrants
// ---------------------------------------------------------------------------

/// Scored entrant, pre-classified into a confidence tier upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntrantTier {
    pub program_number: ProgramNumber,
    pub name: String,
    /// 1 = strongest contenders, 3 = fringe.
    pub tier: u8,
    /// Model win probability (0–1). Falls back to an odds-implied figure.
    #[serde(default)]
    pub win_probability: Option<f64>,
    /// Current market odds-to-1.
    pub odds: f64,
    /// Scoring-engine confidence (0–100).
    pub confidence: f64,
}

impl fmt::Display for EntrantTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {} (tier {}, {}-1, conf {:.0})",
            self.program_number, self.name, self.tier, self.odds, self.confidence,
        )
    }
}

/// Entrant as seen by the payout estimator. Favorite/longshot flags are
/// derived from the odds, never supplied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntrantWithOdds {
    pub program_number: ProgramNumber,
    pub name: String,
    pub odds: f64,
    pub confidence: f64,
    pub is_favorite: bool,
    pub is_longshot: bool,
}

/// Odds at or below which an entrant counts as a favorite.
pub const FAVORITE_MAX_ODDS: f64 = 3.0;
/// Odds at or above which an entrant counts as a longshot.
pub const LONGSHOT_MIN_ODDS: f64 = 10.0;

impl EntrantWithOdds {
    pub fn new(program_number: ProgramNumber, name: impl Into<String>, odds: f64, confidence: f64) -> Self {
        let odds = crate::sanitize::sanitize_odds(odds);
        Self {
            program_number,
            name: name.into(),
            odds,
            confidence,
            is_favorite: odds <= FAVORITE_MAX_ODDS,
            is_longshot: odds >= LONGSHOT_MIN_ODDS,
        }
    }
}

impl From<&EntrantTier> for EntrantWithOdds {
    fn from(e: &EntrantTier) -> Self {
        EntrantWithOdds::new(e.program_number, e.name.clone(), e.odds, e.confidence)
    }
}

// ---------------------------------------------------------------------------
// Optimizer output
// ---------------------------------------------------------------------------

/// One priced and scored ticket structure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateStructure {
    /// Short catalog name, e.g. "Box top tier".
    pub label: String,
    pub shape: TicketShape,
    pub cost: TicketCost,
    pub expected_value: f64,
    pub hit_probability: f64,
    pub position_sets: Vec<Vec<ProgramNumber>>,
    pub stake: f64,
    pub budget_remaining: f64,
    pub recommended: bool,
    pub rationale: String,
}

/// Result of a single-family optimization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizationResult {
    pub bet_family: BetFamily,
    pub budget: f64,
    /// In-budget candidates, best expected value first.
    pub candidates: Vec<CandidateStructure>,
    pub recommended: Option<CandidateStructure>,
    pub budget_used: f64,
    pub budget_remaining: f64,
    pub summary: String,
    pub valid: bool,
    pub error: Option<String>,
}

impl OptimizationResult {
    pub(crate) fn invalid(bet_family: BetFamily, budget: f64, error: String) -> Self {
        Self {
            bet_family,
            budget,
            candidates: Vec::new(),
            recommended: None,
            budget_used: 0.0,
            budget_remaining: budget,
            summary: error.clone(),
            valid: false,
            error: Some(error),
        }
    }
}

// ---------------------------------------------------------------------------
// Payout output
// ---------------------------------------------------------------------------

/// A named finishing-order scenario with a fixed heuristic weight.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayoutScenario {
    pub name: String,
    pub description: String,
    pub entrants: Vec<ProgramNumber>,
    pub payout: f64,
    pub probability: f64,
    pub display: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayoutRange {
    pub minimum: f64,
    pub maximum: f64,
    /// Probability-weighted mean over the scenarios.
    pub likely: f64,
    pub display: String,
    /// Likely payout per unit of base stake.
    pub per_unit_ratio: f64,
}

impl PayoutRange {
    pub(crate) fn empty() -> Self {
        Self {
            minimum: 0.0,
            maximum: 0.0,
            likely: 0.0,
            display: format_money(0.0),
            per_unit_ratio: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayoutEstimate {
    pub bet_family: BetFamily,
    pub stake: f64,
    pub combinations: u64,
    pub total_cost: f64,
    pub range: PayoutRange,
    pub scenarios: Vec<PayoutScenario>,
    pub valid: bool,
    pub error: Option<String>,
}

/// Return-on-investment bounds for a payout estimate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RoiRange {
    pub minimum: f64,
    pub maximum: f64,
    pub likely: f64,
}

impl fmt::Display for RoiRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ROI {:.0}% to {:.0}% (likely {:.0}%)",
            self.minimum * 100.0,
            self.maximum * 100.0,
            self.likely * 100.0,
        )
    }
}

// ---------------------------------------------------------------------------
// Comparison output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub bet_family: BetFamily,
    pub result: OptimizationResult,
    pub score: f64,
    pub recommended: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BetComparison {
    pub budget: f64,
    /// Valid in-budget rows, best score first.
    pub rows: Vec<ComparisonRow>,
    pub recommended: Option<BetFamily>,
    pub summary: String,
    pub valid: bool,
    pub error: Option<String>,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Reasons a ticket cannot be priced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TicketError {
    #[error("{family} requires at least {required} horses, got {found}")]
    InsufficientEntrants {
        family: BetFamily,
        required: usize,
        found: usize,
    },

    #[error("Key ticket requires at least one key horse")]
    MissingKey,

    #[error("{family} needs {expected} position selections, got {found}")]
    PositionCount {
        family: BetFamily,
        expected: usize,
        found: usize,
    },

    #[error("No valid combinations: every ticket would repeat a horse")]
    NoValidCombinations,

    #[error("Straight ticket names #{program_number} in more than one position")]
    DuplicateStraight { program_number: ProgramNumber },

    #[error("Ticket covers more than {limit} combinations")]
    TooManyCombinations { limit: u64 },
}

/// Domain-specific error types for TOTE.
#[derive(Debug, thiserror::Error)]
pub enum ToteError {
    #[error("Unknown bet family: {0}")]
    UnknownBetFamily(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Ticket cost calculator.
//!
//! Prices every ticket shape for every bet family: exact combination
//! count, total cost at a base stake, and a human-readable explanation.
//! Expected failures (too few horses, a structure that can only repeat a
//! horse, a straight naming one horse twice) come back as an invalid
//! `TicketCost`, never as a panic.

pub mod combinatorics;

use tracing::debug;

use crate::sanitize::{money_product, sanitize_entrants, sanitize_stake};
use crate::types::{
    format_money, format_set, ordinal, BetFamily, ProgramNumber, Ticket, TicketCost, TicketError,
    TicketShape,
};
use combinatorics::{count_distinct_tuples, falling_factorial, tuple_upper_bound};

/// Largest field a wheel will expand to.
pub const MAX_FIELD_SIZE: u32 = 30;

/// Largest ticket the calculator will price. Also bounds the exhaustive
/// repeat-exclusion walk for keys and part-wheels.
pub const MAX_COMBINATIONS: u64 = 1_000_000;

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Price any ticket.
pub fn calculate_cost(ticket: &Ticket, family: BetFamily, stake: f64) -> TicketCost {
    match ticket {
        Ticket::Box { entrants } => calculate_box(family, entrants, stake),
        Ticket::KeyOver { key, others } => calculate_key_over(family, key, others, stake),
        Ticket::KeyUnder { key, others } => calculate_key_under(family, key, others, stake),
        Ticket::Wheel { key, field_size } => calculate_wheel(family, key, *field_size, stake),
        Ticket::PartWheel { positions } => calculate_part_wheel(family, positions, stake),
        Ticket::Straight { positions } => calculate_straight(family, positions, stake),
    }
}

/// Box: every entrant may finish in every covered position.
pub fn calculate_box(family: BetFamily, entrants: &[i64], stake: f64) -> TicketCost {
    finish(family, TicketShape::Box, stake, layout_box(family, entrants))
}

/// Key pinned to 1st, `others` filling 2nd and below.
pub fn calculate_key_over(family: BetFamily, key: &[i64], others: &[Vec<i64>], stake: f64) -> TicketCost {
    finish(
        family,
        TicketShape::KeyOver,
        stake,
        layout_key(family, key, others, KeySlot::Over),
    )
}

/// Key pinned to 2nd, `others` filling 1st, 3rd and below.
pub fn calculate_key_under(family: BetFamily, key: &[i64], others: &[Vec<i64>], stake: f64) -> TicketCost {
    finish(
        family,
        TicketShape::KeyUnder,
        stake,
        layout_key(family, key, others, KeySlot::Under),
    )
}

/// Key wins; every other runner in a field of `field_size` fills the rest.
pub fn calculate_wheel(family: BetFamily, key: &[i64], field_size: u32, stake: f64) -> TicketCost {
    finish(family, TicketShape::Wheel, stake, layout_wheel(family, key, field_size))
}

/// One independently chosen set per finishing position.
pub fn calculate_part_wheel(family: BetFamily, positions: &[Vec<i64>], stake: f64) -> TicketCost {
    finish(family, TicketShape::PartWheel, stake, layout_part_wheel(family, positions))
}

/// One horse per position, single combination.
pub fn calculate_straight(family: BetFamily, positions: &[i64], stake: f64) -> TicketCost {
    finish(family, TicketShape::Straight, stake, layout_straight(family, positions))
}

// ---------------------------------------------------------------------------
// Layouts
// ---------------------------------------------------------------------------

/// A priced arrangement before the stake is applied.
struct Layout {
    combinations: u64,
    summary: String,
    breakdown: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeySlot {
    Over,
    Under,
}

fn layout_box(family: BetFamily, entrants: &[i64]) -> Result<Layout, TicketError> {
    let k = family.positions();
    let pool = sanitize_entrants(entrants);
    require_entrants(family, pool.len())?;

    Ok(Layout {
        combinations: within_limit(falling_factorial(pool.len() as u64, k as u64))?,
        summary: format!("box with {} horses", pool.len()),
        breakdown: vec![format!("{}-{}: {}", ordinal(1), ordinal(k), format_set(&pool))],
    })
}

fn layout_key(
    family: BetFamily,
    key: &[i64],
    others: &[Vec<i64>],
    slot: KeySlot,
) -> Result<Layout, TicketError> {
    let k = family.positions();
    let key = sanitize_entrants(key);
    if key.is_empty() {
        return Err(TicketError::MissingKey);
    }

    // One shared set, or exactly one set per remaining position.
    let raw_sets: Vec<&Vec<i64>> = match others.len() {
        1 => std::iter::repeat(&others[0]).take(k - 1).collect(),
        n if n == k - 1 => others.iter().collect(),
        n => {
            return Err(TicketError::PositionCount {
                family,
                expected: k,
                found: n + 1,
            })
        }
    };
    let other_sets: Vec<Vec<ProgramNumber>> = raw_sets
        .into_iter()
        .map(|raw| {
            sanitize_entrants(raw)
                .into_iter()
                .filter(|n| !key.contains(n))
                .collect()
        })
        .collect();

    let mut with: Vec<ProgramNumber> = Vec::new();
    for n in other_sets.iter().flatten() {
        if !with.contains(n) {
            with.push(*n);
        }
    }
    require_entrants(family, key.len() + with.len())?;

    let key_index = match slot {
        KeySlot::Over => 0,
        KeySlot::Under => 1,
    };
    let mut sets = other_sets;
    sets.insert(key_index, key.clone());
    within_limit(tuple_upper_bound(&sets))?;

    let combinations = count_distinct_tuples(&sets);
    if combinations == 0 {
        return Err(TicketError::NoValidCombinations);
    }

    let direction = match slot {
        KeySlot::Over => "over",
        KeySlot::Under => "under",
    };
    Ok(Layout {
        combinations,
        summary: format!("key {} {direction} {}", format_set(&key), format_set(&with)),
        breakdown: position_lines(&sets),
    })
}

fn layout_wheel(family: BetFamily, key: &[i64], field_size: u32) -> Result<Layout, TicketError> {
    let k = family.positions();
    let field_size = field_size.min(MAX_FIELD_SIZE);
    // Keys outside the field are not runners in this race.
    let key: Vec<ProgramNumber> = sanitize_entrants(key)
        .into_iter()
        .filter(|&n| n <= field_size)
        .collect();
    if key.is_empty() {
        return Err(TicketError::MissingKey);
    }

    let rest: Vec<ProgramNumber> = (1..=field_size).filter(|n| !key.contains(n)).collect();
    require_entrants(family, key.len() + rest.len())?;

    let combinations = within_limit(
        falling_factorial(rest.len() as u64, (k - 1) as u64).and_then(|f| f.checked_mul(key.len() as u64)),
    )?;
    if combinations == 0 {
        return Err(TicketError::NoValidCombinations);
    }

    let mut breakdown = vec![format!("{}: {}", ordinal(1), format_set(&key))];
    breakdown.extend((2..=k).map(|p| format!("{}: ALL ({})", ordinal(p), format_set(&rest))));
    Ok(Layout {
        combinations,
        summary: format!("wheel {} over a field of {field_size}", format_set(&key)),
        breakdown,
    })
}

fn layout_part_wheel(family: BetFamily, positions: &[Vec<i64>]) -> Result<Layout, TicketError> {
    let k = family.positions();
    if positions.len() != k {
        return Err(TicketError::PositionCount {
            family,
            expected: k,
            found: positions.len(),
        });
    }
    let sets: Vec<Vec<ProgramNumber>> = positions.iter().map(|p| sanitize_entrants(p)).collect();

    let mut union: Vec<ProgramNumber> = Vec::new();
    for n in sets.iter().flatten() {
        if !union.contains(n) {
            union.push(*n);
        }
    }
    require_entrants(family, union.len())?;
    within_limit(tuple_upper_bound(&sets))?;

    let combinations = count_distinct_tuples(&sets);
    if combinations == 0 {
        return Err(TicketError::NoValidCombinations);
    }

    let sizes = sets.iter().map(|s| s.len().to_string()).collect::<Vec<_>>().join("x");
    Ok(Layout {
        combinations,
        summary: format!("part-wheel {sizes}"),
        breakdown: position_lines(&sets),
    })
}

fn layout_straight(family: BetFamily, positions: &[i64]) -> Result<Layout, TicketError> {
    let k = family.positions();
    if positions.len() != k {
        return Err(TicketError::PositionCount {
            family,
            expected: k,
            found: positions.len(),
        });
    }

    let mut picks: Vec<ProgramNumber> = Vec::with_capacity(k);
    for &raw in positions {
        let Some(n) = ProgramNumber::try_from(raw).ok().filter(|&n| n > 0) else {
            continue;
        };
        if picks.contains(&n) {
            return Err(TicketError::DuplicateStraight { program_number: n });
        }
        picks.push(n);
    }
    require_entrants(family, picks.len())?;

    Ok(Layout {
        combinations: 1,
        summary: format!("straight {}", picks.iter().map(|n| n.to_string()).collect::<Vec<_>>().join("-")),
        breakdown: position_lines(&picks.iter().map(|&n| vec![n]).collect::<Vec<_>>()),
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn require_entrants(family: BetFamily, found: usize) -> Result<(), TicketError> {
    let required = family.min_entrants();
    if found < required {
        return Err(TicketError::InsufficientEntrants {
            family,
            required,
            found,
        });
    }
    Ok(())
}

/// Reject counts that overflowed or exceed `MAX_COMBINATIONS`.
fn within_limit(count: Option<u64>) -> Result<u64, TicketError> {
    match count {
        Some(c) if c <= MAX_COMBINATIONS => Ok(c),
        _ => Err(TicketError::TooManyCombinations {
            limit: MAX_COMBINATIONS,
        }),
    }
}

fn position_lines(sets: &[Vec<ProgramNumber>]) -> Vec<String> {
    sets.iter()
        .enumerate()
        .map(|(i, set)| format!("{}: {}", ordinal(i + 1), format_set(set)))
        .collect()
}

/// Apply the stake to a layout (or its failure) and build the result.
fn finish(
    family: BetFamily,
    shape: TicketShape,
    stake: f64,
    layout: Result<Layout, TicketError>,
) -> TicketCost {
    let stake = sanitize_stake(stake);

    match layout {
        Ok(layout) => {
            let total = money_product(layout.combinations, stake);
            let plural = if layout.combinations == 1 { "" } else { "s" };
            let explanation = format!(
                "{family} {}: {} combination{plural} × {} = {}",
                layout.summary,
                layout.combinations,
                format_money(stake),
                format_money(total),
            );
            debug!(
                family = %family,
                shape = %shape,
                combinations = layout.combinations,
                total = format!("${:.2}", total),
                "Ticket priced"
            );
            TicketCost {
                total,
                combinations: layout.combinations,
                cost_per_combination: stake,
                stake,
                bet_family: family,
                shape,
                explanation,
                breakdown: layout.breakdown,
                valid: true,
                error: None,
            }
        }
        Err(e) => {
            debug!(family = %family, shape = %shape, error = %e, "Ticket rejected");
            TicketCost {
                total: 0.0,
                combinations: 0,
                cost_per_combination: stake,
                stake,
                bet_family: family,
                shape,
                explanation: format!("{family} {shape}: {e}"),
                breakdown: Vec::new(),
                valid: false,
                error: Some(e.to_string()),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

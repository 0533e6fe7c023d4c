//! Named finishing scenarios.

use crate::types::{format_money, BetFamily, EntrantWithOdds, PayoutScenario};

use super::PayoutConfig;

/// Fixed heuristic weight per scenario class. `longshot` is unused for
/// the exacta, which has no "one longshot mixed in" scenario.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScenarioWeights {
    pub chalk: f64,
    pub mixed: f64,
    pub longshot: f64,
    pub upset: f64,
}

pub fn weights_for(family: BetFamily) -> ScenarioWeights {
    match family {
        BetFamily::Exacta => ScenarioWeights {
            chalk: 0.30,
            mixed: 0.20,
            longshot: 0.0,
            upset: 0.05,
        },
        BetFamily::Trifecta => ScenarioWeights {
            chalk: 0.15,
            mixed: 0.10,
            longshot: 0.06,
            upset: 0.02,
        },
        BetFamily::Superfecta => ScenarioWeights {
            chalk: 0.08,
            mixed: 0.05,
            longshot: 0.02,
            upset: 0.005,
        },
    }
}

/// Build the scenario list for `entrants` (any order).
///
/// With entrants sorted by odds (shortest first) as `s` and `k` positions:
/// * Chalk: `s[0..k]`
/// * Mixed: `s[0..k-1]` then the mid-pack runner `s[max(n/2, k)]`
/// * Longshot (trifecta/superfecta): `s[0..k-1]` then the first longshot
///   priced behind the chalk finish, unless that finish is already Mixed
/// * Upset / Bomb: that longshot first, then `s[0..k-1]`
pub fn build_scenarios(
    config: &PayoutConfig,
    family: BetFamily,
    entrants: &[EntrantWithOdds],
    stake: f64,
) -> Vec<PayoutScenario> {
    let k = family.positions();
    let n = entrants.len();
    if n < k {
        return Vec::new();
    }

    let mut sorted: Vec<&EntrantWithOdds> = entrants.iter().collect();
    sorted.sort_by(|a, b| a.odds.total_cmp(&b.odds));

    let weights = weights_for(family);
    let make = |name: &str, blurb: &str, order: Vec<&EntrantWithOdds>, probability: f64| {
        scenario(config, family, stake, name, blurb, &order, probability)
    };
    let head = &sorted[..k - 1];

    let mut out = Vec::new();
    out.push(make(
        "Chalk",
        "Favorites finish in odds order",
        sorted[..k].to_vec(),
        weights.chalk,
    ));

    let mid = (n / 2).max(k);
    if mid < n {
        let mut order = head.to_vec();
        order.push(sorted[mid]);
        out.push(make("Mixed", "Mid-priced runner completes the ticket", order, weights.mixed));
    }

    let longshot = sorted
        .iter()
        .enumerate()
        .skip(k - 1)
        .find(|(_, e)| e.is_longshot)
        .map(|(i, e)| (i, *e));

    if let Some((index, bomb)) = longshot {
        // Below k the finish is chalk; at `mid` it is already "Mixed".
        if family != BetFamily::Exacta && index >= k && index != mid {
            let mut order = head.to_vec();
            order.push(bomb);
            out.push(make("Longshot", "A longshot sneaks into the last spot", order, weights.longshot));
        }

        let mut order = vec![bomb];
        order.extend_from_slice(head);
        let (name, blurb) = match family {
            BetFamily::Exacta => ("Upset", "Longshot beats the favorite"),
            BetFamily::Trifecta | BetFamily::Superfecta => ("Bomb", "Longshot wins over the chalk"),
        };
        out.push(make(name, blurb, order, weights.upset));
    }

    out
}

fn scenario(
    config: &PayoutConfig,
    family: BetFamily,
    stake: f64,
    name: &str,
    blurb: &str,
    order: &[&EntrantWithOdds],
    probability: f64,
) -> PayoutScenario {
    let odds_product: f64 = order.iter().map(|e| e.odds).product();
    let payout = config.payout(family, odds_product, stake);
    let finish = order
        .iter()
        .map(|e| format!("#{} {}", e.program_number, e.name))
        .collect::<Vec<_>>()
        .join(" / ");

    PayoutScenario {
        name: name.to_string(),
        description: format!("{blurb}: {finish}"),
        entrants: order.iter().map(|e| e.program_number).collect(),
        payout,
        probability,
        display: format_money(payout),
    }
}

//! Candidate structure catalog.
//!
//! Every bet family gets the same four core structures; trifecta and
//! superfecta add a part-wheel with the top tier over a shared pool. Each
//! entry is only produced when its entrant-count precondition holds.

use crate::types::{BetFamily, EntrantTier, ProgramNumber, Ticket};

/// Classified entrant pool, deduplicated across tiers (first tier wins).
#[derive(Debug, Clone, Default)]
pub struct TieredPool {
    pub tier1: Vec<EntrantTier>,
    pub tier2: Vec<EntrantTier>,
    pub tier3: Vec<EntrantTier>,
}

impl TieredPool {
    pub fn new(tier1: &[EntrantTier], tier2: &[EntrantTier], tier3: &[EntrantTier]) -> Self {
        let mut seen: Vec<ProgramNumber> = Vec::new();
        let mut take = |tier: &[EntrantTier]| -> Vec<EntrantTier> {
            tier.iter()
                .filter(|e| e.program_number > 0)
                .filter(|e| {
                    if seen.contains(&e.program_number) {
                        false
                    } else {
                        seen.push(e.program_number);
                        true
                    }
                })
                .cloned()
                .collect()
        };
        let tier1 = take(tier1);
        let tier2 = take(tier2);
        let tier3 = take(tier3);
        Self { tier1, tier2, tier3 }
    }

    pub fn len(&self) -> usize {
        self.tier1.len() + self.tier2.len() + self.tier3.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every classified entrant, tier order.
    pub fn all(&self) -> impl Iterator<Item = &EntrantTier> {
        self.tier1.iter().chain(self.tier2.iter()).chain(self.tier3.iter())
    }

    /// Top `limit` entrants ranked by tier, then confidence (highest first).
    pub fn ranked(&self, limit: usize) -> Vec<ProgramNumber> {
        let mut ranked: Vec<(usize, &EntrantTier)> = Vec::with_capacity(self.len());
        for (rank, tier) in [&self.tier1, &self.tier2, &self.tier3].into_iter().enumerate() {
            ranked.extend(tier.iter().map(|e| (rank, e)));
        }
        ranked.sort_by(|(ta, a), (tb, b)| ta.cmp(tb).then(b.confidence.total_cmp(&a.confidence)));
        ranked.into_iter().take(limit).map(|(_, e)| e.program_number).collect()
    }

    pub fn find(&self, program_number: ProgramNumber) -> Option<&EntrantTier> {
        self.all().find(|e| e.program_number == program_number)
    }
}

fn numbers(entrants: &[EntrantTier]) -> Vec<ProgramNumber> {
    entrants.iter().map(|e| e.program_number).collect()
}

fn raw(set: &[ProgramNumber]) -> Vec<i64> {
    set.iter().map(|&n| i64::from(n)).collect()
}

/// A catalog entry, not yet priced.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub label: String,
    pub ticket: Ticket,
    /// Entrants eligible for each finishing position.
    pub position_sets: Vec<Vec<ProgramNumber>>,
}

impl CatalogEntry {
    fn boxed(label: String, pool: &[ProgramNumber], k: usize) -> Self {
        Self {
            label,
            ticket: Ticket::Box { entrants: raw(pool) },
            position_sets: vec![pool.to_vec(); k],
        }
    }

    fn keyed(label: String, key: &[ProgramNumber], others: &[ProgramNumber], k: usize) -> Self {
        let mut position_sets = vec![key.to_vec()];
        position_sets.extend(std::iter::repeat(others.to_vec()).take(k - 1));
        Self {
            label,
            ticket: Ticket::KeyOver {
                key: raw(key),
                others: vec![raw(others)],
            },
            position_sets,
        }
    }

    /// Distinct entrants named anywhere on the ticket.
    pub fn entrants(&self) -> Vec<ProgramNumber> {
        let mut out: Vec<ProgramNumber> = Vec::new();
        for n in self.position_sets.iter().flatten() {
            if !out.contains(n) {
                out.push(*n);
            }
        }
        out
    }
}

/// Build the catalog for one family.
pub fn build_catalog(family: BetFamily, pool: &TieredPool, max_box_size: usize) -> Vec<CatalogEntry> {
    let k = family.positions();
    let t1 = numbers(&pool.tier1);
    let t2 = numbers(&pool.tier2);
    let t3 = numbers(&pool.tier3);
    let mut field: Vec<ProgramNumber> = t2.clone();
    field.extend(&t3);

    let mut catalog = Vec::new();

    if t1.len() >= k {
        catalog.push(CatalogEntry::boxed(format!("Box tier 1 ({})", t1.len()), &t1, k));
    }

    if !t1.is_empty() && t2.len() >= k - 1 {
        catalog.push(CatalogEntry::keyed("Key tier 1 over tier 2".to_string(), &t1, &t2, k));
    }

    if !t1.is_empty() && !t3.is_empty() && field.len() >= k - 1 {
        catalog.push(CatalogEntry::keyed("Key tier 1 over the field".to_string(), &t1, &field, k));
    }

    let top = pool.ranked(max_box_size);
    let same_as_tier1 = top.len() == t1.len() && top.iter().all(|n| t1.contains(n));
    if top.len() >= k && !same_as_tier1 {
        catalog.push(CatalogEntry::boxed(format!("Box top {}", top.len()), &top, k));
    }

    if family != BetFamily::Exacta && !t1.is_empty() && t1.len() + t2.len() >= k {
        let mut shared = t1.clone();
        shared.extend(&t2);
        let mut position_sets = vec![t1.clone()];
        position_sets.extend(std::iter::repeat(shared).take(k - 1));
        catalog.push(CatalogEntry {
            label: "Part-wheel tier 1 over tiers 1-2".to_string(),
            ticket: Ticket::PartWheel {
                positions: position_sets.iter().map(|s| raw(s)).collect(),
            },
            position_sets,
        });
    }

    catalog
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tier(numbers: &[u32], tier: u8) -> Vec<EntrantTier> {
        numbers
            .iter()
            .map(|&n| EntrantTier {
                program_number: n,
                name: format!("H{n}"),
                tier,
                win_probability: None,
                odds: 5.0,
                confidence: 100.0 - n as f64,
            })
            .collect()
    }

    fn labels(c: &[CatalogEntry]) -> Vec<&str> {
        c.iter().map(|e| e.label.as_str()).collect()
    }

    #[test]
    fn test_pool_dedupes_across_tiers() {
        let pool = TieredPool::new(&tier(&[1, 2], 1), &tier(&[2, 3], 2), &tier(&[0, 3, 4], 3));
        assert_eq!(numbers(&pool.tier1), vec![1, 2]);
        assert_eq!(numbers(&pool.tier2), vec![3]);
        assert_eq!(numbers(&pool.tier3), vec![4]);
        assert_eq!(pool.len(), 4);
    }

    #[test]
    fn test_ranked_by_tier_then_confidence() {
        let mut t2 = tier(&[5, 6], 2);
        t2[1].confidence = 99.0;
        let pool = TieredPool::new(&tier(&[1], 1), &t2, &tier(&[7], 3));
        assert_eq!(pool.ranked(10), vec![1, 6, 5, 7]);
        assert_eq!(pool.ranked(2), vec![1, 6]);
    }

    #[test]
    fn test_exacta_catalog() {
        let pool = TieredPool::new(&tier(&[1, 2], 1), &tier(&[3, 4], 2), &tier(&[5, 6], 3));
        let c = build_catalog(BetFamily::Exacta, &pool, 5);
        assert_eq!(
            labels(&c),
            vec!["Box tier 1 (2)", "Key tier 1 over tier 2", "Key tier 1 over the field", "Box top 5"]
        );
        assert_eq!(c[2].position_sets[1], vec![3, 4, 5, 6]);
        assert_eq!(c[3].position_sets[0], vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_trifecta_adds_part_wheel() {
        let pool = TieredPool::new(&tier(&[1], 1), &tier(&[2, 3], 2), &[]);
        let c = build_catalog(BetFamily::Trifecta, &pool, 5);
        assert_eq!(labels(&c), vec!["Key tier 1 over tier 2", "Box top 3", "Part-wheel tier 1 over tiers 1-2"]);
        let pw = c.last().unwrap();
        assert_eq!(pw.position_sets, vec![vec![1], vec![1, 2, 3], vec![1, 2, 3]]);
    }

    #[test]
    fn test_full_box_skipped_when_same_as_tier1() {
        let pool = TieredPool::new(&tier(&[1, 2, 3], 1), &[], &[]);
        let c = build_catalog(BetFamily::Exacta, &pool, 5);
        assert_eq!(labels(&c), vec!["Box tier 1 (3)"]);
    }

    #[test]
    fn test_preconditions_block_entries() {
        // No tier 1 → nothing keyed, only the capped box.
        let pool = TieredPool::new(&[], &tier(&[1, 2, 3, 4], 2), &[]);
        let c = build_catalog(BetFamily::Superfecta, &pool, 5);
        assert_eq!(labels(&c), vec!["Box top 4"]);
    }

    #[test]
    fn test_entrants_union() {
        let pool = TieredPool::new(&tier(&[1], 1), &tier(&[2, 3], 2), &[]);
        let c = build_catalog(BetFamily::Trifecta, &pool, 5);
        assert_eq!(c.last().unwrap().entrants(), vec![1, 2, 3]);
    }
}

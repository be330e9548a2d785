//! Employee-by-day chromosome for rostering.
//!
//! # Encoding
//!
//! One gene per (employee, day), laid out employee-major:
//! `gene[e * days + d]` is the shift employee `e` works on day `d`, or
//! `None` for a day off. A gene only ever holds a shift the employee is
//! eligible for on that day (see [`RosterGaProblem`](super::RosterGaProblem)).
//!
//! The encoding cannot express two shifts for one employee on one day;
//! decoding a roster that has them keeps the first.
//!
//! # Reference
//! Burke et al. (2004), "The state of the art of nurse rostering"

use rand::Rng;
use rand::prelude::IndexedRandom;

use crate::roster::{Placement, Roster, RosterProblem};

/// Candidate roster in gene form. Higher fitness is better.
#[derive(Debug, Clone, PartialEq)]
pub struct RosterChromosome {
    /// Shift per (employee, day), employee-major.
    pub genes: Vec<Option<usize>>,
    /// Objective score of the decoded roster.
    pub fitness: f64,
}

impl RosterChromosome {
    /// Wraps genes with an unevaluated fitness.
    pub fn new(genes: Vec<Option<usize>>) -> Self {
        Self {
            genes,
            fitness: f64::NEG_INFINITY,
        }
    }

    /// Random chromosome: each gene works with probability `work_rate`,
    /// on a uniformly chosen eligible shift.
    pub fn random<R: Rng>(domains: &[Vec<usize>], work_rate: f64, rng: &mut R) -> Self {
        let genes = domains
            .iter()
            .map(|domain| {
                if domain.is_empty() || !rng.random_bool(work_rate.clamp(0.0, 1.0)) {
                    None
                } else {
                    domain.choose(rng).copied()
                }
            })
            .collect();
        Self::new(genes)
    }

    /// Encodes a roster.
    pub fn from_roster(problem: &RosterProblem, roster: &Roster) -> Self {
        let mut genes = vec![None; problem.num_employees() * problem.days];
        for p in roster.placements() {
            let slot = &problem.slots[p.slot];
            let gene = &mut genes[p.employee * problem.days + slot.day];
            if gene.is_none() {
                *gene = Some(slot.shift);
            }
        }
        Self::new(genes)
    }

    /// Decodes into a roster, employee by employee, day by day.
    pub fn to_roster(&self, problem: &RosterProblem) -> Roster {
        let days = problem.days.max(1);
        let placements = self
            .genes
            .iter()
            .enumerate()
            .filter_map(|(i, gene)| {
                let shift = (*gene)?;
                let slot = problem.slot_of(shift, i % days)?;
                Some(Placement::new(i / days, slot))
            })
            .collect();
        Roster::from_placements(placements)
    }

    /// Number of genes.
    #[inline]
    pub fn len(&self) -> usize {
        self.genes.len()
    }

    /// Whether the chromosome has no genes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    /// Number of working genes.
    pub fn shifts_worked(&self) -> usize {
        self.genes.iter().filter(|g| g.is_some()).count()
    }
}

/// Single-point crossover.
///
/// The cut is drawn uniformly from `1..len` of the shorter parent; genes
/// after the cut are exchanged. Parents shorter than two genes are copied.
pub fn single_point_crossover<R: Rng>(
    p1: &RosterChromosome,
    p2: &RosterChromosome,
    rng: &mut R,
) -> (RosterChromosome, RosterChromosome) {
    let shorter = p1.len().min(p2.len());
    if shorter < 2 {
        return (
            RosterChromosome::new(p1.genes.clone()),
            RosterChromosome::new(p2.genes.clone()),
        );
    }
    let cut = rng.random_range(1..shorter);

    let mut c1 = p1.genes[..cut].to_vec();
    c1.extend_from_slice(&p2.genes[cut..]);
    let mut c2 = p2.genes[..cut].to_vec();
    c2.extend_from_slice(&p1.genes[cut..]);
    (RosterChromosome::new(c1), RosterChromosome::new(c2))
}

/// Per-gene reassignment mutation.
///
/// Each gene mutates with probability `rate` to a different value drawn
/// from its domain plus "day off". Returns the number of genes changed.
pub fn reassign_mutation<R: Rng>(
    chromosome: &mut RosterChromosome,
    domains: &[Vec<usize>],
    rate: f64,
    rng: &mut R,
) -> usize {
    let rate = rate.clamp(0.0, 1.0);
    let mut changed = 0;
    for (gene, domain) in chromosome.genes.iter_mut().zip(domains) {
        if !rng.random_bool(rate) {
            continue;
        }
        let alternatives: Vec<Option<usize>> = domain
            .iter()
            .map(|&s| Some(s))
            .chain(std::iter::once(None))
            .filter(|v| v != gene)
            .collect();
        if let Some(&value) = alternatives.choose(rng) {
            *gene = value;
            changed += 1;
        }
    }
    if changed > 0 {
        chromosome.fitness = f64::NEG_INFINITY;
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Employee, RuleSet, Shift};
    use chrono::NaiveDate;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn problem() -> RosterProblem {
        RosterProblem::new(
            vec![Employee::new("E1"), Employee::new("E2")],
            vec![Shift::from_hours("DAY", 8, 16), Shift::from_hours("NIGHT", 20, 4)],
            date(1),
            date(3),
            RuleSet::default(),
        )
    }

    #[test]
    fn test_roster_round_trip() {
        let p = problem();
        let roster = Roster::from_placements(vec![
            Placement::new(0, p.slot_of(0, 0).unwrap()),
            Placement::new(0, p.slot_of(1, 2).unwrap()),
            Placement::new(1, p.slot_of(1, 1).unwrap()),
        ]);
        let ch = RosterChromosome::from_roster(&p, &roster);
        assert_eq!(ch.len(), 6);
        assert_eq!(ch.genes, vec![Some(0), None, Some(1), None, Some(1), None]);
        assert_eq!(ch.shifts_worked(), 3);
        let back = ch.to_roster(&p);
        let mut a = back.placements().to_vec();
        let mut b = roster.placements().to_vec();
        a.sort();
        b.sort();
        assert_eq!(a, b);
    }

    #[test]
    fn test_split_shift_keeps_first() {
        let p = problem();
        let roster = Roster::from_placements(vec![
            Placement::new(0, p.slot_of(0, 0).unwrap()),
            Placement::new(0, p.slot_of(1, 0).unwrap()),
        ]);
        let ch = RosterChromosome::from_roster(&p, &roster);
        assert_eq!(ch.genes[0], Some(0));
        assert_eq!(ch.to_roster(&p).len(), 1);
    }

    #[test]
    fn test_random_respects_domains() {
        let domains = vec![vec![0, 1], vec![], vec![1]];
        let mut rng = SmallRng::seed_from_u64(42);
        for _ in 0..50 {
            let ch = RosterChromosome::random(&domains, 0.7, &mut rng);
            assert!(ch.genes[0].map_or(true, |s| s <= 1));
            assert_eq!(ch.genes[1], None);
            assert!(ch.genes[2].map_or(true, |s| s == 1));
            assert_eq!(ch.fitness, f64::NEG_INFINITY);
        }
    }

    #[test]
    fn test_crossover_exchanges_tails() {
        let a = RosterChromosome::new(vec![Some(0); 6]);
        let b = RosterChromosome::new(vec![None; 6]);
        let mut rng = SmallRng::seed_from_u64(42);
        let (c1, c2) = single_point_crossover(&a, &b, &mut rng);
        assert_eq!(c1.len(), 6);
        let cut = c1.genes.iter().take_while(|g| g.is_some()).count();
        assert!((1..6).contains(&cut));
        assert!(c1.genes[cut..].iter().all(|g| g.is_none()));
        assert!(c2.genes[..cut].iter().all(|g| g.is_none()));
        assert!(c2.genes[cut..].iter().all(|g| g.is_some()));
    }

    #[test]
    fn test_crossover_short_parents_copied() {
        let a = RosterChromosome::new(vec![Some(1)]);
        let b = RosterChromosome::new(vec![None, Some(0)]);
        let mut rng = SmallRng::seed_from_u64(42);
        let (c1, c2) = single_point_crossover(&a, &b, &mut rng);
        assert_eq!(c1.genes, a.genes);
        assert_eq!(c2.genes, b.genes);
    }

    #[test]
    fn test_mutation_changes_every_gene_at_full_rate() {
        let domains = vec![vec![0, 1]; 4];
        let mut ch = RosterChromosome::new(vec![Some(0), Some(1), None, Some(0)]);
        ch.fitness = 1.0;
        let before = ch.genes.clone();
        let mut rng = SmallRng::seed_from_u64(42);
        let changed = reassign_mutation(&mut ch, &domains, 1.0, &mut rng);
        assert_eq!(changed, 4);
        assert!(ch.genes.iter().zip(&before).all(|(a, b)| a != b));
        assert_eq!(ch.fitness, f64::NEG_INFINITY);
    }

    #[test]
    fn test_mutation_zero_rate_is_noop() {
        let domains = vec![vec![0, 1]; 4];
        let mut ch = RosterChromosome::new(vec![Some(0); 4]);
        let mut rng = SmallRng::seed_from_u64(42);
        assert_eq!(reassign_mutation(&mut ch, &domains, 0.0, &mut rng), 0);
        assert_eq!(ch.genes, vec![Some(0); 4]);
    }
}

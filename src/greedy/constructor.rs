//! Greedy roster construction.
//!
//! Visits slots by shift priority (descending), then date, and fills
//! each open seat with the best-ranked legal candidate. "Legal" means the
//! placement breaks no hard rule given the placements made so far
//! (see [`WorkLedger::can_assign`]).

use rand::Rng;

use crate::control::RunControl;
use crate::ranking::{RankingContext, RankingEngine};
use crate::roster::{Placement, Roster, RosterProblem, WorkLedger};

/// Builds rosters one slot at a time.
#[derive(Debug, Clone)]
pub struct GreedyConstructor<'a> {
    problem: &'a RosterProblem,
    ranking: RankingEngine,
}

impl<'a> GreedyConstructor<'a> {
    /// Creates a constructor with the ranking for the problem's rules
    /// (workload, weekends when balanced, preference, seniority, cost, random).
    pub fn new(problem: &'a RosterProblem) -> Self {
        Self {
            problem,
            ranking: RankingEngine::for_rules(&problem.rules),
        }
    }

    /// Replaces the candidate ranking.
    pub fn with_ranking(mut self, ranking: RankingEngine) -> Self {
        self.ranking = ranking;
        self
    }

    /// Slots in visiting order: priority descending, then day, then shift.
    pub fn slot_order(&self) -> Vec<usize> {
        let problem = self.problem;
        let mut order: Vec<usize> = (0..problem.slots.len()).collect();
        order.sort_by_key(|&s| {
            let slot = &problem.slots[s];
            (
                std::cmp::Reverse(problem.shifts[slot.shift].priority),
                slot.day,
                slot.shift,
            )
        });
        order
    }

    /// Builds a roster from scratch.
    pub fn construct<R: Rng>(&self, rng: &mut R) -> Roster {
        self.complete(Roster::new(), rng)
    }

    /// Fills the open seats of an existing roster. Existing placements are
    /// kept as they are, legal or not.
    pub fn complete<R: Rng>(&self, roster: Roster, rng: &mut R) -> Roster {
        let mut roster = roster;
        let mut ledger = WorkLedger::from_roster(self.problem, &roster);
        for slot in self.slot_order() {
            self.fill_slot(&mut roster, &mut ledger, slot, rng);
        }
        roster
    }

    /// Builds a roster from scratch, passing a control checkpoint before
    /// each slot, so a pause holds construction. Returns `None` when the
    /// run is stopped or its deadline passes.
    pub fn construct_within<R: Rng>(&self, control: &RunControl, rng: &mut R) -> Option<Roster> {
        let mut roster = Roster::new();
        let mut ledger = WorkLedger::new(self.problem);
        for slot in self.slot_order() {
            if !control.checkpoint().should_continue() {
                return None;
            }
            self.fill_slot(&mut roster, &mut ledger, slot, rng);
        }
        Some(roster)
    }

    fn fill_slot<R: Rng>(
        &self,
        roster: &mut Roster,
        ledger: &mut WorkLedger,
        slot: usize,
        rng: &mut R,
    ) {
        let open = ledger.open_seats(self.problem, slot);
        if open == 0 {
            return;
        }
        let legal = ledger.legal_candidates(self.problem, slot);
        if legal.is_empty() {
            return;
        }
        let ranked = {
            let context = RankingContext::new(self.problem, ledger, slot);
            self.ranking.rank(&legal, &context, rng)
        };
        // Filling a seat only changes capacity on this slot, so the rest
        // of the ranking stays legal.
        for employee in ranked.into_iter().take(open) {
            let p = Placement::new(employee, slot);
            ledger.assign(self.problem, p);
            roster.add(p);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::ConstraintEvaluator;
    use crate::models::{Constraint, ConstraintKind, Employee, RuleSet, Shift};
    use chrono::NaiveDate;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use std::time::Duration;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn problem() -> RosterProblem {
        RosterProblem::new(
            (1..=5).map(|i| Employee::new(format!("E{i}"))).collect(),
            vec![
                Shift::from_hours("DAY", 8, 16),
                Shift::from_hours("NIGHT", 20, 4).with_priority(5),
            ],
            date(1),
            date(7),
            RuleSet::default(),
        )
    }

    #[test]
    fn test_slot_order_priority_first() {
        let p = problem();
        let order = GreedyConstructor::new(&p).slot_order();
        let nights: Vec<usize> = order[..7].iter().map(|&s| p.slots[s].shift).collect();
        assert!(nights.iter().all(|&s| s == 1));
        assert_eq!(p.slots[order[0]].day, 0);
        assert_eq!(p.slots[order[6]].day, 6);
    }

    #[test]
    fn test_construct_full_and_feasible() {
        let p = problem();
        let mut rng = SmallRng::seed_from_u64(42);
        let roster = GreedyConstructor::new(&p).construct(&mut rng);
        assert_eq!(roster.len(), 14);
        assert!(ConstraintEvaluator::new(&p).evaluate(&roster).is_feasible());
    }

    #[test]
    fn test_construct_spreads_workload() {
        let p = problem();
        let mut rng = SmallRng::seed_from_u64(42);
        let roster = GreedyConstructor::new(&p).construct(&mut rng);
        for e in 0..5 {
            let n = roster.of_employee(e).count();
            assert!(n >= 2, "employee {e} has {n} shifts");
        }
    }

    #[test]
    fn test_complete_keeps_existing() {
        let p = problem();
        let mut rng = SmallRng::seed_from_u64(42);
        let seed = Roster::from_placements(vec![Placement::new(4, 0)]);
        let roster = GreedyConstructor::new(&p).complete(seed, &mut rng);
        assert_eq!(roster.placements()[0], Placement::new(4, 0));
        assert_eq!(roster.len(), 14);
    }

    #[test]
    fn test_construct_within_expired() {
        let p = problem();
        let control = RunControl::new(Duration::from_millis(1));
        std::thread::sleep(Duration::from_millis(5));
        let mut rng = SmallRng::seed_from_u64(42);
        assert!(GreedyConstructor::new(&p)
            .construct_within(&control, &mut rng)
            .is_none());
    }

    #[test]
    fn test_construct_within_waits_while_paused() {
        let p = problem();
        let control = RunControl::unlimited();
        control.pause();
        std::thread::scope(|scope| {
            let worker = scope.spawn(|| {
                let mut rng = SmallRng::seed_from_u64(42);
                GreedyConstructor::new(&p).construct_within(&control, &mut rng)
            });
            std::thread::sleep(Duration::from_millis(30));
            assert!(!worker.is_finished());
            control.resume();
            let roster = worker.join().unwrap().unwrap();
            assert_eq!(roster.len(), 14);
        });
    }

    #[test]
    fn test_long_rest_leaves_seats_open_instead_of_breaking_rest() {
        let p = RosterProblem::new(
            vec![Employee::new("E1"), Employee::new("E2")],
            vec![Shift::from_hours("DAY", 8, 16)],
            date(1),
            date(7),
            RuleSet::from_constraints(&[Constraint::min_rest_hours(70.0)]),
        );
        let mut rng = SmallRng::seed_from_u64(42);
        let roster = GreedyConstructor::new(&p).construct(&mut rng);
        let report = ConstraintEvaluator::new(&p).evaluate(&roster);
        assert_eq!(report.hard_count, 0);
        assert!(roster.len() < 7);
    }

    #[test]
    fn test_seeded_construction_repeats() {
        let p = problem();
        let a = GreedyConstructor::new(&p).construct(&mut SmallRng::seed_from_u64(42));
        let b = GreedyConstructor::new(&p).construct(&mut SmallRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn test_weekend_balance_splits_the_weekend() {
        // Friday Jan 5 to Sunday Jan 7; the Friday worker takes Sunday.
        let p = RosterProblem::new(
            vec![Employee::new("A"), Employee::new("B")],
            vec![Shift::from_hours("DAY", 8, 16)],
            date(5),
            date(7),
            RuleSet::from_constraints(&[Constraint::soft(
                "weekend-balance",
                ConstraintKind::WeekendBalance,
                1.0,
            )]),
        );
        for seed in 0..8 {
            let mut rng = SmallRng::seed_from_u64(seed);
            let roster = GreedyConstructor::new(&p).construct(&mut rng);
            assert_eq!(roster.len(), 3);
            for e in 0..2 {
                let weekends = roster
                    .of_employee(e)
                    .filter(|pl| p.slots[pl.slot].weekend)
                    .count();
                assert_eq!(weekends, 1, "seed {seed}: employee {e}");
            }
        }
    }
}

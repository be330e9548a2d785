//! Hill-climbing improvement of a complete roster.
//!
//! Each pass runs five neighbourhoods over the current roster:
//!
//! | Move | Effect |
//! |------|--------|
//! | Add | fill an under-covered slot with a legal candidate |
//! | Remove | drop a placement whose slot stays at or above its minimum fill |
//! | Swap | exchange the employees of two placements |
//! | Relocate | hand one placement to another eligible employee |
//! | Segment exchange | reverse the employees across a window of placements |
//!
//! A move is kept only if the score does not drop and the hard-violation
//! count does not grow. The search stops at the iteration cap, at the
//! quality threshold, after a pass with no strict improvement, or at a
//! stop/deadline checkpoint.

use log::debug;
use rand::Rng;

use crate::control::{RunControl, Termination};
use crate::evaluation::ObjectiveScorer;
use crate::models::SolverParams;
use crate::roster::{Placement, Roster, WorkLedger};

/// Candidates tried per under-covered slot.
const ADD_CANDIDATES: usize = 8;
/// Random samples per pass for the swap, relocate and segment moves.
const SAMPLES_PER_PASS: usize = 32;
/// Evaluations between control checkpoints inside a pass.
const CHECK_EVERY: u64 = 32;

/// Outcome of [`LocalSearch::improve`].
#[derive(Debug, Clone)]
pub struct LocalSearchResult {
    pub roster: Roster,
    pub score: f64,
    /// Trial moves evaluated.
    pub iterations: u64,
    /// Starting score, then the score after each accepted move.
    pub history: Vec<f64>,
    pub termination: Termination,
}

struct Current {
    roster: Roster,
    score: f64,
    hard: usize,
    evaluations: u64,
    history: Vec<f64>,
    improved: bool,
}

/// Greedy-acceptance local search.
#[derive(Debug)]
pub struct LocalSearch<'a> {
    scorer: ObjectiveScorer<'a>,
    params: &'a SolverParams,
    control: &'a RunControl,
}

impl<'a> LocalSearch<'a> {
    pub fn new(scorer: ObjectiveScorer<'a>, params: &'a SolverParams, control: &'a RunControl) -> Self {
        Self {
            scorer,
            params,
            control,
        }
    }

    /// Improves `roster` until no move helps or a limit is hit.
    pub fn improve<R: Rng>(&self, roster: Roster, rng: &mut R) -> LocalSearchResult {
        let (score, hard) = self.scorer.score_with_hard(&roster);
        let mut current = Current {
            roster,
            score,
            hard,
            evaluations: 0,
            history: vec![score],
            improved: false,
        };

        let mut passes = 0u64;
        let termination = loop {
            if let Some(t) = self.control.checkpoint().termination() {
                break t;
            }
            if self.threshold_met(current.score) {
                break Termination::Completed;
            }
            current.improved = false;
            if let Err(t) = self.pass(&mut current, rng) {
                break t;
            }
            passes += 1;
            debug!(
                "local search pass {passes}: score {:.4}, {} evaluations",
                current.score, current.evaluations
            );
            self.control.report(
                current.evaluations as f64 / self.params.max_iterations.max(1) as f64,
                "local search",
            );
            if !current.improved {
                break Termination::Completed;
            }
        };

        let mut roster = current.roster;
        roster.cache_score(current.score);
        LocalSearchResult {
            roster,
            score: current.score,
            iterations: current.evaluations,
            history: current.history,
            termination,
        }
    }

    fn threshold_met(&self, score: f64) -> bool {
        self.params.quality_threshold.is_some_and(|q| score >= q)
    }

    fn pass<R: Rng>(&self, current: &mut Current, rng: &mut R) -> Result<(), Termination> {
        self.add_moves(current)?;
        self.remove_moves(current)?;
        self.swap_moves(current, rng)?;
        self.relocate_moves(current, rng)?;
        self.segment_moves(current, rng)?;
        Ok(())
    }

    /// Scores a trial and adopts it when it is no worse. `Err` halts the
    /// search.
    fn consider(&self, current: &mut Current, trial: Roster) -> Result<bool, Termination> {
        current.evaluations += 1;
        let (score, hard) = self.scorer.score_with_hard(&trial);
        let accepted = score >= current.score && hard <= current.hard;
        if accepted {
            if score > current.score {
                current.improved = true;
            }
            current.roster = trial;
            current.score = score;
            current.hard = hard;
            current.history.push(score);
        }

        if current.evaluations >= self.params.max_iterations as u64 || self.threshold_met(current.score) {
            return Err(Termination::Completed);
        }
        if current.evaluations % CHECK_EVERY == 0 {
            if let Some(t) = self.control.checkpoint().termination() {
                return Err(t);
            }
        }
        Ok(accepted)
    }

    fn add_moves(&self, current: &mut Current) -> Result<(), Termination> {
        let problem = self.scorer.problem();
        for slot in 0..problem.slots.len() {
            let ledger = WorkLedger::from_roster(problem, &current.roster);
            if ledger.open_seats(problem, slot) == 0 {
                continue;
            }
            for employee in ledger.legal_candidates(problem, slot).into_iter().take(ADD_CANDIDATES) {
                let mut trial = current.roster.clone();
                trial.add(Placement::new(employee, slot));
                if self.consider(current, trial)? {
                    break;
                }
            }
        }
        Ok(())
    }

    fn remove_moves(&self, current: &mut Current) -> Result<(), Termination> {
        let problem = self.scorer.problem();
        let mut i = current.roster.len();
        while i > 0 {
            i -= 1;
            if i >= current.roster.len() {
                continue;
            }
            let slot = current.roster.placements()[i].slot;
            let filled = current
                .roster
                .placements()
                .iter()
                .filter(|p| p.slot == slot)
                .count();
            if filled == 0 || filled - 1 < problem.min_fill(slot) {
                continue;
            }
            let mut trial = current.roster.clone();
            trial.remove_at(i);
            self.consider(current, trial)?;
        }
        Ok(())
    }

    fn swap_moves<R: Rng>(&self, current: &mut Current, rng: &mut R) -> Result<(), Termination> {
        let n = current.roster.len();
        if n < 2 {
            return Ok(());
        }
        for _ in 0..SAMPLES_PER_PASS {
            let i = rng.random_range(0..n);
            let j = rng.random_range(0..n);
            let (a, b) = (current.roster.placements()[i], current.roster.placements()[j]);
            if a.employee == b.employee || a.slot == b.slot {
                continue;
            }
            let mut trial = current.roster.clone();
            trial.replace(i, Placement::new(b.employee, a.slot));
            trial.replace(j, Placement::new(a.employee, b.slot));
            self.consider(current, trial)?;
        }
        Ok(())
    }

    fn relocate_moves<R: Rng>(&self, current: &mut Current, rng: &mut R) -> Result<(), Termination> {
        let problem = self.scorer.problem();
        let n = current.roster.len();
        let employees = problem.num_employees();
        if n == 0 || employees < 2 {
            return Ok(());
        }
        for _ in 0..SAMPLES_PER_PASS {
            let i = rng.random_range(0..n);
            let from = current.roster.placements()[i];
            let to = rng.random_range(0..employees);
            if to == from.employee || !problem.is_eligible(to, from.slot) {
                continue;
            }
            let moved = Placement::new(to, from.slot);
            if current.roster.contains(moved) {
                continue;
            }
            let mut trial = current.roster.clone();
            trial.replace(i, moved);
            self.consider(current, trial)?;
        }
        Ok(())
    }

    fn segment_moves<R: Rng>(&self, current: &mut Current, rng: &mut R) -> Result<(), Termination> {
        let n = current.roster.len();
        if n < 2 {
            return Ok(());
        }
        for _ in 0..SAMPLES_PER_PASS / 2 {
            let mut order: Vec<usize> = (0..n).collect();
            order.sort_by_key(|&i| current.roster.placements()[i].slot);
            let width = rng.random_range(2..=n.min(5));
            let start = rng.random_range(0..=n - width);
            let window = &order[start..start + width];

            let mut employees: Vec<usize> = window
                .iter()
                .map(|&i| current.roster.placements()[i].employee)
                .collect();
            employees.reverse();
            if employees
                .iter()
                .zip(window)
                .all(|(&e, &i)| current.roster.placements()[i].employee == e)
            {
                continue;
            }
            let mut trial = current.roster.clone();
            for (&i, &employee) in window.iter().zip(&employees) {
                let slot = trial.placements()[i].slot;
                trial.replace(i, Placement::new(employee, slot));
            }
            self.consider(current, trial)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::ConstraintEvaluator;
    use crate::greedy::GreedyConstructor;
    use crate::models::{Employee, ObjectiveWeights, RuleSet, Shift};
    use crate::roster::RosterProblem;
    use chrono::NaiveDate;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn problem() -> RosterProblem {
        RosterProblem::new(
            vec![
                Employee::new("E1").with_preferred_shift("DAY"),
                Employee::new("E2").with_preferred_shift("NIGHT"),
                Employee::new("E3"),
                Employee::new("E4"),
                Employee::new("E5"),
            ],
            vec![
                Shift::from_hours("DAY", 8, 16),
                Shift::from_hours("NIGHT", 20, 4),
            ],
            date(1),
            date(7),
            RuleSet::default(),
        )
    }

    #[test]
    fn test_fills_empty_roster() {
        let p = problem();
        let params = SolverParams::default();
        let control = RunControl::unlimited();
        let scorer = ObjectiveScorer::new(&p, ObjectiveWeights::default());
        let mut rng = SmallRng::seed_from_u64(42);
        let result = LocalSearch::new(scorer, &params, &control).improve(Roster::new(), &mut rng);
        assert_eq!(result.roster.len(), 14);
        assert!(ConstraintEvaluator::new(&p).evaluate(&result.roster).is_feasible());
        assert_eq!(result.termination, Termination::Completed);
    }

    #[test]
    fn test_accepted_scores_never_drop() {
        let p = problem();
        let params = SolverParams::default();
        let control = RunControl::unlimited();
        let scorer = ObjectiveScorer::new(&p, ObjectiveWeights::default());
        let mut rng = SmallRng::seed_from_u64(42);
        let start = GreedyConstructor::new(&p).construct(&mut rng);
        let result = LocalSearch::new(scorer, &params, &control).improve(start, &mut rng);
        assert!(result.history.windows(2).all(|w| w[1] >= w[0]));
        assert_eq!(result.score, scorer.score(&result.roster));
        assert_eq!(*result.history.last().unwrap(), result.score);
    }

    #[test]
    fn test_removes_double_booking() {
        let p = problem();
        let params = SolverParams::default();
        let control = RunControl::unlimited();
        let scorer = ObjectiveScorer::new(&p, ObjectiveWeights::default());
        // E1 on DAY and NIGHT of Jan 1: a duplicate-day violation.
        let start = Roster::from_placements(vec![Placement::new(0, 0), Placement::new(0, 1)]);
        let (_, hard_before) = scorer.score_with_hard(&start);
        assert!(hard_before > 0);
        let mut rng = SmallRng::seed_from_u64(42);
        let result = LocalSearch::new(scorer, &params, &control).improve(start, &mut rng);
        assert_eq!(scorer.score_with_hard(&result.roster).1, 0);
    }

    #[test]
    fn test_iteration_cap() {
        let p = problem();
        let params = SolverParams::default().with_max_iterations(3);
        let control = RunControl::unlimited();
        let scorer = ObjectiveScorer::new(&p, ObjectiveWeights::default());
        let mut rng = SmallRng::seed_from_u64(42);
        let result = LocalSearch::new(scorer, &params, &control).improve(Roster::new(), &mut rng);
        assert_eq!(result.iterations, 3);
        assert_eq!(result.termination, Termination::Completed);
    }

    #[test]
    fn test_quality_threshold_stops_early() {
        let p = problem();
        let mut params = SolverParams::default();
        params.quality_threshold = Some(-1.0e9);
        let control = RunControl::unlimited();
        let scorer = ObjectiveScorer::new(&p, ObjectiveWeights::default());
        let mut rng = SmallRng::seed_from_u64(42);
        let result = LocalSearch::new(scorer, &params, &control).improve(Roster::new(), &mut rng);
        assert_eq!(result.iterations, 0);
        assert!(result.roster.is_empty());
    }

    #[test]
    fn test_stop_requested() {
        let p = problem();
        let params = SolverParams::default();
        let control = RunControl::unlimited();
        control.request_stop();
        let scorer = ObjectiveScorer::new(&p, ObjectiveWeights::default());
        let mut rng = SmallRng::seed_from_u64(42);
        let result = LocalSearch::new(scorer, &params, &control).improve(Roster::new(), &mut rng);
        assert_eq!(result.termination, Termination::Stopped);
        assert_eq!(result.history.len(), 1);
    }
}

//! Heuristic repair of an existing roster.
//!
//! Applies one [`RepairHeuristic`] per iteration, cycling through the
//! configured list. A heuristic either strictly improves the objective
//! or leaves the roster alone; once a full cycle makes no change the
//! roster has converged and the engine stops.
//!
//! Meant for fast re-optimization of a roster that mostly stands (for
//! example after one employee's availability changes), not for building
//! a full horizon from nothing.
//!
//! Heuristics are deterministic, so repairing a converged roster again
//! returns it unchanged.

pub mod heuristics;

pub use heuristics::{heuristic_for, BestFit, HighestValue, LeastConflicting, MostConstrainedFirst};

use std::fmt::Debug;

use log::{debug, info};

use crate::control::{RunControl, SearchOutcome, Termination};
use crate::evaluation::ObjectiveScorer;
use crate::models::SolverParams;
use crate::roster::{Roster, RosterProblem};

/// What a heuristic sees: the roster and its current score.
#[derive(Debug, Clone, Copy)]
pub struct RepairContext<'a> {
    pub scorer: ObjectiveScorer<'a>,
    pub roster: &'a Roster,
    pub score: f64,
    /// Hard violations in `roster`.
    pub hard: usize,
}

impl<'a> RepairContext<'a> {
    /// The problem being repaired.
    #[inline]
    pub fn problem(&self) -> &'a RosterProblem {
        self.scorer.problem()
    }
}

/// A strictly better roster found by a heuristic.
#[derive(Debug, Clone)]
pub struct Improvement {
    pub roster: Roster,
    pub score: f64,
}

/// A repair step.
///
/// Implementations must be deterministic and must return `Some` only
/// when the new score is strictly above `context.score`.
pub trait RepairHeuristic: Send + Sync + Debug {
    /// Heuristic name (e.g., "BEST_FIT").
    fn name(&self) -> &'static str;

    /// Attempts one improvement.
    fn improve(&self, context: &RepairContext<'_>) -> Option<Improvement>;
}

/// Outcome of [`RepairEngine::repair`].
#[derive(Debug, Clone)]
pub struct RepairResult {
    pub roster: Roster,
    pub score: f64,
    /// Heuristic applications.
    pub iterations: u64,
    /// Starting score, then the score after each improvement.
    pub history: Vec<f64>,
    /// Whether a full heuristic cycle ended without change.
    pub converged: bool,
    pub termination: Termination,
}

/// Cycles repair heuristics until convergence.
#[derive(Debug)]
pub struct RepairEngine<'a> {
    scorer: ObjectiveScorer<'a>,
    params: &'a SolverParams,
    control: &'a RunControl,
    heuristics: Vec<Box<dyn RepairHeuristic>>,
}

impl<'a> RepairEngine<'a> {
    /// Creates an engine with the heuristics named in `params`.
    pub fn new(scorer: ObjectiveScorer<'a>, params: &'a SolverParams, control: &'a RunControl) -> Self {
        Self {
            scorer,
            params,
            control,
            heuristics: params.heuristics.iter().map(|&k| heuristic_for(k)).collect(),
        }
    }

    /// Replaces the heuristic cycle.
    pub fn with_heuristics(mut self, heuristics: Vec<Box<dyn RepairHeuristic>>) -> Self {
        self.heuristics = heuristics;
        self
    }

    /// Names of the heuristics in cycle order.
    pub fn heuristic_names(&self) -> Vec<&'static str> {
        self.heuristics.iter().map(|h| h.name()).collect()
    }

    /// Repairs `roster` until convergence, the iteration cap or a
    /// stop/deadline checkpoint.
    pub fn repair(&self, roster: Roster) -> RepairResult {
        let (mut score, mut hard) = self.scorer.score_with_hard(&roster);
        let mut roster = roster;
        let mut history = vec![score];
        let mut iterations = 0u64;
        let mut idle = 0usize;
        let cycle = self.heuristics.len();

        let (termination, converged) = loop {
            if cycle == 0 || idle >= cycle {
                break (Termination::Completed, true);
            }
            if iterations >= self.params.max_iterations as u64 {
                break (Termination::Completed, false);
            }
            if let Some(t) = self.control.checkpoint().termination() {
                break (t, false);
            }

            let heuristic = &self.heuristics[iterations as usize % cycle];
            iterations += 1;
            let context = RepairContext {
                scorer: self.scorer,
                roster: &roster,
                score,
                hard,
            };
            match heuristic.improve(&context) {
                Some(improvement) => {
                    debug!(
                        "{}: {:.4} -> {:.4}",
                        heuristic.name(),
                        score,
                        improvement.score
                    );
                    hard = self.scorer.score_with_hard(&improvement.roster).1;
                    roster = improvement.roster;
                    score = improvement.score;
                    history.push(score);
                    idle = 0;
                }
                None => idle += 1,
            }
            self.control.report(
                iterations as f64 / self.params.max_iterations.max(1) as f64,
                heuristic.name(),
            );
        };

        info!(
            "repair: score {:.4} after {iterations} iterations (converged: {converged})",
            score
        );
        roster.cache_score(score);
        RepairResult {
            roster,
            score,
            iterations,
            history,
            converged,
            termination,
        }
    }

    /// Repairs and wraps the result as a search outcome.
    pub fn run(&self, roster: Roster) -> SearchOutcome {
        let result = self.repair(roster);
        SearchOutcome::finished(result.roster, result.termination)
            .with_iterations(result.iterations)
            .with_history(result.history)
    }
}

//! Greedy construction followed by local search.
//!
//! [`GreedyConstructor`] builds a complete roster in one sweep;
//! [`LocalSearch`] then hill-climbs it. Fast and usually feasible on
//! loosely constrained problems, with no optimality guarantee.

mod constructor;
mod local_search;

pub use constructor::GreedyConstructor;
pub use local_search::{LocalSearch, LocalSearchResult};

use log::info;
use rand::Rng;

use crate::control::{RunControl, SearchOutcome, Termination};
use crate::evaluation::ObjectiveScorer;
use crate::models::SolverParams;
use crate::roster::RosterProblem;

/// Greedy-plus-local-search driver.
#[derive(Debug)]
pub struct GreedySolver<'a> {
    problem: &'a RosterProblem,
    params: &'a SolverParams,
    control: &'a RunControl,
}

impl<'a> GreedySolver<'a> {
    pub fn new(problem: &'a RosterProblem, params: &'a SolverParams, control: &'a RunControl) -> Self {
        Self {
            problem,
            params,
            control,
        }
    }

    /// Constructs, then improves. A construction cut short by stop or
    /// deadline yields an outcome with no roster.
    pub fn run<R: Rng>(&self, rng: &mut R) -> SearchOutcome {
        self.control.report(0.0, "greedy construction");
        let Some(initial) = GreedyConstructor::new(self.problem).construct_within(self.control, rng)
        else {
            let termination = if self.control.is_stop_requested() {
                Termination::Stopped
            } else {
                Termination::TimedOut
            };
            return SearchOutcome::empty(termination);
        };

        let scorer = ObjectiveScorer::new(self.problem, self.params.weights);
        let result = LocalSearch::new(scorer, self.params, self.control).improve(initial, rng);
        info!(
            "greedy: {} placements, score {:.4} after {} moves ({:?})",
            result.roster.len(),
            result.score,
            result.iterations,
            result.termination
        );
        SearchOutcome::finished(result.roster, result.termination)
            .with_iterations(result.iterations)
            .with_history(result.history)
    }
}

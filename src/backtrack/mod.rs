//! Depth-bounded backtracking search.
//!
//! Fills every required seat (one seat = one unit of a slot's headcount)
//! and succeeds on the first complete roster without hard violations.
//! Not an optimizer: the first feasible roster found is returned.
//!
//! # State machine
//!
//! ```text
//! INITIAL -> SEARCHING -> (ASSIGN -> SEARCHING)* -> COMPLETE | NO_SOLUTION | TIMEOUT | STOPPED
//! ```
//!
//! The search is iterative over an explicit frame stack, so depth is not
//! bounded by the thread's call stack. Each node polls the run control,
//! checks the depth cap and tests for completion before branching.
//!
//! # Pruning
//!
//! Strategies are selected through [`SolverParams::pruning`]; see
//! [`pruning`] for what each does. Without consistency checking every
//! eligible employee is branched on and only complete rosters are
//! checked.
//!
//! # Reference
//! Russell & Norvig (2020), "Artificial Intelligence: A Modern Approach",
//! Ch. 6: Constraint Satisfaction Problems

mod pruning;

use log::{debug, info};
use rand::Rng;

use crate::control::{RunControl, SearchOutcome, Termination};
use crate::evaluation::ConstraintEvaluator;
use crate::models::{PruningStrategy, SolverParams};
use crate::ranking::{rules, RankingContext, RankingEngine, TieBreaker};
use crate::roster::{Placement, Roster, RosterProblem, WorkLedger};

/// Backtracking state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchState {
    Initial,
    Searching,
    Assign,
    Complete,
    NoSolution,
    Timeout,
    Stopped,
}

impl SearchState {
    /// Whether the search has ended.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SearchState::Complete
                | SearchState::NoSolution
                | SearchState::Timeout
                | SearchState::Stopped
        )
    }
}

struct Frame {
    slot: usize,
    candidates: Vec<usize>,
    next: usize,
    placed: bool,
}

/// Backtracking search over seats.
pub struct BacktrackSearch<'a> {
    problem: &'a RosterProblem,
    params: &'a SolverParams,
    control: &'a RunControl,
    ordering: RankingEngine,
    state: SearchState,
    nodes: u64,
    deepest: usize,
    depth_cut: bool,
}

impl<'a> BacktrackSearch<'a> {
    /// Creates a search.
    pub fn new(problem: &'a RosterProblem, params: &'a SolverParams, control: &'a RunControl) -> Self {
        Self {
            problem,
            params,
            control,
            ordering: RankingEngine::new()
                .with_rule(rules::LeastWorkload)
                .with_final_tie_breaker(TieBreaker::ById),
            state: SearchState::Initial,
            nodes: 0,
            deepest: 0,
            depth_cut: false,
        }
    }

    /// Current state.
    pub fn state(&self) -> SearchState {
        self.state
    }

    /// Nodes visited so far.
    pub fn nodes(&self) -> u64 {
        self.nodes
    }

    /// Whether the depth cap cut off at least one branch.
    pub fn depth_limited(&self) -> bool {
        self.depth_cut
    }

    fn transition(&mut self, to: SearchState) {
        if self.state != to && (to.is_terminal() || self.state == SearchState::Initial) {
            debug!("backtrack: {:?} -> {:?}", self.state, to);
        }
        self.state = to;
    }

    /// Runs the search.
    ///
    /// Returns the complete roster on success, or the deepest partial
    /// roster reached when the search space or budget runs out.
    pub fn run<R: Rng>(&mut self, rng: &mut R) -> SearchOutcome {
        let problem = self.problem;
        let total = problem.total_required();
        let consistency = self.params.prunes_with(PruningStrategy::ConsistencyChecking);
        let forward = self.params.prunes_with(PruningStrategy::ForwardChecking);
        info!(
            "backtrack: {} employees, {} slots, {} seats, pruning {:?}",
            problem.num_employees(),
            problem.slots.len(),
            total,
            self.params.pruning
        );
        self.transition(SearchState::Searching);

        let evaluator = ConstraintEvaluator::new(problem);
        let mut ledger = WorkLedger::new(problem);
        let mut roster = Roster::new();
        let mut best_partial = Roster::new();
        let mut stack: Vec<Frame> = Vec::new();
        let mut descend = true;

        loop {
            self.nodes += 1;
            if let Some(termination) = self.control.checkpoint().termination() {
                self.transition(match termination {
                    Termination::Stopped => SearchState::Stopped,
                    _ => SearchState::Timeout,
                });
                return self.finish(Some(best_partial), false, termination);
            }

            if descend {
                if roster.len() == total {
                    if evaluator.tally(&roster).hard == 0 {
                        self.transition(SearchState::Complete);
                        self.control.report(1.0, "complete");
                        return self.finish(Some(roster), true, Termination::Completed);
                    }
                } else if roster.len() >= self.params.max_depth {
                    self.depth_cut = true;
                } else if let Some(slot) = self.select_slot(&ledger) {
                    let candidates = self.candidates(&ledger, slot, consistency, rng);
                    stack.push(Frame {
                        slot,
                        candidates,
                        next: 0,
                        placed: false,
                    });
                }
            }

            let Some(frame) = stack.last_mut() else {
                self.transition(SearchState::NoSolution);
                return self.finish(Some(best_partial), false, Termination::Exhausted);
            };

            // Undo this frame's previous choice.
            if frame.placed {
                let undone = roster.remove_at(roster.len() - 1);
                ledger.unassign(problem, undone);
                frame.placed = false;
            }

            while frame.next < frame.candidates.len() {
                let p = Placement::new(frame.candidates[frame.next], frame.slot);
                frame.next += 1;
                ledger.assign(problem, p);
                if forward && !pruning::forward_check(problem, &ledger, problem.slots[p.slot].day) {
                    ledger.unassign(problem, p);
                    continue;
                }
                roster.add(p);
                frame.placed = true;
                break;
            }

            if frame.placed {
                self.state = SearchState::Assign;
                descend = true;
                if roster.len() > self.deepest {
                    self.deepest = roster.len();
                    best_partial = roster.clone();
                    let fraction = if total == 0 { 1.0 } else { self.deepest as f64 / total as f64 };
                    self.control
                        .report(fraction, &format!("depth {}/{}", self.deepest, total));
                }
                self.state = SearchState::Searching;
            } else {
                stack.pop();
                descend = false;
            }
        }
    }

    fn select_slot(&self, ledger: &WorkLedger) -> Option<usize> {
        if self.params.prunes_with(PruningStrategy::MinimumRemainingValues) {
            pruning::most_constrained_slot(self.problem, ledger)
        } else {
            pruning::first_open_slot(self.problem, ledger)
        }
    }

    fn candidates<R: Rng>(
        &self,
        ledger: &WorkLedger,
        slot: usize,
        consistency: bool,
        rng: &mut R,
    ) -> Vec<usize> {
        let problem = self.problem;
        let pool: Vec<usize> = if consistency {
            ledger.legal_candidates(problem, slot)
        } else {
            (0..problem.num_employees())
                .filter(|&e| problem.is_eligible(e, slot) && !ledger.holds(problem, e, slot))
                .collect()
        };
        let context = RankingContext::new(problem, ledger, slot);
        self.ordering.rank(&pool, &context, rng)
    }

    fn finish(&self, best: Option<Roster>, complete: bool, termination: Termination) -> SearchOutcome {
        info!(
            "backtrack: {:?} after {} nodes (deepest {}{})",
            self.state,
            self.nodes,
            self.deepest,
            if self.depth_cut { ", depth-limited" } else { "" }
        );
        let best = best.filter(|r| complete || !r.is_empty());
        let outcome = if complete {
            match best {
                Some(roster) => SearchOutcome::finished(roster, termination),
                None => SearchOutcome::empty(termination),
            }
        } else {
            SearchOutcome::partial(best, termination)
        };
        outcome.with_iterations(self.nodes)
    }
}

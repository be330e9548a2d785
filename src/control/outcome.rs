//! Algorithm outcome.

use crate::roster::Roster;

/// Why an algorithm stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Termination {
    /// Ran to its natural end (solution found, converged or cap reached).
    Completed,
    /// Search space exhausted without a complete solution.
    Exhausted,
    /// Wall-clock budget exceeded.
    TimedOut,
    /// Stopped by the caller.
    Stopped,
}

/// Result of one algorithm run, before it becomes a `ScheduleResult`.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// Best roster found, possibly partial.
    pub best: Option<Roster>,
    /// Whether `best` is a finished roster rather than a partial snapshot.
    pub complete: bool,
    pub termination: Termination,
    /// Nodes, moves or repair iterations consumed.
    pub iterations: u64,
    /// GA generations consumed.
    pub generations: u64,
    /// Best score per generation, or score after each accepted move.
    pub history: Vec<f64>,
}

impl SearchOutcome {
    /// An outcome with no roster.
    pub fn empty(termination: Termination) -> Self {
        Self {
            best: None,
            complete: false,
            termination,
            iterations: 0,
            generations: 0,
            history: Vec::new(),
        }
    }

    /// A finished roster.
    pub fn finished(best: Roster, termination: Termination) -> Self {
        Self {
            best: Some(best),
            complete: true,
            ..Self::empty(termination)
        }
    }

    /// A partial roster (e.g. the deepest backtracking state).
    pub fn partial(best: Option<Roster>, termination: Termination) -> Self {
        Self {
            best,
            complete: false,
            ..Self::empty(termination)
        }
    }

    /// Sets the iteration count.
    pub fn with_iterations(mut self, iterations: u64) -> Self {
        self.iterations = iterations;
        self
    }

    /// Sets the generation count.
    pub fn with_generations(mut self, generations: u64) -> Self {
        self.generations = generations;
        self
    }

    /// Sets the score history.
    pub fn with_history(mut self, history: Vec<f64>) -> Self {
        self.history = history;
        self
    }
}

//! Ranking context.

use crate::roster::{RosterProblem, Slot, WorkLedger};

/// State passed to ranking rules: the problem, the roster built so far
/// (through its ledger) and the slot being filled.
#[derive(Debug, Clone, Copy)]
pub struct RankingContext<'a> {
    /// Compiled problem.
    pub problem: &'a RosterProblem,
    /// Ledger of the roster under construction.
    pub ledger: &'a WorkLedger,
    /// Slot being filled.
    pub slot: usize,
}

impl<'a> RankingContext<'a> {
    /// Creates a context for filling `slot`.
    pub fn new(problem: &'a RosterProblem, ledger: &'a WorkLedger, slot: usize) -> Self {
        Self {
            problem,
            ledger,
            slot,
        }
    }

    /// The slot being filled.
    #[inline]
    pub fn target(&self) -> &'a Slot {
        &self.problem.slots[self.slot]
    }

    /// Mean minutes worked per employee so far.
    pub fn mean_workload(&self) -> f64 {
        let n = self.problem.num_employees();
        if n == 0 {
            return 0.0;
        }
        let total: i64 = (0..n).map(|e| self.ledger.workload_minutes(e)).sum();
        total as f64 / n as f64
    }
}

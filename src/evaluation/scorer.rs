//! Objective scorer.
//!
//! Combines the evaluator's counts and soft terms into one scalar:
//!
//! ```text
//! score = Σ weight_k × term_k  −  hard_penalty × hard_violations
//! ```
//!
//! Every soft term lies in [0, 1] and the penalty exceeds the sum of soft
//! weights, so any roster with a hard violation scores below every roster
//! without one. Higher is better.

use super::evaluator::{ConstraintEvaluator, SoftTerms, Tally};
use crate::models::ObjectiveWeights;
use crate::roster::{Roster, RosterProblem};

/// Weighted objective shared by all algorithms.
#[derive(Debug, Clone, Copy)]
pub struct ObjectiveScorer<'a> {
    evaluator: ConstraintEvaluator<'a>,
    weights: ObjectiveWeights,
}

impl<'a> ObjectiveScorer<'a> {
    /// Creates a scorer for a problem.
    pub fn new(problem: &'a RosterProblem, weights: ObjectiveWeights) -> Self {
        Self {
            evaluator: ConstraintEvaluator::new(problem),
            weights,
        }
    }

    /// The underlying evaluator.
    #[inline]
    pub fn evaluator(&self) -> ConstraintEvaluator<'a> {
        self.evaluator
    }

    /// The problem being scored.
    #[inline]
    pub fn problem(&self) -> &'a RosterProblem {
        self.evaluator.problem()
    }

    /// Weights in use.
    #[inline]
    pub fn weights(&self) -> &ObjectiveWeights {
        &self.weights
    }

    /// Scores a roster. Pure: the same roster always yields the same value.
    pub fn score(&self, roster: &Roster) -> f64 {
        self.combine(&self.evaluator.tally(roster))
    }

    /// Scores a roster and its hard-violation count in one pass.
    pub fn score_with_hard(&self, roster: &Roster) -> (f64, usize) {
        let tally = self.evaluator.tally(roster);
        (self.combine(&tally), tally.hard)
    }

    /// Returns the cached score, computing and storing it when stale.
    pub fn score_cached(&self, roster: &mut Roster) -> f64 {
        if let Some(score) = roster.cached_score() {
            return score;
        }
        let score = self.score(roster);
        roster.cache_score(score);
        score
    }

    /// Combines a tally into the scalar objective.
    pub fn combine(&self, tally: &Tally) -> f64 {
        self.soft_value(&tally.terms) - self.weights.hard_penalty * tally.hard as f64
    }

    /// Weighted sum of the soft terms alone.
    pub fn soft_value(&self, terms: &SoftTerms) -> f64 {
        let w = &self.weights;
        w.fairness * terms.fairness
            + w.coverage * terms.coverage
            + w.preference * terms.preference
            + w.weekend_balance * terms.weekend_balance
            + w.cost * terms.cost
            + w.compliance * terms.compliance
    }
}

//! Rule engine for multi-criteria candidate ranking.
//!
//! Composes ranking rules with configurable evaluation modes and
//! tie-breaking strategies.
//!
//! # Reference
//! Haupt (1989), "A Survey of Priority Rule-Based Scheduling"

use std::cmp::Ordering;
use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::Rng;

use super::{rules, RankScore, RankingContext, RankingRule};
use crate::models::RuleSet;

/// How multiple rules are combined.
#[derive(Debug, Clone, Default)]
pub enum EvaluationMode {
    /// Apply rules in sequence; use next rule only on ties.
    #[default]
    Sequential,
    /// Compute weighted sum of all rule scores.
    Weighted,
}

/// How ties are broken after all rules are exhausted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TieBreaker {
    /// Uniformly random among tied candidates (seeded by the caller's RNG).
    #[default]
    Random,
    /// Deterministic by employee id (lexicographic).
    ById,
}

#[derive(Clone)]
struct WeightedRule {
    rule: Arc<dyn RankingRule>,
    weight: f64,
}

/// A composable rule engine for candidate ranking.
///
/// # Example
/// ```
/// use u_roster::ranking::{rules, RankingEngine};
///
/// let engine = RankingEngine::new()
///     .with_rule(rules::LeastWorkload)
///     .with_tie_breaker(rules::HighestSeniority);
/// ```
#[derive(Clone)]
pub struct RankingEngine {
    rules: Vec<WeightedRule>,
    mode: EvaluationMode,
    tie_breaker: TieBreaker,
    epsilon: f64,
}

impl RankingEngine {
    /// Creates an empty rule engine.
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            mode: EvaluationMode::Sequential,
            tie_breaker: TieBreaker::Random,
            epsilon: 1e-9,
        }
    }

    /// The construction ranking: least workload, best preference, highest
    /// seniority, lowest cost, then random.
    pub fn roster_default() -> Self {
        Self::new()
            .with_rule(rules::LeastWorkload)
            .with_rule(rules::BestPreference)
            .with_rule(rules::HighestSeniority)
            .with_tie_breaker(rules::LowestCost)
    }

    /// The construction ranking for a rule set. With weekend balancing
    /// enabled, fewest weekend shifts breaks workload ties ahead of
    /// preference.
    pub fn for_rules(rule_set: &RuleSet) -> Self {
        if rule_set.weekend_balance.is_none() {
            return Self::roster_default();
        }
        Self::new()
            .with_rule(rules::LeastWorkload)
            .with_rule(rules::FewestWeekends)
            .with_rule(rules::BestPreference)
            .with_rule(rules::HighestSeniority)
            .with_tie_breaker(rules::LowestCost)
    }

    /// Adds a primary rule (weight 1.0).
    pub fn with_rule<R: RankingRule + 'static>(mut self, rule: R) -> Self {
        self.rules.push(WeightedRule {
            rule: Arc::new(rule),
            weight: 1.0,
        });
        self
    }

    /// Adds a weighted rule.
    pub fn with_weighted_rule<R: RankingRule + 'static>(mut self, rule: R, weight: f64) -> Self {
        self.rules.push(WeightedRule {
            rule: Arc::new(rule),
            weight,
        });
        self
    }

    /// Adds a tie-breaking rule (weight 0.0, used only in Sequential mode).
    pub fn with_tie_breaker<R: RankingRule + 'static>(mut self, rule: R) -> Self {
        self.rules.push(WeightedRule {
            rule: Arc::new(rule),
            weight: 0.0,
        });
        self
    }

    /// Sets the evaluation mode.
    pub fn with_mode(mut self, mode: EvaluationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the final tie-breaking strategy.
    pub fn with_final_tie_breaker(mut self, tie_breaker: TieBreaker) -> Self {
        self.tie_breaker = tie_breaker;
        self
    }

    /// Sorts candidates, best first.
    ///
    /// With [`TieBreaker::Random`] candidates are shuffled before a stable
    /// sort, so fully tied candidates come out in random order.
    pub fn rank<R: Rng + ?Sized>(
        &self,
        candidates: &[usize],
        context: &RankingContext<'_>,
        rng: &mut R,
    ) -> Vec<usize> {
        let mut order = candidates.to_vec();
        if order.is_empty() {
            return order;
        }
        if self.tie_breaker == TieBreaker::Random {
            order.shuffle(rng);
        }

        match &self.mode {
            EvaluationMode::Sequential => {
                let scores: Vec<Vec<RankScore>> = order
                    .iter()
                    .map(|&e| self.rules.iter().map(|wr| wr.rule.evaluate(e, context)).collect())
                    .collect();
                let mut idx: Vec<usize> = (0..order.len()).collect();
                idx.sort_by(|&a, &b| {
                    self.compare_sequential(&scores[a], &scores[b])
                        .then_with(|| self.final_tie(order[a], order[b], context))
                });
                idx.into_iter().map(|i| order[i]).collect()
            }
            EvaluationMode::Weighted => {
                let scores: Vec<f64> = order
                    .iter()
                    .map(|&e| self.weighted_score(e, context))
                    .collect();
                let mut idx: Vec<usize> = (0..order.len()).collect();
                idx.sort_by(|&a, &b| {
                    let primary = if (scores[a] - scores[b]).abs() > self.epsilon {
                        scores[a].partial_cmp(&scores[b]).unwrap_or(Ordering::Equal)
                    } else {
                        Ordering::Equal
                    };
                    primary.then_with(|| self.final_tie(order[a], order[b], context))
                });
                idx.into_iter().map(|i| order[i]).collect()
            }
        }
    }

    /// Returns the best candidate.
    pub fn select_best<R: Rng + ?Sized>(
        &self,
        candidates: &[usize],
        context: &RankingContext<'_>,
        rng: &mut R,
    ) -> Option<usize> {
        self.rank(candidates, context, rng).first().copied()
    }

    /// Evaluates a single candidate and returns weighted scores from each rule.
    pub fn evaluate(&self, employee: usize, context: &RankingContext<'_>) -> Vec<RankScore> {
        self.rules
            .iter()
            .map(|wr| wr.rule.evaluate(employee, context) * wr.weight)
            .collect()
    }

    fn compare_sequential(&self, a: &[RankScore], b: &[RankScore]) -> Ordering {
        for (score_a, score_b) in a.iter().zip(b) {
            if (score_a - score_b).abs() > self.epsilon {
                return score_a.partial_cmp(score_b).unwrap_or(Ordering::Equal);
            }
        }
        Ordering::Equal
    }

    fn final_tie(&self, a: usize, b: usize, context: &RankingContext<'_>) -> Ordering {
        match self.tie_breaker {
            // Already shuffled; keep the stable order.
            TieBreaker::Random => Ordering::Equal,
            TieBreaker::ById => context.problem.employees[a]
                .id
                .cmp(&context.problem.employees[b].id),
        }
    }

    fn weighted_score(&self, employee: usize, context: &RankingContext<'_>) -> f64 {
        self.rules
            .iter()
            .map(|wr| wr.rule.evaluate(employee, context) * wr.weight)
            .sum()
    }
}

impl Default for RankingEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RankingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RankingEngine")
            .field(
                "rules",
                &self
                    .rules
                    .iter()
                    .map(|r| format!("{}(w={})", r.rule.name(), r.weight))
                    .collect::<Vec<_>>(),
            )
            .field("mode", &self.mode)
            .field("tie_breaker", &self.tie_breaker)
            .finish()
    }
}

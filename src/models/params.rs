//! Solver parameters and objective weights.
//!
//! Every tunable has a default and a valid range. [`SolverParams::validate`]
//! reports every out-of-range value; [`SolverParams::sanitized`] replaces
//! them with defaults instead so a run can still go ahead.
//!
//! Parameters deserialize with `#[serde(default)]`, so a TOML or JSON
//! document only needs the values it changes:
//!
//! ```
//! use u_roster::models::SolverParams;
//!
//! let params = SolverParams::from_toml_str(r#"
//!     population_size = 60
//!     time_limit_ms = 5000
//!
//!     [weights]
//!     coverage = 0.4
//! "#).unwrap();
//! assert_eq!(params.population_size, 60);
//! assert_eq!(params.max_generations, 500);
//! ```

use std::str::FromStr;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::validation::{ValidationError, ValidationErrorKind, ValidationResult};

/// Algorithm family selected for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlgorithmKind {
    /// Exact depth-bounded search. Small instances.
    Backtrack,
    /// Genetic optimizer. Medium and large instances.
    Genetic,
    /// Greedy construction followed by local search.
    #[default]
    Greedy,
    /// Heuristic repair of an existing or empty roster.
    Heuristic,
}

impl AlgorithmKind {
    /// Stable upper-case name.
    pub fn name(&self) -> &'static str {
        match self {
            AlgorithmKind::Backtrack => "BACKTRACK",
            AlgorithmKind::Genetic => "GENETIC",
            AlgorithmKind::Greedy => "GREEDY",
            AlgorithmKind::Heuristic => "HEURISTIC",
        }
    }
}

impl std::fmt::Display for AlgorithmKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AlgorithmKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BACKTRACK" | "BACKTRACKING" => Ok(AlgorithmKind::Backtrack),
            "GENETIC" | "GA" => Ok(AlgorithmKind::Genetic),
            "GREEDY" | "LOCAL_SEARCH" => Ok(AlgorithmKind::Greedy),
            "HEURISTIC" | "REPAIR" => Ok(AlgorithmKind::Heuristic),
            other => Err(EngineError::Config(format!("unknown algorithm '{other}'"))),
        }
    }
}

/// Parent selection method for the genetic optimizer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SelectionMethod {
    /// Sample K individuals, keep the fittest.
    #[default]
    Tournament,
    /// Fitness-proportional selection.
    Roulette,
}

/// Pruning strategies for backtracking search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PruningStrategy {
    /// Reject a choice that leaves a nearby open slot without legal candidates.
    ForwardChecking,
    /// Reject a choice that immediately breaks a hard rule.
    ConsistencyChecking,
    /// Branch on the open slot with the fewest legal candidates first.
    MinimumRemainingValues,
}

impl FromStr for PruningStrategy {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "FORWARD_CHECKING" | "FORWARD" => Ok(PruningStrategy::ForwardChecking),
            "CONSISTENCY_CHECKING" | "CONSISTENCY" => Ok(PruningStrategy::ConsistencyChecking),
            "MINIMUM_REMAINING_VALUES" | "MRV" => Ok(PruningStrategy::MinimumRemainingValues),
            other => Err(EngineError::Config(format!("unknown pruning strategy '{other}'"))),
        }
    }
}

/// Repair heuristics, applied one per iteration in list order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HeuristicKind {
    /// Fill the open seat whose best candidate adds the fewest conflicts.
    LeastConflicting,
    /// Serve the employee with the fewest legal open seats first.
    MostConstrained,
    /// Give idle employees the open seat matching their skills best.
    BestFit,
    /// Swap an assignee for an alternative that raises the score.
    HighestValue,
}

impl HeuristicKind {
    /// Stable upper-case name.
    pub fn name(&self) -> &'static str {
        match self {
            HeuristicKind::LeastConflicting => "LEAST_CONFLICTING",
            HeuristicKind::MostConstrained => "MOST_CONSTRAINED",
            HeuristicKind::BestFit => "BEST_FIT",
            HeuristicKind::HighestValue => "HIGHEST_VALUE",
        }
    }
}

/// Weights of the objective terms.
///
/// Soft terms are normalized to [0, 1]; the hard penalty is charged per
/// hard violation and must exceed the sum of soft weights so a roster
/// with a hard violation always scores below a violation-free one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectiveWeights {
    /// Evenness of workload across employees.
    pub fairness: f64,
    /// Share of required headcount filled.
    pub coverage: f64,
    /// Preferred shifts and skill proficiency of assignees.
    pub preference: f64,
    /// Evenness of weekend shifts across employees.
    pub weekend_balance: f64,
    /// Inverse of the seniority x duration cost proxy.
    pub cost: f64,
    /// Absence of soft rule breaches.
    pub compliance: f64,
    /// Penalty per hard violation.
    pub hard_penalty: f64,
}

impl Default for ObjectiveWeights {
    fn default() -> Self {
        Self {
            fairness: 0.25,
            coverage: 0.30,
            preference: 0.15,
            weekend_balance: 0.10,
            cost: 0.10,
            compliance: 0.10,
            hard_penalty: 10.0,
        }
    }
}

impl ObjectiveWeights {
    /// Sum of the soft-term weights.
    pub fn soft_total(&self) -> f64 {
        self.fairness
            + self.coverage
            + self.preference
            + self.weekend_balance
            + self.cost
            + self.compliance
    }

    fn soft_weights(&self) -> [(&'static str, f64); 6] {
        [
            ("fairness", self.fairness),
            ("coverage", self.coverage),
            ("preference", self.preference),
            ("weekend_balance", self.weekend_balance),
            ("cost", self.cost),
            ("compliance", self.compliance),
        ]
    }

    /// Checks weights are finite, non-negative and the penalty dominates.
    pub fn validate(&self) -> ValidationResult {
        let mut errors = Vec::new();
        for (name, w) in self.soft_weights() {
            if !w.is_finite() || w < 0.0 {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidWeights,
                    format!("weight '{name}' must be finite and >= 0, got {w}"),
                ));
            }
        }
        if !self.hard_penalty.is_finite() || self.hard_penalty <= self.soft_total() {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidWeights,
                format!(
                    "hard_penalty {} must exceed the sum of soft weights {}",
                    self.hard_penalty,
                    self.soft_total()
                ),
            ));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Tunable parameters shared by all algorithm families.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverParams {
    /// GA population size (10..=1000).
    pub population_size: usize,
    /// GA generation cap (1..=10000).
    pub max_generations: usize,
    /// GA crossover probability (0..=1).
    pub crossover_rate: f64,
    /// GA per-gene mutation probability (0..=1).
    pub mutation_rate: f64,
    /// GA elite fraction of the parent+offspring pool (0, 1].
    pub elite_rate: f64,
    /// GA tournament size (2..=population_size).
    pub tournament_size: usize,
    /// GA generations without best-fitness change before stopping (1..=10000).
    pub stagnation_generations: usize,
    /// GA parent selection.
    pub selection: SelectionMethod,
    /// Wall-clock budget in milliseconds (1..=3_600_000).
    pub time_limit_ms: u64,
    /// Backtracking depth cap (1..=1_000_000).
    pub max_depth: usize,
    /// Backtracking pruning strategies.
    pub pruning: Vec<PruningStrategy>,
    /// Local search / repair iteration cap (1..=1_000_000).
    pub max_iterations: usize,
    /// Stop local search once the score reaches this value.
    pub quality_threshold: Option<f64>,
    /// Repair heuristics, cycled in order. Must not be empty.
    pub heuristics: Vec<HeuristicKind>,
    /// Evaluate GA populations in parallel.
    pub parallel_evaluation: bool,
    /// RNG seed. `None` seeds from entropy.
    pub seed: Option<u64>,
    /// Objective weights.
    pub weights: ObjectiveWeights,
}

impl Default for SolverParams {
    fn default() -> Self {
        Self {
            population_size: 100,
            max_generations: 500,
            crossover_rate: 0.8,
            mutation_rate: 0.1,
            elite_rate: 0.1,
            tournament_size: 5,
            stagnation_generations: 50,
            selection: SelectionMethod::Tournament,
            time_limit_ms: 60_000,
            max_depth: 10_000,
            pruning: vec![
                PruningStrategy::ForwardChecking,
                PruningStrategy::ConsistencyChecking,
                PruningStrategy::MinimumRemainingValues,
            ],
            max_iterations: 2000,
            quality_threshold: None,
            heuristics: vec![
                HeuristicKind::LeastConflicting,
                HeuristicKind::MostConstrained,
                HeuristicKind::BestFit,
                HeuristicKind::HighestValue,
            ],
            parallel_evaluation: true,
            seed: None,
            weights: ObjectiveWeights::default(),
        }
    }
}

/// One out-of-range parameter: name plus a description of the valid range.
type RangeIssue = (&'static str, String);

impl SolverParams {
    /// Parses parameters from TOML. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Sets the population size.
    pub fn with_population_size(mut self, size: usize) -> Self {
        self.population_size = size;
        self
    }

    /// Sets the generation cap.
    pub fn with_max_generations(mut self, generations: usize) -> Self {
        self.max_generations = generations;
        self
    }

    /// Sets the time limit in milliseconds.
    pub fn with_time_limit_ms(mut self, ms: u64) -> Self {
        self.time_limit_ms = ms;
        self
    }

    /// Sets the backtracking depth cap.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Sets the pruning strategies.
    pub fn with_pruning(mut self, pruning: Vec<PruningStrategy>) -> Self {
        self.pruning = pruning;
        self
    }

    /// Sets the iteration cap.
    pub fn with_max_iterations(mut self, iterations: usize) -> Self {
        self.max_iterations = iterations;
        self
    }

    /// Sets the repair heuristics.
    pub fn with_heuristics(mut self, heuristics: Vec<HeuristicKind>) -> Self {
        self.heuristics = heuristics;
        self
    }

    /// Sets the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the objective weights.
    pub fn with_weights(mut self, weights: ObjectiveWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Whether a pruning strategy is enabled.
    pub fn prunes_with(&self, strategy: PruningStrategy) -> bool {
        self.pruning.contains(&strategy)
    }

    fn range_issues(&self) -> Vec<RangeIssue> {
        let mut issues = Vec::new();
        if !(10..=1000).contains(&self.population_size) {
            issues.push(("population_size", "10..=1000".to_string()));
        }
        if !(1..=10_000).contains(&self.max_generations) {
            issues.push(("max_generations", "1..=10000".to_string()));
        }
        if !(0.0..=1.0).contains(&self.crossover_rate) {
            issues.push(("crossover_rate", "0.0..=1.0".to_string()));
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            issues.push(("mutation_rate", "0.0..=1.0".to_string()));
        }
        if !(self.elite_rate > 0.0 && self.elite_rate <= 1.0) {
            issues.push(("elite_rate", "(0.0, 1.0]".to_string()));
        }
        if self.tournament_size < 2 || self.tournament_size > self.population_size.max(2) {
            issues.push(("tournament_size", format!("2..={}", self.population_size)));
        }
        if !(1..=10_000).contains(&self.stagnation_generations) {
            issues.push(("stagnation_generations", "1..=10000".to_string()));
        }
        if !(1..=3_600_000).contains(&self.time_limit_ms) {
            issues.push(("time_limit_ms", "1..=3600000".to_string()));
        }
        if !(1..=1_000_000).contains(&self.max_depth) {
            issues.push(("max_depth", "1..=1000000".to_string()));
        }
        if !(1..=1_000_000).contains(&self.max_iterations) {
            issues.push(("max_iterations", "1..=1000000".to_string()));
        }
        if self.quality_threshold.is_some_and(|q| !q.is_finite()) {
            issues.push(("quality_threshold", "a finite number".to_string()));
        }
        if self.heuristics.is_empty() {
            issues.push(("heuristics", "a non-empty list".to_string()));
        }
        issues
    }

    /// Checks every parameter against its valid range.
    pub fn validate(&self) -> ValidationResult {
        let mut errors: Vec<ValidationError> = self
            .range_issues()
            .into_iter()
            .map(|(name, range)| {
                ValidationError::new(
                    ValidationErrorKind::ParameterOutOfRange,
                    format!("parameter '{name}' must be in {range}"),
                )
            })
            .collect();
        if let Err(weight_errors) = self.weights.validate() {
            errors.extend(weight_errors);
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Returns a copy with every out-of-range value replaced by its default.
    pub fn sanitized(&self) -> Self {
        let defaults = Self::default();
        let mut params = self.clone();
        for (name, range) in self.range_issues() {
            warn!("parameter '{name}' outside {range}, using default");
            match name {
                "population_size" => params.population_size = defaults.population_size,
                "max_generations" => params.max_generations = defaults.max_generations,
                "crossover_rate" => params.crossover_rate = defaults.crossover_rate,
                "mutation_rate" => params.mutation_rate = defaults.mutation_rate,
                "elite_rate" => params.elite_rate = defaults.elite_rate,
                "stagnation_generations" => {
                    params.stagnation_generations = defaults.stagnation_generations
                }
                "time_limit_ms" => params.time_limit_ms = defaults.time_limit_ms,
                "max_depth" => params.max_depth = defaults.max_depth,
                "max_iterations" => params.max_iterations = defaults.max_iterations,
                "quality_threshold" => params.quality_threshold = None,
                "heuristics" => params.heuristics = defaults.heuristics.clone(),
                _ => {}
            }
        }
        // Depends on the (possibly replaced) population size.
        if params.tournament_size < 2 || params.tournament_size > params.population_size {
            params.tournament_size = defaults.tournament_size.min(params.population_size);
        }
        if self.weights.validate().is_err() {
            warn!("objective weights invalid, using defaults");
            params.weights = defaults.weights;
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let params = SolverParams::default();
        assert!(params.validate().is_ok());
        assert_eq!(params.population_size, 100);
        assert_eq!(params.max_generations, 500);
        assert_eq!(params.time_limit_ms, 60_000);
        assert_eq!(params.heuristics.len(), 4);
        assert!(params.prunes_with(PruningStrategy::ForwardChecking));
    }

    #[test]
    fn test_validate_collects_all_errors() {
        let params = SolverParams {
            population_size: 5,
            mutation_rate: 1.5,
            elite_rate: 0.0,
            heuristics: Vec::new(),
            ..SolverParams::default()
        };
        let errors = params.validate().unwrap_err();
        assert!(errors.len() >= 4);
        assert!(errors
            .iter()
            .all(|e| e.kind == ValidationErrorKind::ParameterOutOfRange));
        assert!(errors.iter().any(|e| e.message.contains("population_size")));
    }

    #[test]
    fn test_sanitized_replaces_out_of_range() {
        let params = SolverParams {
            population_size: 5000,
            crossover_rate: -0.2,
            time_limit_ms: 0,
            tournament_size: 1,
            ..SolverParams::default()
        };
        let fixed = params.sanitized();
        assert_eq!(fixed.population_size, 100);
        assert!((fixed.crossover_rate - 0.8).abs() < 1e-10);
        assert_eq!(fixed.time_limit_ms, 60_000);
        assert_eq!(fixed.tournament_size, 5);
        assert!(fixed.validate().is_ok());
    }

    #[test]
    fn test_weights_penalty_must_dominate() {
        let weights = ObjectiveWeights {
            hard_penalty: 0.5,
            ..ObjectiveWeights::default()
        };
        assert!(weights.validate().is_err());
        assert!((ObjectiveWeights::default().soft_total() - 1.0).abs() < 1e-10);
        assert!(ObjectiveWeights::default().validate().is_ok());
    }

    #[test]
    fn test_from_toml() {
        let params = SolverParams::from_toml_str(
            r#"
            population_size = 40
            selection = "ROULETTE"
            pruning = ["MINIMUM_REMAINING_VALUES"]
            seed = 7

            [weights]
            fairness = 0.5
            "#,
        )
        .unwrap();
        assert_eq!(params.population_size, 40);
        assert_eq!(params.selection, SelectionMethod::Roulette);
        assert_eq!(params.pruning, vec![PruningStrategy::MinimumRemainingValues]);
        assert_eq!(params.seed, Some(7));
        assert!((params.weights.fairness - 0.5).abs() < 1e-10);
        assert!((params.weights.coverage - 0.30).abs() < 1e-10);
    }

    #[test]
    fn test_from_toml_rejects_garbage() {
        let err = SolverParams::from_toml_str("population_size = \"many\"").unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[test]
    fn test_algorithm_from_str() {
        assert_eq!("genetic".parse::<AlgorithmKind>().unwrap(), AlgorithmKind::Genetic);
        assert_eq!("BACKTRACK".parse::<AlgorithmKind>().unwrap(), AlgorithmKind::Backtrack);
        assert_eq!("repair".parse::<AlgorithmKind>().unwrap(), AlgorithmKind::Heuristic);
        assert!("simplex".parse::<AlgorithmKind>().is_err());
        assert_eq!("mrv".parse::<PruningStrategy>().unwrap(), PruningStrategy::MinimumRemainingValues);
        assert_eq!(
            "forward-checking".parse::<PruningStrategy>().unwrap(),
            PruningStrategy::ForwardChecking
        );
    }
}

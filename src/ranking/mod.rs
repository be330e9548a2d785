//! Candidate ranking rules and rule engine.
//!
//! Orders the employees that could fill a seat, for greedy construction
//! and repair. Rules are small and composable; the engine applies them
//! sequentially (next rule only on ties) or as a weighted sum.
//!
//! # Usage
//!
//! ```
//! use u_roster::ranking::{rules, RankingEngine, TieBreaker};
//!
//! let engine = RankingEngine::new()
//!     .with_rule(rules::LeastWorkload)
//!     .with_rule(rules::BestPreference)
//!     .with_final_tie_breaker(TieBreaker::ById);
//! ```
//!
//! # References
//!
//! - Ernst et al. (2004), "Staff scheduling and rostering", Sec. 4
//! - Haupt (1989), "A Survey of Priority Rule-Based Scheduling"

mod context;
mod engine;
pub mod rules;

pub use context::RankingContext;
pub use engine::{EvaluationMode, RankingEngine, TieBreaker};

use std::fmt::Debug;

/// Score returned by a ranking rule.
///
/// Lower scores rank first.
pub type RankScore = f64;

/// A rule scoring how suitable an employee is for the seat in context.
///
/// # Score Convention
/// **Lower score = better candidate.**
pub trait RankingRule: Send + Sync + Debug {
    /// Rule name (e.g., "LEAST_WORKLOAD").
    fn name(&self) -> &'static str;

    /// Scores employee `employee` for the context's slot.
    fn evaluate(&self, employee: usize, context: &RankingContext<'_>) -> RankScore;

    /// Rule description.
    fn description(&self) -> &'static str {
        self.name()
    }
}

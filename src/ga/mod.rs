//! GA-based roster optimization.
//!
//! Evolves employee-by-day chromosomes scored by the shared objective.
//!
//! # Encoding
//!
//! One gene per (employee, day) holding the shift worked or a day off.
//! Gene values are restricted to shifts the employee is eligible for, so
//! availability and hard skill rules can never be broken by a gene.
//!
//! # Submodules
//!
//! - [`operators`]: Runtime-selectable selection, crossover and mutation
//!
//! # Reference
//! - Goldberg (1989), "Genetic Algorithms in Search, Optimization and Machine Learning"
//! - Burke et al. (2004), "The state of the art of nurse rostering"

mod chromosome;
pub mod operators;
mod optimizer;
mod problem;

pub use chromosome::{reassign_mutation, single_point_crossover, RosterChromosome};
pub use optimizer::GeneticOptimizer;
pub use problem::RosterGaProblem;

//! Workforce shift-rostering engine.
//!
//! Assigns employees to shifts over a date horizon under labour rules
//! (rest periods, consecutive days, weekly hours, skills, availability)
//! while balancing coverage, fairness, preferences and cost.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Employee`, `Shift`, `Constraint`,
//!   `Assignment`, `ScheduleRequest`, `ScheduleResult`, `SolverParams`
//! - **`validation`**: Input integrity checks (empty inputs, date range,
//!   duplicate IDs, constraint values)
//! - **`roster`**: Compiled problem, candidate rosters and the incremental
//!   work ledger used for legality checks
//! - **`evaluation`**: Constraint evaluator, objective scorer and KPIs
//! - **`ranking`**: Composable candidate-ranking rules
//! - **`control`**: Stop flag, pause gate, deadline and progress reporting
//! - **`backtrack`**: Depth-bounded backtracking with pruning
//! - **`ga`**: Genetic optimizer with elitism
//! - **`greedy`**: Greedy construction plus local search
//! - **`repair`**: Heuristic repair of existing rosters
//! - **`engine`**: Execution controller, ports and run handles
//!
//! # Algorithm Selection
//!
//! | Algorithm | Suited to | Guarantees |
//! |-----------|-----------|------------|
//! | Backtrack | tens of employees | first feasible complete roster, if one exists within budget |
//! | Genetic | medium to large | best-of-generation never decreases |
//! | Greedy | any size, fast | no accepted move lowers the score |
//! | Heuristic | re-optimizing an existing roster | idempotent once converged |
//!
//! All four share one objective scorer, so their scores are comparable.
//!
//! # References
//!
//! - Ernst et al. (2004), "Staff scheduling and rostering: A review of
//!   applications, methods and models"
//! - Burke et al. (2004), "The state of the art of nurse rostering"

pub mod backtrack;
pub mod control;
pub mod engine;
pub mod error;
pub mod evaluation;
pub mod ga;
pub mod greedy;
pub mod models;
pub mod ranking;
pub mod repair;
pub mod roster;
pub mod validation;

pub use error::{EngineError, Result};

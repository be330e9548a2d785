//! Roster evaluation.
//!
//! - [`ConstraintEvaluator`]: hard/soft rule checks and soft terms
//! - [`ObjectiveScorer`]: weighted scalar objective over those terms
//! - [`RosterKpi`]: workforce indicators for reporting

mod evaluator;
mod kpi;
mod scorer;

pub use evaluator::{
    capacity_severity, overlap_severity, skill_severity, ConstraintCheck, ConstraintEvaluator,
    SoftTerms, Tally, ViolationReport,
};
pub use kpi::RosterKpi;
pub use scorer::ObjectiveScorer;

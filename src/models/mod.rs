//! Rostering domain models.
//!
//! Value types for rostering problems and their solutions. Nothing here
//! searches or scores; algorithms live in sibling modules.
//!
//! # Domain Mappings
//!
//! | u-roster | Retail | Healthcare | Contact centre |
//! |----------|--------|------------|----------------|
//! | Employee | Store associate | Nurse | Agent |
//! | Shift | Opening/closing shift | Early/late/night | Staffing interval |
//! | Constraint | Labour law rule | Rest rule | Schedule adherence rule |
//! | Assignment | Roster line | Duty | Scheduled interval |

mod assignment;
mod availability;
mod constraint;
mod employee;
mod params;
mod request;
mod result;
mod shift;

pub use assignment::{Assignment, AssignmentStatus, Violation, ViolationType};
pub use availability::{is_weekend, Availability, TimeWindow};
pub use constraint::{Constraint, ConstraintKind, RuleLimit, RuleSet};
pub use employee::{Employee, EmploymentCategory, Skill};
pub use params::{
    AlgorithmKind, HeuristicKind, ObjectiveWeights, PruningStrategy, SelectionMethod,
    SolverParams,
};
pub use request::{ScheduleRequest, Scope};
pub use result::{RunStatus, ScheduleResult, ScheduleStatistics};
pub use shift::Shift;

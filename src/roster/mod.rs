//! Indexed working representation shared by all algorithms.
//!
//! - [`RosterProblem`]: employees, shifts, slots and rules compiled into
//!   index form
//! - [`Roster`]: a candidate solution with a self-invalidating score cache
//! - [`WorkLedger`]: incremental bookkeeping for hard-rule legality checks

mod ledger;
mod problem;
mod solution;

pub use ledger::WorkLedger;
pub use problem::{RosterProblem, Slot};
pub use solution::{Placement, Roster};

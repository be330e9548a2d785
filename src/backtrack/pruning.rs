//! Pruning helpers for backtracking.
//!
//! | Strategy | Effect |
//! |----------|--------|
//! | Consistency checking | only legal candidates are branched on |
//! | Forward checking | reject a choice that leaves a nearby open slot with no legal candidate |
//! | Minimum remaining values | branch on the open slot with the fewest legal candidates |
//!
//! # Reference
//! Haralick & Elliott (1980), "Increasing tree search efficiency for
//! constraint satisfaction problems"

use crate::roster::{RosterProblem, WorkLedger};

/// Days on either side of a placement that forward checking inspects.
///
/// A placement can only affect legality within the rest, overlap and
/// consecutive-day horizons, and within its own ISO week.
pub(crate) fn forward_window(problem: &RosterProblem) -> usize {
    (problem.rules.consecutive_day_cap() as usize + 1).max(7)
}

/// Whether every open slot within the window around `day` still has a
/// legal candidate.
pub(crate) fn forward_check(problem: &RosterProblem, ledger: &WorkLedger, day: usize) -> bool {
    let window = forward_window(problem);
    let lo = day.saturating_sub(window);
    let hi = (day + window).min(problem.days.saturating_sub(1));
    (lo..=hi).all(|d| {
        problem
            .slots_on(d)
            .iter()
            .filter(|&&s| ledger.open_seats(problem, s) > 0)
            .all(|&s| ledger.has_legal_candidate(problem, s))
    })
}

/// First slot with an open seat, in slot order.
pub(crate) fn first_open_slot(problem: &RosterProblem, ledger: &WorkLedger) -> Option<usize> {
    (0..problem.slots.len()).find(|&s| ledger.open_seats(problem, s) > 0)
}

/// Open slot with the fewest legal candidates; ties go to the earlier slot.
pub(crate) fn most_constrained_slot(
    problem: &RosterProblem,
    ledger: &WorkLedger,
) -> Option<usize> {
    let mut best: Option<(usize, usize)> = None;
    for s in 0..problem.slots.len() {
        if ledger.open_seats(problem, s) == 0 {
            continue;
        }
        let remaining = (0..problem.num_employees())
            .filter(|&e| ledger.can_assign(problem, e, s))
            .count();
        if remaining == 0 {
            return Some(s);
        }
        if best.map_or(true, |(_, r)| remaining < r) {
            best = Some((s, remaining));
        }
    }
    best.map(|(s, _)| s)
}

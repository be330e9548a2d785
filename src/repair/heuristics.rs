//! Built-in repair heuristics.
//!
//! Every heuristic is deterministic: candidates are ordered by total keys
//! and at most [`CANDIDATE_BUDGET`] trials are scored. A heuristic returns
//! an [`Improvement`] only when some trial strictly beats the current
//! score.

use std::cmp::Reverse;

use super::{Improvement, RepairContext, RepairHeuristic};
use crate::models::HeuristicKind;
use crate::roster::{Placement, Roster, WorkLedger};

/// Trials scored per heuristic application.
pub const CANDIDATE_BUDGET: usize = 24;

/// Scores trials and keeps the best one that strictly improves.
fn best_improvement(
    context: &RepairContext<'_>,
    trials: impl IntoIterator<Item = Roster>,
) -> Option<Improvement> {
    let mut best: Option<Improvement> = None;
    for roster in trials.into_iter().take(CANDIDATE_BUDGET) {
        let score = context.scorer.score(&roster);
        let threshold = best.as_ref().map_or(context.score, |b| b.score);
        if score > threshold {
            best = Some(Improvement { roster, score });
        }
    }
    best
}

/// First trial that strictly improves.
fn first_improvement(
    context: &RepairContext<'_>,
    trials: impl IntoIterator<Item = Roster>,
) -> Option<Improvement> {
    trials
        .into_iter()
        .take(CANDIDATE_BUDGET)
        .map(|roster| {
            let score = context.scorer.score(&roster);
            Improvement { roster, score }
        })
        .find(|imp| imp.score > context.score)
}

fn with_added(roster: &Roster, placement: Placement) -> Roster {
    let mut trial = roster.clone();
    trial.add(placement);
    trial
}

/// Open (employee, slot) pairs where the employee is eligible.
fn open_pairs(context: &RepairContext<'_>, ledger: &WorkLedger) -> Vec<(usize, usize)> {
    let problem = context.problem();
    let mut pairs = Vec::new();
    for slot in 0..problem.slots.len() {
        if ledger.open_seats(problem, slot) == 0 {
            continue;
        }
        for e in 0..problem.num_employees() {
            if problem.is_eligible(e, slot) && !ledger.holds(problem, e, slot) {
                pairs.push((e, slot));
            }
        }
    }
    pairs
}

/// Affinity scaled to an integer so it can sit in a sort key.
fn affinity_key(context: &RepairContext<'_>, employee: usize, slot: usize) -> i64 {
    let problem = context.problem();
    (problem.affinity(employee, problem.slots[slot].shift) * 1_000_000.0).round() as i64
}

/// Adds the pair introducing the fewest conflicts; when the roster breaks
/// hard rules, also tries dropping the placements that cause them.
#[derive(Debug, Clone, Copy)]
pub struct LeastConflicting;

impl RepairHeuristic for LeastConflicting {
    fn name(&self) -> &'static str {
        "LEAST_CONFLICTING"
    }

    fn improve(&self, context: &RepairContext<'_>) -> Option<Improvement> {
        let problem = context.problem();
        let roster = context.roster;
        let ledger = WorkLedger::from_roster(problem, roster);

        let mut trials: Vec<Roster> = Vec::new();
        if context.hard > 0 {
            let mut culprits: Vec<(usize, usize)> = roster
                .placements()
                .iter()
                .enumerate()
                .filter_map(|(i, &p)| {
                    let mut without = ledger.clone();
                    without.unassign(problem, p);
                    let conflicts = without.conflicts_if_assigned(problem, p.employee, p.slot);
                    (conflicts > 0).then_some((conflicts, i))
                })
                .collect();
            culprits.sort_by_key(|&(conflicts, i)| (Reverse(conflicts), i));
            trials.extend(culprits.into_iter().map(|(_, i)| {
                let mut trial = roster.clone();
                trial.remove_at(i);
                trial
            }));
        }

        let mut pairs: Vec<(usize, i64, usize, usize)> = open_pairs(context, &ledger)
            .into_iter()
            .map(|(e, slot)| {
                (
                    ledger.conflicts_if_assigned(problem, e, slot),
                    -affinity_key(context, e, slot),
                    slot,
                    e,
                )
            })
            .collect();
        pairs.sort_unstable();
        let budget = CANDIDATE_BUDGET.saturating_sub(trials.len().min(CANDIDATE_BUDGET / 2));
        trials.truncate(CANDIDATE_BUDGET / 2);
        trials.extend(
            pairs
                .into_iter()
                .take(budget)
                .map(|(_, _, slot, e)| with_added(roster, Placement::new(e, slot))),
        );
        best_improvement(context, trials)
    }
}

/// Serves the employee with the fewest legal open slots first.
#[derive(Debug, Clone, Copy)]
pub struct MostConstrainedFirst;

impl RepairHeuristic for MostConstrainedFirst {
    fn name(&self) -> &'static str {
        "MOST_CONSTRAINED"
    }

    fn improve(&self, context: &RepairContext<'_>) -> Option<Improvement> {
        let problem = context.problem();
        let ledger = WorkLedger::from_roster(problem, context.roster);

        let mut options: Vec<Vec<usize>> = vec![Vec::new(); problem.num_employees()];
        for slot in 0..problem.slots.len() {
            if ledger.open_seats(problem, slot) == 0 {
                continue;
            }
            for e in ledger.legal_candidates(problem, slot) {
                options[e].push(slot);
            }
        }
        let mut employees: Vec<usize> = (0..problem.num_employees())
            .filter(|&e| !options[e].is_empty())
            .collect();
        employees.sort_by_key(|&e| (options[e].len(), e));

        let trials = employees.into_iter().flat_map(|e| {
            let mut slots = options[e].clone();
            slots.sort_by_key(|&s| (Reverse(affinity_key(context, e, s)), s));
            slots
                .into_iter()
                .map(move |s| with_added(context.roster, Placement::new(e, s)))
        });
        first_improvement(context, trials)
    }
}

/// Places the least-loaded employees on the open slot they match best.
#[derive(Debug, Clone, Copy)]
pub struct BestFit;

impl RepairHeuristic for BestFit {
    fn name(&self) -> &'static str {
        "BEST_FIT"
    }

    fn improve(&self, context: &RepairContext<'_>) -> Option<Improvement> {
        let problem = context.problem();
        let ledger = WorkLedger::from_roster(problem, context.roster);

        let mut picks: Vec<(i64, i64, usize, usize)> = Vec::new();
        for e in 0..problem.num_employees() {
            let best = (0..problem.slots.len())
                .filter(|&s| ledger.open_seats(problem, s) > 0 && ledger.can_assign(problem, e, s))
                .min_by_key(|&s| {
                    (
                        Reverse(affinity_key(context, e, s)),
                        Reverse(ledger.open_seats(problem, s)),
                        s,
                    )
                });
            if let Some(slot) = best {
                picks.push((
                    ledger.workload_minutes(e),
                    -affinity_key(context, e, slot),
                    e,
                    slot,
                ));
            }
        }
        picks.sort_unstable();
        best_improvement(
            context,
            picks
                .into_iter()
                .map(|(_, _, e, slot)| with_added(context.roster, Placement::new(e, slot))),
        )
    }
}

/// Hands an existing placement to another employee when that strictly
/// raises the objective.
#[derive(Debug, Clone, Copy)]
pub struct HighestValue;

impl RepairHeuristic for HighestValue {
    fn name(&self) -> &'static str {
        "HIGHEST_VALUE"
    }

    fn improve(&self, context: &RepairContext<'_>) -> Option<Improvement> {
        let problem = context.problem();
        let roster = context.roster;
        let ledger = WorkLedger::from_roster(problem, roster);

        let mut swaps: Vec<(i64, usize, usize)> = Vec::new();
        for (i, &p) in roster.placements().iter().enumerate() {
            let mut without = ledger.clone();
            without.unassign(problem, p);
            let current = affinity_key(context, p.employee, p.slot);
            for e in without.legal_candidates(problem, p.slot) {
                if e != p.employee {
                    swaps.push((current - affinity_key(context, e, p.slot), i, e));
                }
            }
        }
        swaps.sort_unstable();
        best_improvement(
            context,
            swaps.into_iter().map(|(_, i, e)| {
                let mut trial = roster.clone();
                let slot = trial.placements()[i].slot;
                trial.replace(i, Placement::new(e, slot));
                trial
            }),
        )
    }
}

/// The built-in heuristic for a configured kind.
pub fn heuristic_for(kind: HeuristicKind) -> Box<dyn RepairHeuristic> {
    match kind {
        HeuristicKind::LeastConflicting => Box::new(LeastConflicting),
        HeuristicKind::MostConstrained => Box::new(MostConstrainedFirst),
        HeuristicKind::BestFit => Box::new(BestFit),
        HeuristicKind::HighestValue => Box::new(HighestValue),
    }
}

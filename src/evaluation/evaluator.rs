//! Constraint evaluator.
//!
//! Checks a roster against the hard rules (capacity, availability,
//! conflicts, consecutive days, rest periods, weekly and daily hours)
//! and the soft rules, and computes the normalized soft terms the
//! objective scorer combines.
//!
//! Two entry points share one pass over the roster:
//! - [`ConstraintEvaluator::evaluate`] builds a full [`ViolationReport`]
//!   with messages and offending assignments.
//! - [`ConstraintEvaluator::tally`] only counts, for the scoring hot path.
//!
//! # Severity
//!
//! | Breach | Severity |
//! |--------|----------|
//! | Overlap | by overlap length: >=8h 5, >=4h 4, >=2h 3, >=1h 2, else 1 |
//! | Capacity | by overload: >=50% 5, >=30% 4, >=10% 3, else 2 |
//! | Skill mismatch | all required missing 5, >= half 4, else 3 |
//! | Unavailable | 4 |
//! | Rule limits | 3 |
//!
//! The evaluator is pure: no randomness, no interior state.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{Assignment, Violation, ViolationType};
use crate::roster::{Placement, Roster, RosterProblem};

/// Normalized soft objective terms, each in [0, 1].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SoftTerms {
    /// 1 / (1 + squared coefficient of variation of hours per employee).
    pub fairness: f64,
    /// Filled share of required headcount (capped per slot).
    pub coverage: f64,
    /// Mean preference/skill affinity per required seat.
    pub preference: f64,
    /// 1 / (1 + variance of weekend shifts per employee).
    pub weekend_balance: f64,
    /// Cheapest possible cost over actual cost, scaled by coverage.
    pub cost: f64,
    /// 1 / (1 + soft violations).
    pub compliance: f64,
}

/// Outcome of one rule check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintCheck {
    /// Rule checked.
    pub violation_type: ViolationType,
    /// Whether the rule is hard.
    pub hard: bool,
    /// Whether no breach was found.
    pub satisfied: bool,
    /// Assignments involved in breaches.
    pub offending: Vec<Assignment>,
}

/// Counts and terms without violation details.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Tally {
    pub hard: usize,
    pub soft: usize,
    pub terms: SoftTerms,
}

/// Full evaluation of a roster.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViolationReport {
    /// Every breach found.
    pub violations: Vec<Violation>,
    /// One entry per rule checked.
    pub checks: Vec<ConstraintCheck>,
    /// Number of hard breaches.
    pub hard_count: usize,
    /// Number of soft breaches.
    pub soft_count: usize,
    /// Soft objective terms.
    pub terms: SoftTerms,
}

impl ViolationReport {
    /// Whether no hard rule is breached.
    #[inline]
    pub fn is_feasible(&self) -> bool {
        self.hard_count == 0
    }

    /// Share of required headcount filled.
    #[inline]
    pub fn coverage_rate(&self) -> f64 {
        self.terms.coverage
    }

    /// Breaches with severity >= 3.
    pub fn severe_count(&self) -> usize {
        self.violations.iter().filter(|v| v.is_severe()).count()
    }

    /// Breaches with severity < 3.
    pub fn minor_count(&self) -> usize {
        self.violations.len() - self.severe_count()
    }

    /// Aggregate severity: `min((severe * 10 + minor * 3) / total, 100)`.
    pub fn severity_score(&self) -> f64 {
        let total = self.violations.len();
        if total == 0 {
            return 0.0;
        }
        let weighted = (self.severe_count() * 10 + self.minor_count() * 3) as f64;
        (weighted / total as f64).min(100.0)
    }

    /// Breach counts per type.
    pub fn counts_by_type(&self) -> BTreeMap<ViolationType, usize> {
        let mut counts = BTreeMap::new();
        for v in &self.violations {
            *counts.entry(v.violation_type).or_insert(0) += 1;
        }
        counts
    }

    /// Hard breaches.
    pub fn hard_violations(&self) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(|v| v.hard)
    }

    /// Breaches affecting one employee.
    pub fn violations_for<'a>(&'a self, employee_id: &'a str) -> impl Iterator<Item = &'a Violation> {
        self.violations
            .iter()
            .filter(move |v| v.employee_id.as_deref() == Some(employee_id))
    }

    /// The check entry for a rule, if it was evaluated.
    pub fn check(&self, violation_type: ViolationType) -> Option<&ConstraintCheck> {
        self.checks.iter().find(|c| c.violation_type == violation_type)
    }
}

trait Recorder {
    fn record<F: FnOnce() -> Violation>(&mut self, hard: bool, build: F);

    fn soft(&self) -> usize;
}

#[derive(Default)]
struct Counter {
    hard: usize,
    soft: usize,
}

impl Recorder for Counter {
    fn record<F: FnOnce() -> Violation>(&mut self, hard: bool, _build: F) {
        if hard {
            self.hard += 1;
        } else {
            self.soft += 1;
        }
    }

    fn soft(&self) -> usize {
        self.soft
    }
}

#[derive(Default)]
struct Collector {
    violations: Vec<Violation>,
    hard: usize,
    soft: usize,
}

impl Recorder for Collector {
    fn record<F: FnOnce() -> Violation>(&mut self, hard: bool, build: F) {
        if hard {
            self.hard += 1;
        } else {
            self.soft += 1;
        }
        self.violations.push(build());
    }

    fn soft(&self) -> usize {
        self.soft
    }
}

/// Grades an overlap by its length.
pub fn overlap_severity(minutes: i64) -> u8 {
    match minutes {
        m if m >= 480 => 5,
        m if m >= 240 => 4,
        m if m >= 120 => 3,
        m if m >= 60 => 2,
        _ => 1,
    }
}

/// Grades a capacity overload by percentage over headcount.
pub fn capacity_severity(assigned: usize, headcount: usize) -> u8 {
    let over = assigned.saturating_sub(headcount) as f64;
    let pct = if headcount == 0 {
        100.0
    } else {
        over * 100.0 / headcount as f64
    };
    match pct {
        p if p >= 50.0 => 5,
        p if p >= 30.0 => 4,
        p if p >= 10.0 => 3,
        _ => 2,
    }
}

/// Grades a skill mismatch by the share of required skills missing.
pub fn skill_severity(missing: usize, required: usize) -> u8 {
    if missing >= required {
        5
    } else if missing * 2 >= required {
        4
    } else {
        3
    }
}

/// Pure rule checker bound to a compiled problem.
#[derive(Debug, Clone, Copy)]
pub struct ConstraintEvaluator<'a> {
    problem: &'a RosterProblem,
}

impl<'a> ConstraintEvaluator<'a> {
    /// Creates an evaluator for a problem.
    pub fn new(problem: &'a RosterProblem) -> Self {
        Self { problem }
    }

    /// The problem this evaluator checks against.
    pub fn problem(&self) -> &'a RosterProblem {
        self.problem
    }

    /// Counts breaches and computes soft terms.
    pub fn tally(&self, roster: &Roster) -> Tally {
        let mut counter = Counter::default();
        let terms = self.walk(roster, &mut counter);
        Tally {
            hard: counter.hard,
            soft: counter.soft,
            terms,
        }
    }

    /// Full report with violation details and per-rule checks.
    pub fn evaluate(&self, roster: &Roster) -> ViolationReport {
        let mut collector = Collector::default();
        let terms = self.walk(roster, &mut collector);
        let checks = self.checks(&collector.violations);
        ViolationReport {
            violations: collector.violations,
            checks,
            hard_count: collector.hard,
            soft_count: collector.soft,
            terms,
        }
    }

    fn checks(&self, violations: &[Violation]) -> Vec<ConstraintCheck> {
        let rules = &self.problem.rules;
        let mut evaluated = vec![
            (ViolationType::CapacityExceeded, true),
            (ViolationType::Unavailable, true),
            (ViolationType::Overlap, true),
            (ViolationType::ConsecutiveDays, rules.max_consecutive_days.hard),
            (ViolationType::RestPeriod, rules.min_rest_hours.hard),
            (ViolationType::WeeklyHours, rules.max_weekly_hours.hard),
        ];
        if !rules.allow_split_shifts {
            evaluated.push((ViolationType::DuplicateDay, true));
        }
        if let Some(l) = rules.skill_match {
            evaluated.push((ViolationType::SkillMismatch, l.hard));
        }
        if let Some(l) = rules.max_daily_hours {
            evaluated.push((ViolationType::DailyHours, l.hard));
        }
        if let Some(l) = rules.min_coverage {
            evaluated.push((ViolationType::UnderCoverage, l.hard));
        }
        if let Some(l) = rules.weekend_balance {
            evaluated.push((ViolationType::WeekendImbalance, l.hard));
        }

        evaluated
            .into_iter()
            .map(|(violation_type, hard)| {
                let mut offending: Vec<Assignment> = Vec::new();
                let mut satisfied = true;
                for v in violations.iter().filter(|v| v.violation_type == violation_type) {
                    satisfied = false;
                    for a in &v.offending {
                        if !offending.contains(a) {
                            offending.push(a.clone());
                        }
                    }
                }
                ConstraintCheck {
                    violation_type,
                    hard,
                    satisfied,
                    offending,
                }
            })
            .collect()
    }

    fn walk<R: Recorder>(&self, roster: &Roster, rec: &mut R) -> SoftTerms {
        let p = self.problem;
        let rules = &p.rules;
        let n = p.num_employees();

        // Slot fill.
        let mut counts = vec![0usize; p.slots.len()];
        for pl in roster.placements() {
            counts[pl.slot] += 1;
        }
        let mut covered = 0usize;
        for (slot_idx, slot) in p.slots.iter().enumerate() {
            let count = counts[slot_idx];
            covered += count.min(slot.headcount);
            if count > slot.headcount {
                rec.record(true, || {
                    let shift = &p.shifts[slot.shift];
                    Violation::new(
                        ViolationType::CapacityExceeded,
                        true,
                        format!(
                            "Shift '{}' on {} has {} assignees for {} seats",
                            shift.id, slot.date, count, slot.headcount
                        ),
                    )
                    .for_shift(shift.id.clone())
                    .on(slot.date)
                    .with_severity(capacity_severity(count, slot.headcount))
                    .with_offending(self.on_slot(roster, slot_idx))
                });
            }
            if let Some(limit) = rules.min_coverage {
                let need = p.min_fill(slot_idx);
                if count < need {
                    rec.record(limit.hard, || {
                        let shift = &p.shifts[slot.shift];
                        Violation::new(
                            ViolationType::UnderCoverage,
                            limit.hard,
                            format!(
                                "Shift '{}' on {} has {} of {} required assignees",
                                shift.id, slot.date, count, need
                            ),
                        )
                        .for_shift(shift.id.clone())
                        .on(slot.date)
                        .with_offending(self.on_slot(roster, slot_idx))
                    });
                }
            }
        }

        // Per-employee checks.
        let mut by_employee: Vec<Vec<Placement>> = vec![Vec::new(); n];
        for &pl in roster.placements() {
            by_employee[pl.employee].push(pl);
        }
        let mut hours = vec![0.0f64; n];
        let mut weekend = vec![0usize; n];
        let mut affinity_sum = 0.0;
        let mut cost_actual = 0.0;
        let mut cost_ideal = 0.0;

        for (e, placements) in by_employee.iter_mut().enumerate() {
            if placements.is_empty() {
                continue;
            }
            placements.sort_by_key(|pl| (p.slots[pl.slot].window.start, pl.slot));
            let employee = &p.employees[e];

            for &pl in placements.iter() {
                let slot = &p.slots[pl.slot];
                let shift = &p.shifts[slot.shift];
                let h = slot.minutes() as f64 / 60.0;
                hours[e] += h;
                if slot.weekend {
                    weekend[e] += 1;
                }
                affinity_sum += p.affinity(e, slot.shift);
                cost_actual += p.level(e) as f64 * h;
                cost_ideal += p.min_level() as f64 * h;

                if !employee.is_available_on(slot.date) {
                    rec.record(true, || {
                        Violation::new(
                            ViolationType::Unavailable,
                            true,
                            format!("Employee '{}' is not available on {}", employee.id, slot.date),
                        )
                        .for_employee(employee.id.clone())
                        .for_shift(shift.id.clone())
                        .on(slot.date)
                        .with_severity(4)
                        .with_offending(vec![p.assignment(pl)])
                    });
                }

                if let Some(limit) = rules.skill_match {
                    let missing = shift
                        .required_skills
                        .iter()
                        .filter(|s| !employee.has_skill(s) || employee.skill_level(s) < limit.value)
                        .count();
                    if missing > 0 {
                        rec.record(limit.hard, || {
                            Violation::new(
                                ViolationType::SkillMismatch,
                                limit.hard,
                                format!(
                                    "Employee '{}' lacks {} of {} skills for shift '{}'",
                                    employee.id,
                                    missing,
                                    shift.required_skills.len(),
                                    shift.id
                                ),
                            )
                            .for_employee(employee.id.clone())
                            .for_shift(shift.id.clone())
                            .on(slot.date)
                            .with_severity(skill_severity(missing, shift.required_skills.len()))
                            .with_offending(vec![p.assignment(pl)])
                        });
                    }
                }
            }

            self.check_pairs(e, placements, rec);
            self.check_streaks(e, placements, rec);
            self.check_hours(e, placements, rec);
        }

        if let Some(limit) = rules.weekend_balance {
            let max = weekend.iter().copied().max().unwrap_or(0);
            let min = weekend.iter().copied().min().unwrap_or(0);
            if (max - min) as f64 > limit.value {
                rec.record(limit.hard, || {
                    Violation::new(
                        ViolationType::WeekendImbalance,
                        limit.hard,
                        format!(
                            "Weekend shifts per employee range from {min} to {max} (allowed spread {})",
                            limit.value
                        ),
                    )
                })
            }
        }

        let required = p.total_required();
        let coverage = if required == 0 {
            1.0
        } else {
            covered as f64 / required as f64
        };
        let preference = if required == 0 {
            0.0
        } else {
            (affinity_sum / required as f64).min(1.0)
        };
        let cost = if cost_actual > 0.0 {
            cost_ideal / cost_actual * coverage
        } else {
            0.0
        };

        let weekend: Vec<f64> = weekend.iter().map(|&w| w as f64).collect();

        SoftTerms {
            fairness: fairness(&hours),
            coverage,
            preference,
            weekend_balance: 1.0 / (1.0 + variance(&weekend)),
            cost,
            compliance: 1.0 / (1.0 + rec.soft() as f64),
        }
    }

    /// Same-day duplicates, overlaps and rest periods between working days.
    fn check_pairs<R: Recorder>(&self, e: usize, placements: &[Placement], rec: &mut R) {
        let p = self.problem;
        let rules = &p.rules;
        let employee = &p.employees[e];
        let rest = rules.rest_minutes();

        for i in 0..placements.len() {
            let a = &p.slots[placements[i].slot];
            for (j, pl_b) in placements.iter().enumerate().skip(i + 1) {
                let b = &p.slots[pl_b.slot];
                if b.day > a.day + 1 {
                    break;
                }
                let overlap = a.window.overlap_minutes(&b.window);
                let pair = || vec![p.assignment(placements[i]), p.assignment(placements[j])];

                if a.day == b.day && !rules.allow_split_shifts {
                    rec.record(true, || {
                        let severity = if overlap > 0 { overlap_severity(overlap) } else { 2 };
                        Violation::new(
                            ViolationType::DuplicateDay,
                            true,
                            format!("Employee '{}' has more than one shift on {}", employee.id, a.date),
                        )
                        .for_employee(employee.id.clone())
                        .on(a.date)
                        .with_severity(severity)
                        .with_offending(pair())
                    });
                }
                if overlap > 0 {
                    rec.record(true, || {
                        Violation::new(
                            ViolationType::Overlap,
                            true,
                            format!(
                                "Employee '{}' has overlapping shifts on {} ({} min)",
                                employee.id, b.date, overlap
                            ),
                        )
                        .for_employee(employee.id.clone())
                        .on(b.date)
                        .with_severity(overlap_severity(overlap))
                        .with_offending(pair())
                    });
                }
            }

            // Rest is measured to the next shift on a later date.
            if let Some(next) = placements[i + 1..]
                .iter()
                .find(|pl| p.slots[pl.slot].day != a.day)
            {
                let b = &p.slots[next.slot];
                if !a.window.overlaps(&b.window) {
                    let gap = a.window.gap_minutes(&b.window);
                    if gap < rest {
                        let hard = rules.min_rest_hours.hard;
                        rec.record(hard, || {
                            Violation::new(
                                ViolationType::RestPeriod,
                                hard,
                                format!(
                                    "Employee '{}' rests {:.1} h before {} (minimum {} h)",
                                    employee.id,
                                    gap as f64 / 60.0,
                                    b.date,
                                    rules.min_rest_hours.value
                                ),
                            )
                            .for_employee(employee.id.clone())
                            .on(b.date)
                            .with_offending(vec![p.assignment(placements[i]), p.assignment(*next)])
                        });
                    }
                }
            }
        }
    }

    /// One breach per streak, reported on the first day past the cap.
    fn check_streaks<R: Recorder>(&self, e: usize, placements: &[Placement], rec: &mut R) {
        let p = self.problem;
        let limit = p.rules.max_consecutive_days;
        let cap = p.rules.consecutive_day_cap() as usize;
        let employee = &p.employees[e];

        let mut days: Vec<usize> = placements.iter().map(|pl| p.slots[pl.slot].day).collect();
        days.dedup();

        let mut streak_start = 0;
        for k in 0..days.len() {
            if k > 0 && days[k] != days[k - 1] + 1 {
                streak_start = k;
            }
            if k - streak_start + 1 == cap + 1 {
                let first_day = days[streak_start];
                let breach_day = days[k];
                rec.record(limit.hard, || {
                    let date = p.start + chrono::Duration::days(breach_day as i64);
                    let offending = placements
                        .iter()
                        .filter(|pl| {
                            let d = p.slots[pl.slot].day;
                            d >= first_day && d <= breach_day
                        })
                        .map(|&pl| p.assignment(pl))
                        .collect();
                    Violation::new(
                        ViolationType::ConsecutiveDays,
                        limit.hard,
                        format!(
                            "Employee '{}' works more than {} consecutive days (day {} of streak on {})",
                            employee.id,
                            cap,
                            cap + 1,
                            date
                        ),
                    )
                    .for_employee(employee.id.clone())
                    .on(date)
                    .with_offending(offending)
                });
            }
        }
    }

    /// Weekly (per ISO week) and daily hour caps.
    fn check_hours<R: Recorder>(&self, e: usize, placements: &[Placement], rec: &mut R) {
        let p = self.problem;
        let employee = &p.employees[e];
        let weekly = p.weekly_limit(e);

        let mut week_minutes: BTreeMap<usize, (i64, Vec<Placement>)> = BTreeMap::new();
        let mut day_minutes: BTreeMap<usize, (i64, Vec<Placement>)> = BTreeMap::new();
        for &pl in placements {
            let slot = &p.slots[pl.slot];
            let w = week_minutes.entry(p.week_of(slot.day)).or_default();
            w.0 += slot.minutes();
            w.1.push(pl);
            let d = day_minutes.entry(slot.day).or_default();
            d.0 += slot.minutes();
            d.1.push(pl);
        }

        for (minutes, week_placements) in week_minutes.values() {
            if *minutes as f64 > weekly.value * 60.0 + 1e-9 {
                rec.record(weekly.hard, || {
                    let last = week_placements[week_placements.len() - 1];
                    Violation::new(
                        ViolationType::WeeklyHours,
                        weekly.hard,
                        format!(
                            "Employee '{}' works {:.1} h in a week (limit {} h)",
                            employee.id,
                            *minutes as f64 / 60.0,
                            weekly.value
                        ),
                    )
                    .for_employee(employee.id.clone())
                    .on(p.slots[last.slot].date)
                    .with_offending(week_placements.iter().map(|&pl| p.assignment(pl)).collect())
                });
            }
        }

        if let Some(daily) = p.rules.max_daily_hours {
            for (minutes, day_placements) in day_minutes.values() {
                if *minutes as f64 > daily.value * 60.0 + 1e-9 {
                    rec.record(daily.hard, || {
                        let date = p.slots[day_placements[0].slot].date;
                        Violation::new(
                            ViolationType::DailyHours,
                            daily.hard,
                            format!(
                                "Employee '{}' works {:.1} h on {} (limit {} h)",
                                employee.id,
                                *minutes as f64 / 60.0,
                                date,
                                daily.value
                            ),
                        )
                        .for_employee(employee.id.clone())
                        .on(date)
                        .with_offending(day_placements.iter().map(|&pl| p.assignment(pl)).collect())
                    });
                }
            }
        }
    }

    fn on_slot(&self, roster: &Roster, slot: usize) -> Vec<Assignment> {
        roster
            .placements()
            .iter()
            .filter(|pl| pl.slot == slot)
            .map(|&pl| self.problem.assignment(pl))
            .collect()
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64
}

/// 1 / (1 + CV^2) of per-employee hours; 0 for an empty roster.
fn fairness(hours: &[f64]) -> f64 {
    let m = mean(hours);
    if m <= 0.0 {
        return 0.0;
    }
    1.0 / (1.0 + variance(hours) / (m * m))
}

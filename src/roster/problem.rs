//! Compiled rostering problem.
//!
//! Turns employees, shifts, a horizon and a rule set into an indexed form
//! the algorithms can work on without string lookups: employees and
//! shifts become positions, every (shift, date) pair a shift runs on
//! becomes a [`Slot`], and eligibility is precomputed per employee and
//! slot.

use std::collections::HashMap;

use chrono::{Datelike, Duration, NaiveDate};
use log::warn;

use super::{Placement, Roster};
use crate::models::{Assignment, Employee, RuleLimit, RuleSet, Shift, TimeWindow};

/// A shift on a concrete date.
#[derive(Debug, Clone, PartialEq)]
pub struct Slot {
    /// Index into [`RosterProblem::shifts`].
    pub shift: usize,
    /// Day offset from the horizon start.
    pub day: usize,
    /// Calendar date.
    pub date: NaiveDate,
    /// Occupied interval.
    pub window: TimeWindow,
    /// Employees needed.
    pub headcount: usize,
    /// Whether the date is a Saturday or Sunday.
    pub weekend: bool,
}

impl Slot {
    /// Duration in minutes.
    #[inline]
    pub fn minutes(&self) -> i64 {
        self.window.duration_minutes()
    }
}

/// Indexed rostering problem shared read-only by every algorithm.
#[derive(Debug, Clone)]
pub struct RosterProblem {
    pub employees: Vec<Employee>,
    pub shifts: Vec<Shift>,
    pub rules: RuleSet,
    pub start: NaiveDate,
    pub days: usize,
    pub slots: Vec<Slot>,
    slot_lookup: HashMap<(usize, usize), usize>,
    slots_by_day: Vec<Vec<usize>>,
    eligible: Vec<Vec<bool>>,
    affinity: Vec<Vec<f64>>,
    week_of_day: Vec<usize>,
    weeks: usize,
    min_level: u32,
    employee_lookup: HashMap<String, usize>,
    shift_lookup: HashMap<String, usize>,
}

impl RosterProblem {
    /// Compiles a problem over `[start, end]` (inclusive).
    ///
    /// Inputs are expected to be validated; an inverted range yields an
    /// empty horizon.
    pub fn new(
        employees: Vec<Employee>,
        shifts: Vec<Shift>,
        start: NaiveDate,
        end: NaiveDate,
        rules: RuleSet,
    ) -> Self {
        let days = ((end - start).num_days() + 1).max(0) as usize;
        let dates: Vec<NaiveDate> = (0..days)
            .map(|d| start + Duration::days(d as i64))
            .collect();

        let mut slots = Vec::new();
        let mut slot_lookup = HashMap::new();
        let mut slots_by_day = vec![Vec::new(); days];
        for (day, &date) in dates.iter().enumerate() {
            for (si, shift) in shifts.iter().enumerate() {
                if !shift.applies_on(date) {
                    continue;
                }
                let idx = slots.len();
                slots.push(Slot {
                    shift: si,
                    day,
                    date,
                    window: shift.window_on(date),
                    headcount: shift.required_headcount as usize,
                    weekend: crate::models::is_weekend(date),
                });
                slot_lookup.insert((si, day), idx);
                slots_by_day[day].push(idx);
            }
        }

        let eligible = employees
            .iter()
            .map(|e| {
                slots
                    .iter()
                    .map(|slot| is_eligible(e, &shifts[slot.shift], slot.date, &rules))
                    .collect()
            })
            .collect();

        let affinity = employees
            .iter()
            .map(|e| {
                shifts
                    .iter()
                    .map(|s| {
                        let preferred = if e.prefers(&s.id) { 1.0 } else { 0.0 };
                        0.5 * preferred + 0.5 * e.skill_match(&s.required_skills)
                    })
                    .collect()
            })
            .collect();

        // ISO weeks, numbered from 0 in horizon order.
        let mut week_of_day = Vec::with_capacity(days);
        let mut weeks = 0;
        let mut last_week = None;
        for date in &dates {
            let iso = date.iso_week();
            let key = (iso.year(), iso.week());
            if last_week != Some(key) {
                if last_week.is_some() {
                    weeks += 1;
                }
                last_week = Some(key);
            }
            week_of_day.push(weeks);
        }
        let weeks = if days == 0 { 0 } else { weeks + 1 };

        let min_level = employees
            .iter()
            .map(|e| e.seniority_level.max(1))
            .min()
            .unwrap_or(1);
        let employee_lookup = employees
            .iter()
            .enumerate()
            .map(|(i, e)| (e.id.clone(), i))
            .collect();
        let shift_lookup = shifts
            .iter()
            .enumerate()
            .map(|(i, s)| (s.id.clone(), i))
            .collect();

        Self {
            employees,
            shifts,
            rules,
            start,
            days,
            slots,
            slot_lookup,
            slots_by_day,
            eligible,
            affinity,
            week_of_day,
            weeks,
            min_level,
            employee_lookup,
            shift_lookup,
        }
    }

    /// Number of employees.
    #[inline]
    pub fn num_employees(&self) -> usize {
        self.employees.len()
    }

    /// Total headcount over all slots.
    pub fn total_required(&self) -> usize {
        self.slots.iter().map(|s| s.headcount).sum()
    }

    /// The slot for a shift on a day offset, if the shift runs that day.
    #[inline]
    pub fn slot_of(&self, shift: usize, day: usize) -> Option<usize> {
        self.slot_lookup.get(&(shift, day)).copied()
    }

    /// Slots on a day offset.
    #[inline]
    pub fn slots_on(&self, day: usize) -> &[usize] {
        self.slots_by_day.get(day).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether the employee may take the slot (availability and hard skill rule).
    #[inline]
    pub fn is_eligible(&self, employee: usize, slot: usize) -> bool {
        self.eligible[employee][slot]
    }

    /// Preference and skill affinity of an employee for a shift, in [0, 1].
    #[inline]
    pub fn affinity(&self, employee: usize, shift: usize) -> f64 {
        self.affinity[employee][shift]
    }

    /// Week bucket of a day offset.
    #[inline]
    pub fn week_of(&self, day: usize) -> usize {
        self.week_of_day[day]
    }

    /// Number of week buckets touched by the horizon.
    #[inline]
    pub fn weeks(&self) -> usize {
        self.weeks
    }

    /// Lowest seniority level among employees (cost baseline).
    #[inline]
    pub fn min_level(&self) -> u32 {
        self.min_level
    }

    /// Seniority level of an employee, never below 1.
    #[inline]
    pub fn level(&self, employee: usize) -> u32 {
        self.employees[employee].seniority_level.max(1)
    }

    /// Effective weekly-hours limit for an employee.
    ///
    /// A personal cap only tightens the global one and is always hard.
    pub fn weekly_limit(&self, employee: usize) -> RuleLimit {
        let global = self.rules.max_weekly_hours;
        match self.employees[employee].max_weekly_hours {
            Some(personal) if personal < global.value => RuleLimit::hard(personal),
            Some(_) => RuleLimit {
                value: global.value,
                hard: true,
            },
            None => global,
        }
    }

    /// Share of a slot's headcount that must be filled under MIN_COVERAGE.
    pub fn min_fill(&self, slot: usize) -> usize {
        match self.rules.min_coverage {
            Some(limit) => {
                let need = (self.slots[slot].headcount as f64 * limit.value).ceil() as usize;
                need.min(self.slots[slot].headcount)
            }
            None => self.slots[slot].headcount,
        }
    }

    /// Employee position by id.
    pub fn employee_index(&self, id: &str) -> Option<usize> {
        self.employee_lookup.get(id).copied()
    }

    /// Shift position by id.
    pub fn shift_index(&self, id: &str) -> Option<usize> {
        self.shift_lookup.get(id).copied()
    }

    /// Day offset of a date inside the horizon.
    pub fn day_of(&self, date: NaiveDate) -> Option<usize> {
        let offset = (date - self.start).num_days();
        (offset >= 0 && (offset as usize) < self.days).then_some(offset as usize)
    }

    /// Converts a placement back into an assignment record.
    pub fn assignment(&self, placement: Placement) -> Assignment {
        let slot = &self.slots[placement.slot];
        Assignment::new(
            self.employees[placement.employee].id.clone(),
            self.shifts[slot.shift].id.clone(),
            slot.date,
        )
    }

    /// Converts a roster into assignment records, in placement order.
    pub fn to_assignments(&self, roster: &Roster) -> Vec<Assignment> {
        roster
            .placements()
            .iter()
            .map(|&p| self.assignment(p))
            .collect()
    }

    /// Builds a roster from assignment records.
    ///
    /// Cancelled assignments are dropped. Records naming unknown
    /// employees, unknown shifts, dates outside the horizon or dates the
    /// shift does not run on are skipped with a warning.
    pub fn roster_from(&self, assignments: &[Assignment]) -> Roster {
        let mut roster = Roster::new();
        for a in assignments.iter().filter(|a| a.is_active()) {
            let placement = self.employee_index(&a.employee_id).and_then(|employee| {
                let shift = self.shift_index(&a.shift_id)?;
                let day = self.day_of(a.date)?;
                let slot = self.slot_of(shift, day)?;
                Some(Placement { employee, slot })
            });
            match placement {
                Some(p) => roster.add(p),
                None => warn!(
                    "skipping assignment {}/{}/{}: not part of this problem",
                    a.employee_id, a.shift_id, a.date
                ),
            }
        }
        roster
    }
}

fn is_eligible(employee: &Employee, shift: &Shift, date: NaiveDate, rules: &RuleSet) -> bool {
    if !employee.is_available_on(date) {
        return false;
    }
    match rules.skill_match {
        Some(limit) if limit.hard => shift
            .required_skills
            .iter()
            .all(|s| employee.has_skill(s) && employee.skill_level(s) >= limit.value),
        _ => true,
    }
}

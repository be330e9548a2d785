//! Incremental work ledger.
//!
//! Tracks per-slot fill counts and per-employee working days, weekly
//! minutes and weekend shifts for a roster under construction, so an
//! algorithm can ask "would placing this employee here break a hard
//! rule?" without re-evaluating the whole roster.
//!
//! The ledger must be kept in step with the roster it mirrors: every
//! `Roster::add` pairs with [`WorkLedger::assign`], every removal with
//! [`WorkLedger::unassign`].

use super::{Placement, Roster, RosterProblem};

/// Per-employee and per-slot bookkeeping for legality checks.
#[derive(Debug, Clone)]
pub struct WorkLedger {
    slot_count: Vec<usize>,
    /// employee -> day -> slots worked that day.
    day_slots: Vec<Vec<Vec<usize>>>,
    /// employee -> week bucket -> minutes.
    week_minutes: Vec<Vec<i64>>,
    total_minutes: Vec<i64>,
    weekend_shifts: Vec<usize>,
    assigned: usize,
}

impl WorkLedger {
    /// Creates an empty ledger for a problem.
    pub fn new(problem: &RosterProblem) -> Self {
        let n = problem.num_employees();
        Self {
            slot_count: vec![0; problem.slots.len()],
            day_slots: vec![vec![Vec::new(); problem.days]; n],
            week_minutes: vec![vec![0; problem.weeks()]; n],
            total_minutes: vec![0; n],
            weekend_shifts: vec![0; n],
            assigned: 0,
        }
    }

    /// Builds a ledger mirroring an existing roster.
    pub fn from_roster(problem: &RosterProblem, roster: &Roster) -> Self {
        let mut ledger = Self::new(problem);
        for &p in roster.placements() {
            ledger.assign(problem, p);
        }
        ledger
    }

    /// Records a placement. No legality check is made.
    pub fn assign(&mut self, problem: &RosterProblem, p: Placement) {
        let slot = &problem.slots[p.slot];
        self.slot_count[p.slot] += 1;
        self.day_slots[p.employee][slot.day].push(p.slot);
        self.week_minutes[p.employee][problem.week_of(slot.day)] += slot.minutes();
        self.total_minutes[p.employee] += slot.minutes();
        if slot.weekend {
            self.weekend_shifts[p.employee] += 1;
        }
        self.assigned += 1;
    }

    /// Forgets a placement. Returns `false` if it was not recorded.
    pub fn unassign(&mut self, problem: &RosterProblem, p: Placement) -> bool {
        let slot = &problem.slots[p.slot];
        let worked = &mut self.day_slots[p.employee][slot.day];
        let Some(pos) = worked.iter().position(|&s| s == p.slot) else {
            return false;
        };
        worked.swap_remove(pos);
        self.slot_count[p.slot] -= 1;
        self.week_minutes[p.employee][problem.week_of(slot.day)] -= slot.minutes();
        self.total_minutes[p.employee] -= slot.minutes();
        if slot.weekend {
            self.weekend_shifts[p.employee] -= 1;
        }
        self.assigned -= 1;
        true
    }

    /// Employees currently placed on a slot.
    #[inline]
    pub fn count(&self, slot: usize) -> usize {
        self.slot_count[slot]
    }

    /// Seats still open on a slot.
    #[inline]
    pub fn open_seats(&self, problem: &RosterProblem, slot: usize) -> usize {
        problem.slots[slot].headcount.saturating_sub(self.slot_count[slot])
    }

    /// Total placements recorded.
    #[inline]
    pub fn assigned(&self) -> usize {
        self.assigned
    }

    /// Minutes worked by an employee over the horizon.
    #[inline]
    pub fn workload_minutes(&self, employee: usize) -> i64 {
        self.total_minutes[employee]
    }

    /// Weekend shifts worked by an employee.
    #[inline]
    pub fn weekend_shifts(&self, employee: usize) -> usize {
        self.weekend_shifts[employee]
    }

    /// Whether an employee works on a day offset.
    #[inline]
    pub fn works_on(&self, employee: usize, day: usize) -> bool {
        !self.day_slots[employee][day].is_empty()
    }

    /// Whether an employee is already placed on a slot.
    pub fn holds(&self, problem: &RosterProblem, employee: usize, slot: usize) -> bool {
        self.day_slots[employee][problem.slots[slot].day].contains(&slot)
    }

    /// Length of the working streak that would contain `day` if it were worked.
    fn streak_through(&self, employee: usize, day: usize, days: usize) -> usize {
        let left = (0..day)
            .rev()
            .take_while(|&d| self.works_on(employee, d))
            .count();
        let right = (day + 1..days)
            .take_while(|&d| self.works_on(employee, d))
            .count();
        left + 1 + right
    }

    /// Number of hard-rule breaches placing `employee` on `slot` would add.
    ///
    /// Counts eligibility, capacity, duplicate and same-day conflicts,
    /// overlaps, rest periods between working days, consecutive-day,
    /// weekly-hours and daily-hours limits. Soft rules never count.
    pub fn conflicts_if_assigned(
        &self,
        problem: &RosterProblem,
        employee: usize,
        slot: usize,
    ) -> usize {
        let rules = &problem.rules;
        let target = &problem.slots[slot];
        let day = target.day;
        let mut conflicts = 0;

        if !problem.is_eligible(employee, slot) {
            conflicts += 1;
        }
        if self.slot_count[slot] >= target.headcount {
            conflicts += 1;
        }
        if self.holds(problem, employee, slot) {
            conflicts += 1;
        }
        if !rules.allow_split_shifts && self.works_on(employee, day) {
            conflicts += 1;
        }

        let rest = rules.rest_minutes();
        let reach = rest_reach_days(rest);
        let lo = day.saturating_sub(reach);
        let hi = (day + reach).min(problem.days.saturating_sub(1));
        for d in lo..=hi {
            for &other in &self.day_slots[employee][d] {
                if other == slot {
                    continue;
                }
                let window = &problem.slots[other].window;
                if window.overlaps(&target.window) {
                    conflicts += 1;
                } else if rules.min_rest_hours.hard
                    && d != day
                    && target.window.gap_minutes(window) < rest
                {
                    conflicts += 1;
                }
            }
        }

        if rules.max_consecutive_days.hard
            && !self.works_on(employee, day)
            && self.streak_through(employee, day, problem.days)
                > rules.consecutive_day_cap() as usize
        {
            conflicts += 1;
        }

        let weekly = problem.weekly_limit(employee);
        let week_total = self.week_minutes[employee][problem.week_of(day)] + target.minutes();
        if weekly.hard && week_total as f64 > weekly.value * 60.0 + 1e-9 {
            conflicts += 1;
        }

        if let Some(daily) = rules.max_daily_hours.filter(|l| l.hard) {
            let day_total: i64 = self.day_slots[employee][day]
                .iter()
                .map(|&s| problem.slots[s].minutes())
                .sum::<i64>()
                + target.minutes();
            if day_total as f64 > daily.value * 60.0 + 1e-9 {
                conflicts += 1;
            }
        }

        conflicts
    }

    /// Whether placing `employee` on `slot` keeps every hard rule.
    #[inline]
    pub fn can_assign(&self, problem: &RosterProblem, employee: usize, slot: usize) -> bool {
        self.conflicts_if_assigned(problem, employee, slot) == 0
    }

    /// Employees that may legally take a seat on `slot`.
    pub fn legal_candidates(&self, problem: &RosterProblem, slot: usize) -> Vec<usize> {
        (0..problem.num_employees())
            .filter(|&e| self.can_assign(problem, e, slot))
            .collect()
    }

    /// Whether at least one employee may legally take a seat on `slot`.
    pub fn has_legal_candidate(&self, problem: &RosterProblem, slot: usize) -> bool {
        (0..problem.num_employees()).any(|e| self.can_assign(problem, e, slot))
    }
}

/// Days either side of a shift that can hold a shift closer than `rest`
/// minutes. A shift ends before the second midnight after its start date.
fn rest_reach_days(rest: i64) -> usize {
    let days = (rest.max(0) + 1439) / 1440;
    (days as usize + 1).max(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::ConstraintEvaluator;
    use crate::models::{Constraint, Employee, RuleSet, Shift};
    use chrono::NaiveDate;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn problem(employees: usize, constraints: &[Constraint]) -> RosterProblem {
        RosterProblem::new(
            (0..employees).map(|i| Employee::new(format!("E{i}"))).collect(),
            vec![Shift::from_hours("DAY", 8, 16), Shift::from_hours("LATE", 16, 24)],
            date(1),
            date(14),
            RuleSet::from_constraints(constraints),
        )
    }

    #[test]
    fn test_assign_and_unassign() {
        let p = problem(2, &[]);
        let mut ledger = WorkLedger::new(&p);
        let slot = p.slot_of(0, 5).unwrap(); // Saturday
        ledger.assign(&p, Placement::new(0, slot));

        assert_eq!(ledger.count(slot), 1);
        assert_eq!(ledger.open_seats(&p, slot), 0);
        assert_eq!(ledger.workload_minutes(0), 480);
        assert_eq!(ledger.weekend_shifts(0), 1);
        assert!(ledger.works_on(0, 5));

        assert!(ledger.unassign(&p, Placement::new(0, slot)));
        assert!(!ledger.unassign(&p, Placement::new(0, slot)));
        assert_eq!(ledger.assigned(), 0);
        assert_eq!(ledger.workload_minutes(0), 0);
    }

    #[test]
    fn test_capacity_and_same_day() {
        let p = problem(2, &[]);
        let mut ledger = WorkLedger::new(&p);
        let day = p.slot_of(0, 0).unwrap();
        let late = p.slot_of(1, 0).unwrap();
        ledger.assign(&p, Placement::new(0, day));

        assert!(!ledger.can_assign(&p, 1, day)); // full
        assert!(!ledger.can_assign(&p, 0, late)); // second shift same day
        assert!(ledger.can_assign(&p, 1, late));
    }

    #[test]
    fn test_split_shifts_allowed() {
        let p = problem(1, &[Constraint::allow_split_shifts(), Constraint::min_rest_hours(0.0)]);
        let mut ledger = WorkLedger::new(&p);
        ledger.assign(&p, Placement::new(0, p.slot_of(0, 0).unwrap()));
        assert!(ledger.can_assign(&p, 0, p.slot_of(1, 0).unwrap()));
    }

    #[test]
    fn test_rest_period() {
        let p = problem(1, &[]);
        let mut ledger = WorkLedger::new(&p);
        // LATE ends at midnight; DAY next morning starts 8h later.
        ledger.assign(&p, Placement::new(0, p.slot_of(1, 0).unwrap()));
        assert_eq!(ledger.conflicts_if_assigned(&p, 0, p.slot_of(0, 1).unwrap()), 1);
        assert!(ledger.can_assign(&p, 0, p.slot_of(1, 1).unwrap()));
    }

    #[test]
    fn test_long_rest_reaches_past_two_days() {
        let p = problem(1, &[Constraint::min_rest_hours(70.0)]);
        let mut ledger = WorkLedger::new(&p);
        ledger.assign(&p, Placement::new(0, p.slot_of(0, 0).unwrap()));
        // DAY on day 0 to DAY on day 3 leaves 64 h; day 4 leaves 88 h.
        assert!(!ledger.can_assign(&p, 0, p.slot_of(0, 3).unwrap()));
        assert!(ledger.can_assign(&p, 0, p.slot_of(0, 4).unwrap()));
        assert_eq!(rest_reach_days(11 * 60), 2);
        assert_eq!(rest_reach_days(70 * 60), 4);
    }

    #[test]
    fn test_legal_placements_stay_feasible() {
        let p = RosterProblem::new(
            vec![Employee::new("E1"), Employee::new("E2")],
            vec![Shift::from_hours("DAY", 8, 16)],
            date(1),
            date(7),
            RuleSet::from_constraints(&[Constraint::min_rest_hours(70.0)]),
        );
        let evaluator = ConstraintEvaluator::new(&p);
        let mut ledger = WorkLedger::new(&p);
        let mut roster = Roster::new();
        for day in 0..p.days {
            let slot = p.slot_of(0, day).unwrap();
            if let Some(&employee) = ledger.legal_candidates(&p, slot).first() {
                let placement = Placement::new(employee, slot);
                ledger.assign(&p, placement);
                roster.add(placement);
                assert_eq!(evaluator.tally(&roster).hard, 0, "after {placement:?}");
            }
        }
        assert_eq!(roster.len(), 4);
    }

    #[test]
    fn test_consecutive_days() {
        let p = problem(1, &[Constraint::max_consecutive_days(3)]);
        let mut ledger = WorkLedger::new(&p);
        for day in 0..3 {
            ledger.assign(&p, Placement::new(0, p.slot_of(0, day).unwrap()));
        }
        assert!(!ledger.can_assign(&p, 0, p.slot_of(0, 3).unwrap()));
        assert!(ledger.can_assign(&p, 0, p.slot_of(0, 4).unwrap()));
        // Filling day 4 would bridge two streaks into one of length 5.
        ledger.assign(&p, Placement::new(0, p.slot_of(0, 4).unwrap()));
        assert!(!ledger.can_assign(&p, 0, p.slot_of(0, 3).unwrap()));
    }

    #[test]
    fn test_weekly_hours() {
        let p = problem(1, &[Constraint::max_weekly_hours(16.0)]);
        let mut ledger = WorkLedger::new(&p);
        ledger.assign(&p, Placement::new(0, p.slot_of(0, 0).unwrap()));
        ledger.assign(&p, Placement::new(0, p.slot_of(0, 2).unwrap()));
        assert!(!ledger.can_assign(&p, 0, p.slot_of(0, 4).unwrap()));
        // Next ISO week starts on day 7.
        assert!(ledger.can_assign(&p, 0, p.slot_of(0, 7).unwrap()));
    }

    #[test]
    fn test_legal_candidates() {
        let p = problem(3, &[]);
        let mut ledger = WorkLedger::from_roster(
            &p,
            &Roster::from_placements(vec![Placement::new(0, p.slot_of(0, 0).unwrap())]),
        );
        let late = p.slot_of(1, 0).unwrap();
        assert_eq!(ledger.legal_candidates(&p, late), vec![1, 2]);
        ledger.assign(&p, Placement::new(1, late));
        assert!(!ledger.has_legal_candidate(&p, late));
    }
}

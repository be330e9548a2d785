//! Rostering constraints.
//!
//! A request carries a list of [`Constraint`]s, each naming a rule kind,
//! whether it is hard (a violation makes the roster unacceptable) or soft
//! (a violation only lowers the score), and a numeric parameter.
//!
//! The list is compiled into a [`RuleSet`] with one slot per rule kind.
//! Kinds missing from the list fall back to workplace defaults:
//!
//! | Rule | Default |
//! |------|---------|
//! | Max consecutive days | 6, hard |
//! | Min rest between shifts | 11 h, hard |
//! | Max weekly hours | 48 h, hard |
//! | Skill match | hard, any proficiency |
//! | Capacity | always hard |
//!
//! # Reference
//! Ernst et al. (2004), "Staff scheduling and rostering: A review of
//! applications, methods and models"

use serde::{Deserialize, Serialize};

/// Rule kinds understood by the evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConstraintKind {
    /// No employee works more than `value` consecutive calendar days.
    MaxConsecutiveDays,
    /// At least `value` hours between the end of one shift and the next.
    MinRestHours,
    /// At most `value` hours per employee per ISO week.
    MaxWeeklyHours,
    /// At most `value` hours per employee per calendar day.
    MaxDailyHours,
    /// Assignees hold every required skill at proficiency >= `value`.
    SkillMatch,
    /// Assigned count per slot never exceeds its headcount.
    Capacity,
    /// Weekend shifts per employee differ by at most `value`.
    WeekendBalance,
    /// Each slot is filled to at least `value` (0..=1) of its headcount.
    MinCoverage,
    /// Employees may work several non-overlapping shifts on one date.
    AllowSplitShifts,
}

impl ConstraintKind {
    /// Stable upper-case name.
    pub fn name(&self) -> &'static str {
        match self {
            ConstraintKind::MaxConsecutiveDays => "MAX_CONSECUTIVE_DAYS",
            ConstraintKind::MinRestHours => "MIN_REST_HOURS",
            ConstraintKind::MaxWeeklyHours => "MAX_WEEKLY_HOURS",
            ConstraintKind::MaxDailyHours => "MAX_DAILY_HOURS",
            ConstraintKind::SkillMatch => "SKILL_MATCH",
            ConstraintKind::Capacity => "CAPACITY",
            ConstraintKind::WeekendBalance => "WEEKEND_BALANCE",
            ConstraintKind::MinCoverage => "MIN_COVERAGE",
            ConstraintKind::AllowSplitShifts => "ALLOW_SPLIT_SHIFTS",
        }
    }
}

impl std::fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A rostering constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    /// Constraint identifier.
    pub id: String,
    /// Rule kind.
    pub kind: ConstraintKind,
    /// Hard (mandatory) or soft (scored).
    pub hard: bool,
    /// Numeric parameter. Booleans use 1.0 / 0.0.
    pub value: f64,
}

impl Constraint {
    /// Creates a hard constraint.
    pub fn hard(id: impl Into<String>, kind: ConstraintKind, value: f64) -> Self {
        Self {
            id: id.into(),
            kind,
            hard: true,
            value,
        }
    }

    /// Creates a soft constraint.
    pub fn soft(id: impl Into<String>, kind: ConstraintKind, value: f64) -> Self {
        Self {
            id: id.into(),
            kind,
            hard: false,
            value,
        }
    }

    /// Hard cap on consecutive working days.
    pub fn max_consecutive_days(days: u32) -> Self {
        Self::hard("max-consecutive-days", ConstraintKind::MaxConsecutiveDays, days as f64)
    }

    /// Hard minimum rest between shifts.
    pub fn min_rest_hours(hours: f64) -> Self {
        Self::hard("min-rest-hours", ConstraintKind::MinRestHours, hours)
    }

    /// Hard weekly-hours cap.
    pub fn max_weekly_hours(hours: f64) -> Self {
        Self::hard("max-weekly-hours", ConstraintKind::MaxWeeklyHours, hours)
    }

    /// Hard daily-hours cap.
    pub fn max_daily_hours(hours: f64) -> Self {
        Self::hard("max-daily-hours", ConstraintKind::MaxDailyHours, hours)
    }

    /// Permits several non-overlapping shifts per employee and date.
    pub fn allow_split_shifts() -> Self {
        Self::hard("allow-split-shifts", ConstraintKind::AllowSplitShifts, 1.0)
    }
}

/// A compiled numeric rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RuleLimit {
    /// Rule parameter.
    pub value: f64,
    /// Whether a breach is a hard violation.
    pub hard: bool,
}

impl RuleLimit {
    /// Creates a hard limit.
    pub fn hard(value: f64) -> Self {
        Self { value, hard: true }
    }

    /// Creates a soft limit.
    pub fn soft(value: f64) -> Self {
        Self { value, hard: false }
    }
}

/// The effective rule set for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    pub max_consecutive_days: RuleLimit,
    pub min_rest_hours: RuleLimit,
    pub max_weekly_hours: RuleLimit,
    pub max_daily_hours: Option<RuleLimit>,
    pub skill_match: Option<RuleLimit>,
    pub weekend_balance: Option<RuleLimit>,
    pub min_coverage: Option<RuleLimit>,
    pub allow_split_shifts: bool,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            max_consecutive_days: RuleLimit::hard(6.0),
            min_rest_hours: RuleLimit::hard(11.0),
            max_weekly_hours: RuleLimit::hard(48.0),
            max_daily_hours: None,
            skill_match: Some(RuleLimit::hard(0.0)),
            weekend_balance: None,
            min_coverage: None,
            allow_split_shifts: false,
        }
    }
}

impl RuleSet {
    /// Compiles a constraint list over the defaults.
    ///
    /// When a kind appears more than once, the last entry wins. CAPACITY
    /// entries carry no parameter and are accepted only as hard rules
    /// (input validation rejects soft ones).
    pub fn from_constraints(constraints: &[Constraint]) -> Self {
        let mut rules = Self::default();
        for c in constraints {
            let limit = RuleLimit {
                value: c.value,
                hard: c.hard,
            };
            match c.kind {
                ConstraintKind::MaxConsecutiveDays => rules.max_consecutive_days = limit,
                ConstraintKind::MinRestHours => rules.min_rest_hours = limit,
                ConstraintKind::MaxWeeklyHours => rules.max_weekly_hours = limit,
                ConstraintKind::MaxDailyHours => rules.max_daily_hours = Some(limit),
                ConstraintKind::SkillMatch => rules.skill_match = Some(limit),
                ConstraintKind::WeekendBalance => rules.weekend_balance = Some(limit),
                ConstraintKind::MinCoverage => rules.min_coverage = Some(limit),
                ConstraintKind::AllowSplitShifts => rules.allow_split_shifts = c.value != 0.0,
                ConstraintKind::Capacity => {}
            }
        }
        rules
    }

    /// Longest permitted streak of working days.
    pub fn consecutive_day_cap(&self) -> u32 {
        self.max_consecutive_days.value.max(0.0).floor() as u32
    }

    /// Minimum rest in minutes.
    pub fn rest_minutes(&self) -> i64 {
        (self.min_rest_hours.value * 60.0).round() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let rules = RuleSet::from_constraints(&[]);
        assert_eq!(rules.consecutive_day_cap(), 6);
        assert!(rules.max_consecutive_days.hard);
        assert_eq!(rules.rest_minutes(), 660);
        assert!((rules.max_weekly_hours.value - 48.0).abs() < 1e-10);
        assert!(rules.max_daily_hours.is_none());
        assert!(!rules.allow_split_shifts);
    }

    #[test]
    fn test_overrides() {
        let rules = RuleSet::from_constraints(&[
            Constraint::max_consecutive_days(3),
            Constraint::soft("rest", ConstraintKind::MinRestHours, 12.0),
            Constraint::max_daily_hours(10.0),
            Constraint::allow_split_shifts(),
        ]);
        assert_eq!(rules.consecutive_day_cap(), 3);
        assert!(!rules.min_rest_hours.hard);
        assert_eq!(rules.rest_minutes(), 720);
        assert_eq!(rules.max_daily_hours, Some(RuleLimit::hard(10.0)));
        assert!(rules.allow_split_shifts);
    }

    #[test]
    fn test_last_entry_wins() {
        let rules = RuleSet::from_constraints(&[
            Constraint::max_weekly_hours(40.0),
            Constraint::max_weekly_hours(38.0),
        ]);
        assert!((rules.max_weekly_hours.value - 38.0).abs() < 1e-10);
    }

    #[test]
    fn test_kind_serde_names() {
        let json = serde_json::to_string(&ConstraintKind::MaxConsecutiveDays).unwrap();
        assert_eq!(json, "\"MAX_CONSECUTIVE_DAYS\"");
        let kind: ConstraintKind = serde_json::from_str("\"WEEKEND_BALANCE\"").unwrap();
        assert_eq!(kind, ConstraintKind::WeekendBalance);
        assert_eq!(kind.to_string(), "WEEKEND_BALANCE");
    }
}

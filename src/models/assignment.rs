//! Assignment and violation models.
//!
//! An assignment places one employee on one shift on one date. A
//! violation records a rule breach detected in a set of assignments.
//!
//! # Uniqueness
//! At most one non-cancelled assignment exists per (employee, date)
//! unless split shifts are allowed, in which case same-day assignments
//! must still not overlap in time.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Lifecycle status of an assignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignmentStatus {
    /// Produced by the engine, not yet confirmed.
    #[default]
    Scheduled,
    /// Confirmed by the employee or a manager.
    Confirmed,
    /// Withdrawn. Ignored by every check.
    Cancelled,
}

/// An employee-shift-date assignment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Assignment {
    /// Assigned employee ID.
    pub employee_id: String,
    /// Assigned shift ID.
    pub shift_id: String,
    /// Date the shift starts on.
    pub date: NaiveDate,
    /// Lifecycle status.
    #[serde(default)]
    pub status: AssignmentStatus,
}

impl Assignment {
    /// Creates a scheduled assignment.
    pub fn new(employee_id: impl Into<String>, shift_id: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            employee_id: employee_id.into(),
            shift_id: shift_id.into(),
            date,
            status: AssignmentStatus::Scheduled,
        }
    }

    /// Sets the status.
    pub fn with_status(mut self, status: AssignmentStatus) -> Self {
        self.status = status;
        self
    }

    /// Whether the assignment takes part in evaluation.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.status != AssignmentStatus::Cancelled
    }
}

/// Classification of rule breaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationType {
    /// An employee works two overlapping shifts.
    Overlap,
    /// An employee works two shifts on one date without split shifts.
    DuplicateDay,
    /// A slot has more assignees than its headcount.
    CapacityExceeded,
    /// A streak of working days is longer than allowed.
    ConsecutiveDays,
    /// Too little rest between two shifts.
    RestPeriod,
    /// Too many hours in an ISO week.
    WeeklyHours,
    /// Too many hours on one date.
    DailyHours,
    /// An assignee lacks a required skill.
    SkillMismatch,
    /// An employee is assigned on a date they are not available.
    Unavailable,
    /// A slot is filled below the required share of its headcount.
    UnderCoverage,
    /// Weekend shifts are spread unevenly across employees.
    WeekendImbalance,
}

impl ViolationType {
    /// Stable upper-case name.
    pub fn name(&self) -> &'static str {
        match self {
            ViolationType::Overlap => "OVERLAP",
            ViolationType::DuplicateDay => "DUPLICATE_DAY",
            ViolationType::CapacityExceeded => "CAPACITY_EXCEEDED",
            ViolationType::ConsecutiveDays => "CONSECUTIVE_DAYS",
            ViolationType::RestPeriod => "REST_PERIOD",
            ViolationType::WeeklyHours => "WEEKLY_HOURS",
            ViolationType::DailyHours => "DAILY_HOURS",
            ViolationType::SkillMismatch => "SKILL_MISMATCH",
            ViolationType::Unavailable => "UNAVAILABLE",
            ViolationType::UnderCoverage => "UNDER_COVERAGE",
            ViolationType::WeekendImbalance => "WEEKEND_IMBALANCE",
        }
    }
}

impl std::fmt::Display for ViolationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A detected rule breach.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    /// Type of violation.
    pub violation_type: ViolationType,
    /// Whether the breached rule is hard.
    pub hard: bool,
    /// Severity 1 (minor) to 5 (critical).
    pub severity: u8,
    /// Affected employee, if the breach is per employee.
    pub employee_id: Option<String>,
    /// Affected shift, if the breach is per slot.
    pub shift_id: Option<String>,
    /// Date the breach is reported on.
    pub date: Option<NaiveDate>,
    /// Human-readable description.
    pub message: String,
    /// Assignments involved in the breach.
    pub offending: Vec<Assignment>,
}

impl Violation {
    /// Creates a violation without location details.
    pub fn new(violation_type: ViolationType, hard: bool, message: impl Into<String>) -> Self {
        Self {
            violation_type,
            hard,
            severity: 3,
            employee_id: None,
            shift_id: None,
            date: None,
            message: message.into(),
            offending: Vec::new(),
        }
    }

    /// Sets the severity (clamped to 1..=5).
    pub fn with_severity(mut self, severity: u8) -> Self {
        self.severity = severity.clamp(1, 5);
        self
    }

    /// Sets the affected employee.
    pub fn for_employee(mut self, employee_id: impl Into<String>) -> Self {
        self.employee_id = Some(employee_id.into());
        self
    }

    /// Sets the affected shift.
    pub fn for_shift(mut self, shift_id: impl Into<String>) -> Self {
        self.shift_id = Some(shift_id.into());
        self
    }

    /// Sets the reported date.
    pub fn on(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Attaches the offending assignments.
    pub fn with_offending(mut self, offending: Vec<Assignment>) -> Self {
        self.offending = offending;
        self
    }

    /// Severe violations (severity >= 3) are the ones a planner must fix.
    #[inline]
    pub fn is_severe(&self) -> bool {
        self.severity >= 3
    }
}

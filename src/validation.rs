//! Input validation for rostering problems.
//!
//! Checks structural integrity of employees, shifts, the horizon and the
//! constraint list before any search starts. Every problem is collected;
//! callers get the full list rather than the first failure.
//!
//! Detects:
//! - Missing employees or shifts
//! - Inverted or overlong horizons
//! - Duplicate IDs
//! - Zero headcount or zero-length shifts
//! - Dangling preferred-shift references
//! - Out-of-range constraint values

use std::collections::HashSet;

use chrono::NaiveDate;

use crate::models::{Constraint, ConstraintKind, Employee, Shift};

/// Longest horizon a single run may cover.
pub const MAX_HORIZON_DAYS: i64 = 366;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// No employees in scope.
    NoEmployees,
    /// No shifts in scope.
    NoShifts,
    /// End date before start date.
    InvalidDateRange,
    /// Horizon longer than [`MAX_HORIZON_DAYS`].
    HorizonTooLong,
    /// Two entities share the same ID.
    DuplicateId,
    /// A shift needs zero employees.
    InvalidHeadcount,
    /// A shift starts and ends at the same time.
    InvalidDuration,
    /// An employee has seniority level 0.
    InvalidSeniority,
    /// A preferred shift does not exist.
    UnknownShiftReference,
    /// A constraint value is negative, non-finite or out of range.
    InvalidConstraint,
    /// A tuning parameter is out of range.
    ParameterOutOfRange,
    /// Objective weights are negative or the hard penalty does not dominate.
    InvalidWeights,
}

impl ValidationError {
    /// Creates a validation error.
    pub fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates employees, shifts and the horizon.
///
/// Checks:
/// 1. At least one employee and one shift
/// 2. `end >= start` and the horizon is at most 366 days
/// 3. No duplicate employee or shift IDs
/// 4. Every shift needs at least one employee and has non-zero length
/// 5. Every employee has seniority >= 1
/// 6. Preferred shifts refer to known shifts
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_input(
    employees: &[Employee],
    shifts: &[Shift],
    start: NaiveDate,
    end: NaiveDate,
) -> ValidationResult {
    let mut errors = Vec::new();

    if employees.is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::NoEmployees,
            "No employees available for scheduling",
        ));
    }
    if shifts.is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::NoShifts,
            "No shifts available for scheduling",
        ));
    }

    if end < start {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidDateRange,
            format!("End date {end} is before start date {start}"),
        ));
    } else if (end - start).num_days() + 1 > MAX_HORIZON_DAYS {
        errors.push(ValidationError::new(
            ValidationErrorKind::HorizonTooLong,
            format!("Horizon {start}..{end} exceeds {MAX_HORIZON_DAYS} days"),
        ));
    }

    let mut shift_ids = HashSet::new();
    for s in shifts {
        if !shift_ids.insert(s.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate shift ID: {}", s.id),
            ));
        }
        if s.required_headcount == 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidHeadcount,
                format!("Shift '{}' requires zero employees", s.id),
            ));
        }
        if s.duration_minutes() == 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidDuration,
                format!("Shift '{}' has zero length", s.id),
            ));
        }
    }

    let mut employee_ids = HashSet::new();
    for e in employees {
        if !employee_ids.insert(e.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate employee ID: {}", e.id),
            ));
        }
        if e.seniority_level == 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidSeniority,
                format!("Employee '{}' has seniority level 0", e.id),
            ));
        }
        for pref in &e.preferred_shifts {
            if !shift_ids.contains(pref.as_str()) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::UnknownShiftReference,
                    format!("Employee '{}' prefers unknown shift '{}'", e.id, pref),
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validates constraint values.
///
/// Values must be finite and non-negative. Day counts must be at least 1,
/// MIN_COVERAGE must lie in [0, 1] and CAPACITY cannot be soft.
pub fn validate_constraints(constraints: &[Constraint]) -> ValidationResult {
    let mut errors = Vec::new();

    for c in constraints {
        if !c.value.is_finite() || c.value < 0.0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidConstraint,
                format!(
                    "Constraint '{}' ({}) has invalid value {}",
                    c.id, c.kind, c.value
                ),
            ));
            continue;
        }
        match c.kind {
            ConstraintKind::Capacity if !c.hard => {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidConstraint,
                    format!("Constraint '{}': CAPACITY cannot be soft", c.id),
                ));
            }
            ConstraintKind::MaxConsecutiveDays if c.value < 1.0 => {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidConstraint,
                    format!("Constraint '{}': MAX_CONSECUTIVE_DAYS must be >= 1", c.id),
                ));
            }
            ConstraintKind::MinCoverage | ConstraintKind::SkillMatch if c.value > 1.0 => {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidConstraint,
                    format!("Constraint '{}': {} must be within [0, 1]", c.id, c.kind),
                ));
            }
            _ => {}
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn sample_employees() -> Vec<Employee> {
        vec![
            Employee::new("E1").with_preferred_shift("DAY"),
            Employee::new("E2"),
        ]
    }

    fn sample_shifts() -> Vec<Shift> {
        vec![
            Shift::from_hours("DAY", 8, 16),
            Shift::from_hours("NIGHT", 22, 6),
        ]
    }

    #[test]
    fn test_valid_input() {
        assert!(validate_input(&sample_employees(), &sample_shifts(), date(1), date(7)).is_ok());
    }

    #[test]
    fn test_single_day_horizon() {
        assert!(validate_input(&sample_employees(), &sample_shifts(), date(3), date(3)).is_ok());
    }

    #[test]
    fn test_empty_inputs() {
        let errors = validate_input(&[], &[], date(1), date(7)).unwrap_err();
        assert!(errors.iter().any(|e| e.kind == ValidationErrorKind::NoEmployees));
        assert!(errors.iter().any(|e| e.kind == ValidationErrorKind::NoShifts));
    }

    #[test]
    fn test_inverted_range() {
        let errors =
            validate_input(&sample_employees(), &sample_shifts(), date(7), date(1)).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::InvalidDateRange));
    }

    #[test]
    fn test_horizon_too_long() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let errors = validate_input(&sample_employees(), &sample_shifts(), start, end).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::HorizonTooLong));
    }

    #[test]
    fn test_duplicate_ids() {
        let employees = vec![Employee::new("E1"), Employee::new("E1")];
        let shifts = vec![Shift::from_hours("S", 8, 16), Shift::from_hours("S", 9, 17)];
        let errors = validate_input(&employees, &shifts, date(1), date(2)).unwrap_err();
        assert_eq!(
            errors
                .iter()
                .filter(|e| e.kind == ValidationErrorKind::DuplicateId)
                .count(),
            2
        );
    }

    #[test]
    fn test_bad_shift_and_employee_fields() {
        let employees = vec![Employee::new("E1")
            .with_seniority(0)
            .with_preferred_shift("GHOST")];
        let shifts = vec![Shift::from_hours("S", 8, 8).with_headcount(0)];
        let errors = validate_input(&employees, &shifts, date(1), date(2)).unwrap_err();
        let kinds: Vec<_> = errors.iter().map(|e| e.kind.clone()).collect();
        assert!(kinds.contains(&ValidationErrorKind::InvalidHeadcount));
        assert!(kinds.contains(&ValidationErrorKind::InvalidDuration));
        assert!(kinds.contains(&ValidationErrorKind::InvalidSeniority));
        assert!(kinds.contains(&ValidationErrorKind::UnknownShiftReference));
    }

    #[test]
    fn test_constraint_values() {
        assert!(validate_constraints(&[
            Constraint::max_consecutive_days(3),
            Constraint::min_rest_hours(11.0),
        ])
        .is_ok());

        let errors = validate_constraints(&[
            Constraint::min_rest_hours(-1.0),
            Constraint::max_weekly_hours(f64::NAN),
            Constraint::soft("cap", ConstraintKind::Capacity, 0.0),
            Constraint::max_consecutive_days(0),
            Constraint::hard("cov", ConstraintKind::MinCoverage, 1.5),
        ])
        .unwrap_err();
        assert_eq!(errors.len(), 5);
        assert!(errors
            .iter()
            .all(|e| e.kind == ValidationErrorKind::InvalidConstraint));
    }
}

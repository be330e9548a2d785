//! Schedule request model.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{AlgorithmKind, Assignment, Constraint, Employee, Shift, SolverParams};

/// Optional department/team filter for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scope {
    /// Restrict to one department.
    pub department_id: Option<String>,
    /// Restrict to one team.
    pub team_id: Option<String>,
}

impl Scope {
    /// Scope covering everything.
    pub fn all() -> Self {
        Self::default()
    }

    /// Scope restricted to a department.
    pub fn department(department_id: impl Into<String>) -> Self {
        Self {
            department_id: Some(department_id.into()),
            team_id: None,
        }
    }

    /// Further restricts to a team.
    pub fn with_team(mut self, team_id: impl Into<String>) -> Self {
        self.team_id = Some(team_id.into());
        self
    }

    /// Whether an employee belongs to this scope.
    pub fn includes_employee(&self, employee: &Employee) -> bool {
        let dept_ok = self
            .department_id
            .as_ref()
            .map_or(true, |d| employee.department_id.as_ref() == Some(d));
        let team_ok = self
            .team_id
            .as_ref()
            .map_or(true, |t| employee.team_id.as_ref() == Some(t));
        dept_ok && team_ok
    }

    /// Whether a shift belongs to this scope. Shifts without a department are shared.
    pub fn includes_shift(&self, shift: &Shift) -> bool {
        match (&self.department_id, &shift.department_id) {
            (Some(scope), Some(own)) => scope == own,
            _ => true,
        }
    }

    /// Run-lock key for this scope over a period.
    pub fn lock_key(&self, start: NaiveDate, end: NaiveDate) -> String {
        format!(
            "{}/{}:{start}..{end}",
            self.department_id.as_deref().unwrap_or("*"),
            self.team_id.as_deref().unwrap_or("*"),
        )
    }
}

/// A request to produce a roster.
///
/// Constructed once per invocation and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRequest {
    /// First rostered date (inclusive).
    pub start_date: NaiveDate,
    /// Last rostered date (inclusive).
    pub end_date: NaiveDate,
    /// Department/team filter applied to the roster source.
    #[serde(default)]
    pub scope: Scope,
    /// Algorithm family.
    #[serde(default)]
    pub algorithm: AlgorithmKind,
    /// Rules on top of the defaults.
    #[serde(default)]
    pub constraints: Vec<Constraint>,
    /// Tuning parameters.
    #[serde(default)]
    pub params: SolverParams,
    /// Existing roster to re-optimize (heuristic repair) and to compare against.
    #[serde(default)]
    pub initial_assignments: Vec<Assignment>,
    /// Persist a successful result through the assignment sink.
    #[serde(default)]
    pub apply: bool,
}

impl ScheduleRequest {
    /// Creates a request over `[start_date, end_date]` with defaults.
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            start_date,
            end_date,
            scope: Scope::default(),
            algorithm: AlgorithmKind::default(),
            constraints: Vec::new(),
            params: SolverParams::default(),
            initial_assignments: Vec::new(),
            apply: false,
        }
    }

    /// Sets the algorithm.
    pub fn with_algorithm(mut self, algorithm: AlgorithmKind) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Sets the scope.
    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    /// Adds a constraint.
    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Sets the parameters.
    pub fn with_params(mut self, params: SolverParams) -> Self {
        self.params = params;
        self
    }

    /// Sets the roster to re-optimize.
    pub fn with_initial_assignments(mut self, assignments: Vec<Assignment>) -> Self {
        self.initial_assignments = assignments;
        self
    }

    /// Enables apply mode.
    pub fn applying(mut self) -> Self {
        self.apply = true;
        self
    }

    /// Number of days in the horizon (0 if the range is inverted).
    pub fn horizon_days(&self) -> i64 {
        ((self.end_date - self.start_date).num_days() + 1).max(0)
    }

    /// Run-lock key for this request.
    pub fn lock_key(&self) -> String {
        self.scope.lock_key(self.start_date, self.end_date)
    }
}

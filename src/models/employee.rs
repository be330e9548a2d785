//! Employee model.
//!
//! Employees are the workers placed onto shifts. Each employee carries
//! skills with proficiency levels, a seniority level, an employment
//! category and an availability window. Employees are immutable for
//! the duration of a run.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::Availability;

/// An employee that can be assigned to shifts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    /// Unique employee identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Skills with proficiency levels.
    pub skills: Vec<Skill>,
    /// Seniority level (1 = junior). Also the cost-rate proxy.
    pub seniority_level: u32,
    /// Full-time or part-time contract.
    pub category: EmploymentCategory,
    /// Dates and weekdays on which the employee can work.
    pub availability: Availability,
    /// Shift IDs the employee prefers to work.
    pub preferred_shifts: Vec<String>,
    /// Personal weekly-hours cap. Tightens (never loosens) the global cap.
    pub max_weekly_hours: Option<f64>,
    /// Owning department, used for request scoping.
    pub department_id: Option<String>,
    /// Owning team, used for request scoping.
    pub team_id: Option<String>,
}

/// Employment contract category.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmploymentCategory {
    #[default]
    FullTime,
    PartTime,
}

/// A skill with proficiency level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    /// Skill name (e.g., "cashier", "forklift", "first-aid").
    pub name: String,
    /// Proficiency level (0.0 to 1.0, where 1.0 = expert).
    pub level: f64,
}

impl Skill {
    /// Creates a new skill. The level is clamped into [0, 1].
    pub fn new(name: impl Into<String>, level: f64) -> Self {
        Self {
            name: name.into(),
            level: level.clamp(0.0, 1.0),
        }
    }
}

impl Employee {
    /// Creates a full-time employee with seniority level 1.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            skills: Vec::new(),
            seniority_level: 1,
            category: EmploymentCategory::FullTime,
            availability: Availability::always(),
            preferred_shifts: Vec::new(),
            max_weekly_hours: None,
            department_id: None,
            team_id: None,
        }
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Adds a skill.
    pub fn with_skill(mut self, name: impl Into<String>, level: f64) -> Self {
        self.skills.push(Skill::new(name, level));
        self
    }

    /// Sets the seniority level.
    pub fn with_seniority(mut self, level: u32) -> Self {
        self.seniority_level = level;
        self
    }

    /// Sets the employment category.
    pub fn with_category(mut self, category: EmploymentCategory) -> Self {
        self.category = category;
        self
    }

    /// Marks the employee as part-time.
    pub fn part_time(self) -> Self {
        self.with_category(EmploymentCategory::PartTime)
    }

    /// Sets the availability window.
    pub fn with_availability(mut self, availability: Availability) -> Self {
        self.availability = availability;
        self
    }

    /// Blocks a single date (leave, holiday).
    pub fn with_day_off(mut self, date: NaiveDate) -> Self {
        self.availability.blocked_dates.insert(date);
        self
    }

    /// Adds a preferred shift.
    pub fn with_preferred_shift(mut self, shift_id: impl Into<String>) -> Self {
        self.preferred_shifts.push(shift_id.into());
        self
    }

    /// Sets a personal weekly-hours cap.
    pub fn with_max_weekly_hours(mut self, hours: f64) -> Self {
        self.max_weekly_hours = Some(hours);
        self
    }

    /// Sets the department.
    pub fn in_department(mut self, department_id: impl Into<String>) -> Self {
        self.department_id = Some(department_id.into());
        self
    }

    /// Sets the team.
    pub fn in_team(mut self, team_id: impl Into<String>) -> Self {
        self.team_id = Some(team_id.into());
        self
    }

    /// Whether this employee has a given skill.
    pub fn has_skill(&self, name: &str) -> bool {
        self.skills.iter().any(|s| s.name == name)
    }

    /// Returns the proficiency level for a skill (0.0 if not found).
    pub fn skill_level(&self, name: &str) -> f64 {
        self.skills
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.level)
            .unwrap_or(0.0)
    }

    /// Required skills this employee lacks.
    pub fn missing_skills<'a>(&self, required: &'a [String]) -> Vec<&'a str> {
        required
            .iter()
            .filter(|r| !self.has_skill(r))
            .map(|r| r.as_str())
            .collect()
    }

    /// Mean proficiency over the required skills (1.0 if none are required).
    pub fn skill_match(&self, required: &[String]) -> f64 {
        if required.is_empty() {
            return 1.0;
        }
        let total: f64 = required.iter().map(|r| self.skill_level(r)).sum();
        total / required.len() as f64
    }

    /// Whether the employee prefers the given shift.
    pub fn prefers(&self, shift_id: &str) -> bool {
        self.preferred_shifts.iter().any(|s| s == shift_id)
    }

    /// Whether the employee can work on the given date.
    pub fn is_available_on(&self, date: NaiveDate) -> bool {
        self.availability.is_available_on(date)
    }
}

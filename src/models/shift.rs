//! Shift model.
//!
//! A shift is a recurring work period (e.g., "Day 08:00-16:00") that
//! needs a number of employees on every date it applies to. A shift on
//! a concrete date is a *slot*; assignments fill slots.
//!
//! Times are wall-clock `NaiveTime`. An end time before the start time
//! means the shift crosses midnight.

use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use super::TimeWindow;

const MINUTES_PER_DAY: i64 = 24 * 60;

/// A shift definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shift {
    /// Unique shift identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Start time of day.
    pub start: NaiveTime,
    /// End time of day. Earlier than `start` = ends on the next day.
    pub end: NaiveTime,
    /// Employees needed per date.
    pub required_headcount: u32,
    /// Construction priority (higher = filled first). Also a tie-break.
    pub priority: i32,
    /// Skills every assignee must have.
    pub required_skills: Vec<String>,
    /// Weekdays the shift runs on. Empty = every day.
    pub weekdays: Vec<Weekday>,
    /// Owning department, used for request scoping.
    pub department_id: Option<String>,
}

impl Shift {
    /// Creates a shift needing one employee.
    pub fn new(id: impl Into<String>, start: NaiveTime, end: NaiveTime) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            start,
            end,
            required_headcount: 1,
            priority: 0,
            required_skills: Vec::new(),
            weekdays: Vec::new(),
            department_id: None,
        }
    }

    /// Convenience constructor from whole hours (`end_hour` 24 = midnight).
    ///
    /// Out-of-range hours are wrapped into 0..24.
    pub fn from_hours(id: impl Into<String>, start_hour: u32, end_hour: u32) -> Self {
        let at = |h: u32| NaiveTime::from_hms_opt(h % 24, 0, 0).unwrap_or(NaiveTime::MIN);
        Self::new(id, at(start_hour), at(end_hour))
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the required headcount.
    pub fn with_headcount(mut self, headcount: u32) -> Self {
        self.required_headcount = headcount;
        self
    }

    /// Sets the priority.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Adds a required skill.
    pub fn with_required_skill(mut self, skill: impl Into<String>) -> Self {
        self.required_skills.push(skill.into());
        self
    }

    /// Restricts the shift to the given weekdays.
    pub fn on_weekdays(mut self, weekdays: Vec<Weekday>) -> Self {
        self.weekdays = weekdays;
        self
    }

    /// Sets the department.
    pub fn in_department(mut self, department_id: impl Into<String>) -> Self {
        self.department_id = Some(department_id.into());
        self
    }

    /// Duration in minutes. A shift ending before it starts wraps past midnight.
    pub fn duration_minutes(&self) -> i64 {
        let raw = (self.end - self.start).num_minutes();
        if raw < 0 {
            raw + MINUTES_PER_DAY
        } else {
            raw
        }
    }

    /// Duration in hours.
    #[inline]
    pub fn duration_hours(&self) -> f64 {
        self.duration_minutes() as f64 / 60.0
    }

    /// Whether the shift ends on the day after it starts.
    pub fn crosses_midnight(&self) -> bool {
        self.end < self.start
    }

    /// Whether the shift runs on `date`.
    pub fn applies_on(&self, date: NaiveDate) -> bool {
        self.weekdays.is_empty() || self.weekdays.contains(&date.weekday())
    }

    /// The concrete interval this shift occupies when worked on `date`.
    pub fn window_on(&self, date: NaiveDate) -> TimeWindow {
        let start = date.and_time(self.start);
        TimeWindow::new(start, start + Duration::minutes(self.duration_minutes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shift_duration() {
        let day = Shift::from_hours("DAY", 8, 16);
        assert_eq!(day.duration_minutes(), 480);
        assert!((day.duration_hours() - 8.0).abs() < 1e-10);
        assert!(!day.crosses_midnight());
    }

    #[test]
    fn test_overnight_shift() {
        let night = Shift::from_hours("NIGHT", 22, 6);
        assert_eq!(night.duration_minutes(), 480);
        assert!(night.crosses_midnight());

        let d = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let w = night.window_on(d);
        assert_eq!(w.start.date(), d);
        assert_eq!(w.end.date(), d.succ_opt().unwrap());
        assert_eq!(w.duration_minutes(), 480);
    }

    #[test]
    fn test_shift_ending_at_midnight() {
        let late = Shift::from_hours("LATE", 16, 24);
        assert_eq!(late.duration_minutes(), 480);
    }

    #[test]
    fn test_applies_on() {
        let weekend = Shift::from_hours("W", 9, 17).on_weekdays(vec![Weekday::Sat, Weekday::Sun]);
        let sat = NaiveDate::from_ymd_opt(2024, 1, 6).unwrap();
        let mon = NaiveDate::from_ymd_opt(2024, 1, 8).unwrap();
        assert!(weekend.applies_on(sat));
        assert!(!weekend.applies_on(mon));
        assert!(Shift::from_hours("ANY", 9, 17).applies_on(mon));
    }

    #[test]
    fn test_builder() {
        let s = Shift::from_hours("S1", 7, 15)
            .with_name("Early")
            .with_headcount(3)
            .with_priority(2)
            .with_required_skill("first-aid")
            .in_department("ward-a");
        assert_eq!(s.required_headcount, 3);
        assert_eq!(s.priority, 2);
        assert_eq!(s.required_skills, vec!["first-aid".to_string()]);
        assert_eq!(s.department_id.as_deref(), Some("ward-a"));
    }
}

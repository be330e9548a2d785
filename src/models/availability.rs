//! Availability and time window models.
//!
//! Defines when an employee can be rostered (date window, blocked dates,
//! allowed weekdays) and the concrete date-time interval a shift occupies.
//!
//! # Precedence
//! Blocked dates override everything. A date is available iff:
//! - It lies inside the optional `[from, until]` window, AND
//! - Its weekday is allowed (empty list = every weekday), AND
//! - It is NOT listed in `blocked_dates`.

use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};

/// A date-time interval [start, end).
///
/// Half-open interval: includes start, excludes end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Interval start (inclusive).
    pub start: NaiveDateTime,
    /// Interval end (exclusive).
    pub end: NaiveDateTime,
}

impl TimeWindow {
    /// Creates a new time window.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    /// Duration of this window in minutes.
    #[inline]
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// Whether a timestamp falls within this window.
    #[inline]
    pub fn contains(&self, at: NaiveDateTime) -> bool {
        at >= self.start && at < self.end
    }

    /// Whether two windows overlap.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Length of the overlap with another window in minutes (0 if disjoint).
    pub fn overlap_minutes(&self, other: &Self) -> i64 {
        if !self.overlaps(other) {
            return 0;
        }
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (end - start).num_minutes()
    }

    /// Idle time between two disjoint windows in minutes (0 if they overlap).
    pub fn gap_minutes(&self, other: &Self) -> i64 {
        if self.overlaps(other) {
            return 0;
        }
        if self.end <= other.start {
            (other.start - self.end).num_minutes()
        } else {
            (self.start - other.end).num_minutes()
        }
    }
}

/// Employee availability.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Availability {
    /// First available date (inclusive). `None` = open.
    pub from: Option<NaiveDate>,
    /// Last available date (inclusive). `None` = open.
    pub until: Option<NaiveDate>,
    /// Weekdays the employee works. Empty = every weekday.
    pub weekdays: Vec<Weekday>,
    /// Dates the employee is unavailable (leave, holidays).
    pub blocked_dates: BTreeSet<NaiveDate>,
}

impl Availability {
    /// Availability without restrictions.
    pub fn always() -> Self {
        Self::default()
    }

    /// Restricts availability to a date window.
    pub fn between(from: NaiveDate, until: NaiveDate) -> Self {
        Self {
            from: Some(from),
            until: Some(until),
            ..Self::default()
        }
    }

    /// Restricts to the given weekdays.
    pub fn with_weekdays(mut self, weekdays: Vec<Weekday>) -> Self {
        self.weekdays = weekdays;
        self
    }

    /// Adds a blocked date.
    pub fn with_blocked(mut self, date: NaiveDate) -> Self {
        self.blocked_dates.insert(date);
        self
    }

    /// Whether the employee can work on `date`.
    pub fn is_available_on(&self, date: NaiveDate) -> bool {
        if self.blocked_dates.contains(&date) {
            return false;
        }
        if self.from.is_some_and(|from| date < from) {
            return false;
        }
        if self.until.is_some_and(|until| date > until) {
            return false;
        }
        self.weekdays.is_empty() || self.weekdays.contains(&date.weekday())
    }
}

/// Whether a date falls on Saturday or Sunday.
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_time(NaiveTime::from_hms_opt(hour, 0, 0).unwrap())
    }

    #[test]
    fn test_time_window_basics() {
        let w = TimeWindow::new(at(1, 8), at(1, 16));
        assert_eq!(w.duration_minutes(), 480);
        assert!(w.contains(at(1, 8)));
        assert!(w.contains(at(1, 15)));
        assert!(!w.contains(at(1, 16)));
    }

    #[test]
    fn test_overlap_and_gap() {
        let a = TimeWindow::new(at(1, 8), at(1, 16));
        let b = TimeWindow::new(at(1, 12), at(1, 20));
        let c = TimeWindow::new(at(2, 6), at(2, 14));

        assert!(a.overlaps(&b));
        assert_eq!(a.overlap_minutes(&b), 240);
        assert_eq!(a.gap_minutes(&b), 0);

        assert!(!b.overlaps(&c));
        assert_eq!(b.gap_minutes(&c), 600);
        assert_eq!(c.gap_minutes(&b), 600);
    }

    #[test]
    fn test_adjacent_windows_do_not_overlap() {
        let a = TimeWindow::new(at(1, 8), at(1, 16));
        let b = TimeWindow::new(at(1, 16), at(1, 23));
        assert!(!a.overlaps(&b));
        assert_eq!(a.gap_minutes(&b), 0);
    }

    #[test]
    fn test_availability_rules() {
        let mon = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(); // Monday
        let tue = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let next_mon = NaiveDate::from_ymd_opt(2024, 1, 8).unwrap();

        let av = Availability::between(mon, tue);
        assert!(av.is_available_on(mon));
        assert!(av.is_available_on(tue));
        assert!(!av.is_available_on(next_mon));

        let weekdays_only = Availability::always().with_weekdays(vec![Weekday::Mon]);
        assert!(weekdays_only.is_available_on(mon));
        assert!(!weekdays_only.is_available_on(tue));

        let blocked = Availability::always().with_blocked(mon);
        assert!(!blocked.is_available_on(mon));
        assert!(blocked.is_available_on(tue));
    }

    #[test]
    fn test_is_weekend() {
        let sat = NaiveDate::from_ymd_opt(2024, 1, 6).unwrap();
        let sun = NaiveDate::from_ymd_opt(2024, 1, 7).unwrap();
        let mon = NaiveDate::from_ymd_opt(2024, 1, 8).unwrap();
        assert!(is_weekend(sat));
        assert!(is_weekend(sun));
        assert!(!is_weekend(mon));
    }
}

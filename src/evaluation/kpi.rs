//! Roster quality metrics (KPIs).
//!
//! Computes workforce indicators from a roster and the problem it was
//! built for.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Total hours | Sum of shift durations over all placements |
//! | Avg hours | Total hours / number of employees |
//! | Utilization | Fraction of employees with at least one shift |
//! | Coverage | Filled share of required headcount, capped per slot |
//! | Weekend load | Saturday/Sunday shifts per employee |
//!
//! # Reference
//! Ernst et al. (2004), "Staff scheduling and rostering: A review of
//! applications, methods and models"

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::EmploymentCategory;
use crate::roster::{Roster, RosterProblem};

/// Roster performance indicators.
///
/// All durations are in hours.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RosterKpi {
    /// Number of placements.
    pub total_assignments: usize,
    /// Sum of shift durations.
    pub total_hours: f64,
    /// Hours per employee id (employees without shifts included at 0).
    pub hours_by_employee: BTreeMap<String, f64>,
    /// Mean hours per employee.
    pub avg_hours_per_employee: f64,
    /// Fraction of employees with at least one shift (0.0..1.0).
    pub utilization: f64,
    /// Filled share of required headcount (0.0..1.0).
    pub coverage_rate: f64,
    /// Weekend shifts per employee id.
    pub weekend_shifts_by_employee: BTreeMap<String, usize>,
    /// Hours split by employment category.
    pub hours_by_category: BTreeMap<EmploymentCategory, f64>,
}

impl RosterKpi {
    /// Computes KPIs for a roster.
    ///
    /// # Arguments
    /// * `problem` - The compiled problem the roster belongs to.
    /// * `roster` - The roster to measure.
    pub fn calculate(problem: &RosterProblem, roster: &Roster) -> Self {
        let n = problem.num_employees();
        let mut hours = vec![0.0f64; n];
        let mut weekend = vec![0usize; n];
        let mut shifts = vec![0usize; n];
        let mut per_slot = vec![0usize; problem.slots.len()];

        for pl in roster.placements() {
            let slot = &problem.slots[pl.slot];
            hours[pl.employee] += slot.minutes() as f64 / 60.0;
            if slot.weekend {
                weekend[pl.employee] += 1;
            }
            shifts[pl.employee] += 1;
            per_slot[pl.slot] += 1;
        }

        let mut hours_by_category = BTreeMap::new();
        for (e, employee) in problem.employees.iter().enumerate() {
            *hours_by_category.entry(employee.category).or_insert(0.0) += hours[e];
        }

        let total_hours: f64 = hours.iter().sum();
        let working = shifts.iter().filter(|&&s| s > 0).count();

        let required = problem.total_required();
        let covered: usize = per_slot
            .iter()
            .zip(&problem.slots)
            .map(|(&count, slot)| count.min(slot.headcount))
            .sum();

        Self {
            total_assignments: roster.len(),
            total_hours,
            hours_by_employee: problem
                .employees
                .iter()
                .zip(&hours)
                .map(|(e, &h)| (e.id.clone(), h))
                .collect(),
            avg_hours_per_employee: if n == 0 { 0.0 } else { total_hours / n as f64 },
            utilization: if n == 0 {
                0.0
            } else {
                working as f64 / n as f64
            },
            coverage_rate: if required == 0 {
                1.0
            } else {
                covered as f64 / required as f64
            },
            weekend_shifts_by_employee: problem
                .employees
                .iter()
                .zip(&weekend)
                .map(|(e, &w)| (e.id.clone(), w))
                .collect(),
            hours_by_category,
        }
    }

    /// Whether the roster meets the given quality thresholds.
    pub fn meets_thresholds(&self, min_coverage: f64, min_utilization: f64) -> bool {
        self.coverage_rate >= min_coverage && self.utilization >= min_utilization
    }

    /// Largest difference in hours between two employees.
    pub fn hours_spread(&self) -> f64 {
        let max = self.hours_by_employee.values().copied().fold(f64::MIN, f64::max);
        let min = self.hours_by_employee.values().copied().fold(f64::MAX, f64::min);
        if self.hours_by_employee.is_empty() {
            0.0
        } else {
            max - min
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Employee, RuleSet, Shift};
    use crate::roster::Placement;
    use chrono::NaiveDate;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn problem() -> RosterProblem {
        RosterProblem::new(
            vec![
                Employee::new("E1"),
                Employee::new("E2").part_time(),
                Employee::new("E3"),
            ],
            vec![Shift::from_hours("DAY", 8, 16).with_headcount(2)],
            // Fri..Sun
            date(5),
            date(7),
            RuleSet::default(),
        )
    }

    #[test]
    fn test_kpi_basic() {
        let p = problem();
        let roster = Roster::from_placements(vec![
            Placement::new(0, 0),
            Placement::new(1, 0),
            Placement::new(0, 1),
        ]);
        let kpi = RosterKpi::calculate(&p, &roster);
        assert_eq!(kpi.total_assignments, 3);
        assert!((kpi.total_hours - 24.0).abs() < 1e-10);
        assert!((kpi.hours_by_employee["E1"] - 16.0).abs() < 1e-10);
        assert!((kpi.hours_by_employee["E3"] - 0.0).abs() < 1e-10);
        assert!((kpi.avg_hours_per_employee - 8.0).abs() < 1e-10);
        assert!((kpi.utilization - 2.0 / 3.0).abs() < 1e-10);
        // 3 of 6 seats.
        assert!((kpi.coverage_rate - 0.5).abs() < 1e-10);
    }

    #[test]
    fn test_kpi_weekend_and_category() {
        let p = problem();
        // Day 1 is Saturday.
        let roster = Roster::from_placements(vec![Placement::new(0, 1), Placement::new(1, 2)]);
        let kpi = RosterKpi::calculate(&p, &roster);
        assert_eq!(kpi.weekend_shifts_by_employee["E1"], 1);
        assert_eq!(kpi.weekend_shifts_by_employee["E2"], 1);
        assert_eq!(kpi.weekend_shifts_by_employee["E3"], 0);
        assert!((kpi.hours_by_category[&EmploymentCategory::FullTime] - 8.0).abs() < 1e-10);
        assert!((kpi.hours_by_category[&EmploymentCategory::PartTime] - 8.0).abs() < 1e-10);
    }

    #[test]
    fn test_kpi_coverage_capped_per_slot() {
        let p = problem();
        let roster = Roster::from_placements(vec![
            Placement::new(0, 0),
            Placement::new(1, 0),
            Placement::new(2, 0),
        ]);
        let kpi = RosterKpi::calculate(&p, &roster);
        assert!((kpi.coverage_rate - 2.0 / 6.0).abs() < 1e-10);
    }

    #[test]
    fn test_kpi_empty() {
        let kpi = RosterKpi::calculate(&problem(), &Roster::new());
        assert_eq!(kpi.total_assignments, 0);
        assert!((kpi.utilization - 0.0).abs() < 1e-10);
        assert!((kpi.coverage_rate - 0.0).abs() < 1e-10);
        assert!((kpi.hours_spread() - 0.0).abs() < 1e-10);
    }

    #[test]
    fn test_meets_thresholds() {
        let p = problem();
        let roster = Roster::from_placements(vec![Placement::new(0, 0), Placement::new(1, 0)]);
        let kpi = RosterKpi::calculate(&p, &roster);
        assert!(kpi.meets_thresholds(0.3, 0.5));
        assert!(!kpi.meets_thresholds(0.5, 0.5));
        assert!(!kpi.meets_thresholds(0.0, 0.9));
        assert!((kpi.hours_spread() - 8.0).abs() < 1e-10);
    }
}

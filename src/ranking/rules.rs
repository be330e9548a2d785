//! Built-in ranking rules.
//!
//! # Categories
//!
//! - **Load**: LEAST_WORKLOAD, FEWEST_WEEKENDS
//! - **Fit**: BEST_PREFERENCE
//! - **Seniority / cost**: HIGHEST_SENIORITY, LOWEST_COST
//!
//! # Score Convention
//! All rules return lower scores for better candidates.

use super::{RankScore, RankingContext, RankingRule};

/// Least minutes worked so far.
///
/// Spreads hours evenly, which drives the fairness term.
#[derive(Debug, Clone, Copy)]
pub struct LeastWorkload;

impl RankingRule for LeastWorkload {
    fn name(&self) -> &'static str {
        "LEAST_WORKLOAD"
    }

    fn evaluate(&self, employee: usize, context: &RankingContext<'_>) -> RankScore {
        context.ledger.workload_minutes(employee) as f64
    }

    fn description(&self) -> &'static str {
        "Least Workload"
    }
}

/// Highest preference and skill affinity for the shift.
#[derive(Debug, Clone, Copy)]
pub struct BestPreference;

impl RankingRule for BestPreference {
    fn name(&self) -> &'static str {
        "BEST_PREFERENCE"
    }

    fn evaluate(&self, employee: usize, context: &RankingContext<'_>) -> RankScore {
        -context.problem.affinity(employee, context.target().shift)
    }

    fn description(&self) -> &'static str {
        "Best Preference"
    }
}

/// Highest seniority level first.
#[derive(Debug, Clone, Copy)]
pub struct HighestSeniority;

impl RankingRule for HighestSeniority {
    fn name(&self) -> &'static str {
        "HIGHEST_SENIORITY"
    }

    fn evaluate(&self, employee: usize, context: &RankingContext<'_>) -> RankScore {
        -(context.problem.level(employee) as f64)
    }

    fn description(&self) -> &'static str {
        "Highest Seniority"
    }
}

/// Cheapest seat: seniority level x shift hours.
#[derive(Debug, Clone, Copy)]
pub struct LowestCost;

impl RankingRule for LowestCost {
    fn name(&self) -> &'static str {
        "LOWEST_COST"
    }

    fn evaluate(&self, employee: usize, context: &RankingContext<'_>) -> RankScore {
        context.problem.level(employee) as f64 * context.target().minutes() as f64 / 60.0
    }

    fn description(&self) -> &'static str {
        "Lowest Cost"
    }
}

/// Fewest weekend shifts so far; neutral on weekdays.
#[derive(Debug, Clone, Copy)]
pub struct FewestWeekends;

impl RankingRule for FewestWeekends {
    fn name(&self) -> &'static str {
        "FEWEST_WEEKENDS"
    }

    fn evaluate(&self, employee: usize, context: &RankingContext<'_>) -> RankScore {
        if context.target().weekend {
            context.ledger.weekend_shifts(employee) as f64
        } else {
            0.0
        }
    }

    fn description(&self) -> &'static str {
        "Fewest Weekend Shifts"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Employee, RuleSet, Shift};
    use crate::roster::{Placement, RosterProblem, WorkLedger};
    use chrono::NaiveDate;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn problem() -> RosterProblem {
        RosterProblem::new(
            vec![
                Employee::new("E1").with_seniority(1),
                Employee::new("E2")
                    .with_seniority(4)
                    .with_preferred_shift("DAY"),
            ],
            vec![Shift::from_hours("DAY", 8, 16)],
            // Fri..Sun
            date(5),
            date(7),
            RuleSet::default(),
        )
    }

    #[test]
    fn test_least_workload() {
        let p = problem();
        let mut ledger = WorkLedger::new(&p);
        ledger.assign(&p, Placement::new(1, 0));
        let ctx = RankingContext::new(&p, &ledger, 1);
        assert!(LeastWorkload.evaluate(0, &ctx) < LeastWorkload.evaluate(1, &ctx));
        assert!((ctx.mean_workload() - 240.0).abs() < 1e-10);
    }

    #[test]
    fn test_best_preference_and_seniority() {
        let p = problem();
        let ledger = WorkLedger::new(&p);
        let ctx = RankingContext::new(&p, &ledger, 0);
        assert!(BestPreference.evaluate(1, &ctx) < BestPreference.evaluate(0, &ctx));
        assert!(HighestSeniority.evaluate(1, &ctx) < HighestSeniority.evaluate(0, &ctx));
        assert!(LowestCost.evaluate(0, &ctx) < LowestCost.evaluate(1, &ctx));
        assert!((LowestCost.evaluate(1, &ctx) - 32.0).abs() < 1e-10);
    }

    #[test]
    fn test_fewest_weekends() {
        let p = problem();
        let mut ledger = WorkLedger::new(&p);
        // Slot 1 is Saturday.
        ledger.assign(&p, Placement::new(0, 1));
        let weekday = RankingContext::new(&p, &ledger, 0);
        assert_eq!(FewestWeekends.evaluate(0, &weekday), 0.0);
        let sunday = RankingContext::new(&p, &ledger, 2);
        assert!(FewestWeekends.evaluate(1, &sunday) < FewestWeekends.evaluate(0, &sunday));
    }
}

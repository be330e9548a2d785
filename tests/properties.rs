use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use proptest::prelude::*;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use u_roster::control::RunControl;
use u_roster::engine::{MemorySource, ScheduleEngine};
use u_roster::evaluation::ObjectiveScorer;
use u_roster::ga::{GeneticOptimizer, RosterGaProblem};
use u_roster::greedy::{GreedyConstructor, LocalSearch};
use u_roster::models::{
    AlgorithmKind, Constraint, Employee, ObjectiveWeights, RuleSet, RunStatus, ScheduleRequest,
    Shift, SolverParams,
};
use u_roster::repair::RepairEngine;
use u_roster::roster::{Placement, Roster, RosterProblem};

fn date(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
}

fn employees(n: usize) -> Vec<Employee> {
    (1..=n).map(|i| Employee::new(format!("E{i}"))).collect()
}

fn shifts() -> Vec<Shift> {
    vec![
        Shift::from_hours("DAY", 8, 16),
        Shift::from_hours("NIGHT", 20, 4),
    ]
}

fn week_problem() -> RosterProblem {
    RosterProblem::new(employees(5), shifts(), date(1), date(7), RuleSet::default())
}

fn engine(n: usize) -> ScheduleEngine {
    ScheduleEngine::new(Arc::new(MemorySource::new(employees(n), shifts())))
}

fn placements() -> impl Strategy<Value = Vec<(usize, usize)>> {
    prop::collection::vec((0usize..5, 0usize..14), 0..30)
}

fn roster_of(pairs: &[(usize, usize)]) -> Roster {
    Roster::from_placements(pairs.iter().map(|&(e, s)| Placement::new(e, s)).collect())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn scoring_is_deterministic(pairs in placements()) {
        let problem = week_problem();
        let scorer = ObjectiveScorer::new(&problem, ObjectiveWeights::default());
        let roster = roster_of(&pairs);
        prop_assert_eq!(scorer.score(&roster), scorer.score(&roster.clone()));
        let report = scorer.evaluator().evaluate(&roster);
        prop_assert_eq!(report.hard_count, scorer.score_with_hard(&roster).1);
    }

    #[test]
    fn local_search_never_lowers_the_score(pairs in placements(), seed in any::<u64>()) {
        let problem = week_problem();
        let params = SolverParams::default();
        let control = RunControl::unlimited();
        let scorer = ObjectiveScorer::new(&problem, params.weights);
        let start = roster_of(&pairs);
        let initial = scorer.score(&start);
        let mut rng = SmallRng::seed_from_u64(seed);
        let result = LocalSearch::new(scorer, &params, &control).improve(start, &mut rng);
        prop_assert!(result.score >= initial);
        prop_assert!(result.history.windows(2).all(|w| w[1] >= w[0]));
    }

    #[test]
    fn repair_is_idempotent_once_converged(pairs in placements()) {
        let problem = week_problem();
        let params = SolverParams::default();
        let control = RunControl::unlimited();
        let scorer = ObjectiveScorer::new(&problem, params.weights);
        let repair = RepairEngine::new(scorer, &params, &control);
        let first = repair.repair(roster_of(&pairs));
        prop_assume!(first.converged);
        let second = repair.repair(first.roster.clone());
        prop_assert_eq!(second.roster, first.roster);
        prop_assert_eq!(second.score, first.score);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn genetic_best_never_decreases(seed in any::<u64>()) {
        let problem = week_problem();
        let params = SolverParams::default()
            .with_population_size(20)
            .with_max_generations(15);
        let control = RunControl::unlimited();
        let scorer = ObjectiveScorer::new(&problem, params.weights);
        let mut rng = SmallRng::seed_from_u64(seed);
        let outcome = GeneticOptimizer::new(RosterGaProblem::new(scorer), &params, &control)
            .run(&mut rng);
        prop_assert!(outcome.history.windows(2).all(|w| w[1] >= w[0]));
    }

    #[test]
    fn success_results_are_feasible(seed in any::<u64>(), algorithm in 0usize..4) {
        let algorithm = [
            AlgorithmKind::Backtrack,
            AlgorithmKind::Genetic,
            AlgorithmKind::Greedy,
            AlgorithmKind::Heuristic,
        ][algorithm];
        let request = ScheduleRequest::new(date(1), date(7))
            .with_algorithm(algorithm)
            .with_params(
                SolverParams::default()
                    .with_seed(seed)
                    .with_population_size(20)
                    .with_max_generations(10),
            );
        let result = engine(5).run(&request).unwrap();
        if result.status == RunStatus::Success {
            prop_assert_eq!(result.statistics.hard_violations, 0);
            prop_assert!(result.violations.iter().all(|v| !v.hard));
        }
    }
}

#[test]
fn test_backtrack_fills_every_seat() {
    let request = ScheduleRequest::new(date(1), date(7))
        .with_algorithm(AlgorithmKind::Backtrack)
        .with_params(SolverParams::default().with_seed(42));
    let result = engine(5).run(&request).unwrap();
    assert_eq!(result.status, RunStatus::Success);
    assert_eq!(result.assignments.len(), 14);
    assert!((result.statistics.coverage_rate - 1.0).abs() < 1e-9);
}

#[test]
fn test_consecutive_day_cap_is_respected() {
    let request = ScheduleRequest::new(date(1), date(7))
        .with_algorithm(AlgorithmKind::Backtrack)
        .with_constraint(Constraint::max_consecutive_days(3))
        .with_params(SolverParams::default().with_seed(42));
    let result = engine(5).run(&request).unwrap();
    assert_eq!(result.status, RunStatus::Success);

    let mut days: BTreeMap<&str, Vec<NaiveDate>> = BTreeMap::new();
    for a in &result.assignments {
        days.entry(a.employee_id.as_str()).or_default().push(a.date);
    }
    for (employee, mut worked) in days {
        worked.sort();
        worked.dedup();
        let mut streak = 1;
        for pair in worked.windows(2) {
            streak = if (pair[1] - pair[0]).num_days() == 1 { streak + 1 } else { 1 };
            assert!(streak <= 3, "{employee} works {streak} days in a row");
        }
    }
}

#[test]
fn test_large_genetic_run_respects_deadline() {
    let request = ScheduleRequest::new(date(1), date(7))
        .with_algorithm(AlgorithmKind::Genetic)
        .with_params(SolverParams::default().with_seed(42).with_time_limit_ms(1));
    let result = engine(500).run(&request).unwrap();
    assert!(
        matches!(result.status, RunStatus::TimedOut | RunStatus::Success),
        "unexpected status {}",
        result.status
    );
}

#[test]
fn test_greedy_construction_then_search_is_feasible() {
    let problem = week_problem();
    let params = SolverParams::default();
    let control = RunControl::unlimited();
    let scorer = ObjectiveScorer::new(&problem, params.weights);
    let mut rng = SmallRng::seed_from_u64(42);
    let start = GreedyConstructor::new(&problem).construct(&mut rng);
    let result = LocalSearch::new(scorer, &params, &control).improve(start, &mut rng);
    assert_eq!(scorer.score_with_hard(&result.roster).1, 0);
}

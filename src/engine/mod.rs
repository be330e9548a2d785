//! Execution controller.
//!
//! [`ScheduleEngine`] turns a [`ScheduleRequest`] into a
//! [`ScheduleResult`]:
//!
//! 1. Load employees and shifts for the request scope.
//! 2. Validate input, constraints and parameters (fail fast).
//! 3. Take the run lock for (scope, period), if a lock is configured.
//! 4. Run the selected algorithm under a [`RunControl`] carrying the stop
//!    flag, the pause gate and the wall-clock deadline.
//! 5. Score, evaluate and summarize the best roster.
//! 6. In apply mode, persist a successful roster. A sink failure lands in
//!    [`ScheduleResult::persist_error`]; the roster and statistics are kept.
//!
//! [`ScheduleEngine::validate`] runs steps 1 and 2 and evaluates the
//! request's initial assignments without searching.
//!
//! Panics inside an algorithm are caught at the algorithm boundary and
//! reported as status ERROR; they never reach the caller.
//!
//! # Status mapping
//!
//! | Algorithm ended | Best roster | Status |
//! |-----------------|-------------|--------|
//! | naturally | free of hard violations | SUCCESS |
//! | naturally | missing or infeasible | NO_SOLUTION |
//! | search exhausted | partial | NO_SOLUTION |
//! | deadline | finished and feasible | SUCCESS |
//! | deadline | otherwise | TIMED_OUT |
//! | stop request | any | STOPPED |

mod handle;
mod ports;

pub use handle::{RunHandle, RunState};
pub use ports::{AssignmentSink, LocalRunLock, MemorySink, MemorySource, RosterSource, RunLock};

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{error, info, warn};
use parking_lot::Mutex;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::backtrack::BacktrackSearch;
use crate::control::{ProgressSink, RunControl, SearchOutcome, Termination};
use crate::error::{EngineError, Result};
use crate::evaluation::{ConstraintEvaluator, ObjectiveScorer, RosterKpi, ViolationReport};
use crate::ga::{GeneticOptimizer, RosterGaProblem};
use crate::greedy::GreedySolver;
use crate::models::{
    AlgorithmKind, Employee, RuleSet, RunStatus, ScheduleRequest, ScheduleResult,
    ScheduleStatistics, Shift,
};
use crate::repair::RepairEngine;
use crate::roster::RosterProblem;
use crate::validation::{validate_constraints, validate_input};
use ports::LockGuard;

/// A validated request ready to run.
struct PreparedRun {
    problem: RosterProblem,
    request: ScheduleRequest,
    _lock: Option<LockGuard>,
}

/// Runs rostering requests against the configured ports.
#[derive(Clone)]
pub struct ScheduleEngine {
    source: Arc<dyn RosterSource>,
    sink: Option<Arc<dyn AssignmentSink>>,
    lock: Option<Arc<dyn RunLock>>,
    progress: Option<Arc<dyn ProgressSink>>,
}

impl ScheduleEngine {
    /// Creates an engine reading reference data from `source`.
    pub fn new(source: Arc<dyn RosterSource>) -> Self {
        Self {
            source,
            sink: None,
            lock: None,
            progress: None,
        }
    }

    /// Sets the sink used in apply mode.
    pub fn with_sink(mut self, sink: Arc<dyn AssignmentSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Sets the run lock.
    pub fn with_lock(mut self, lock: Arc<dyn RunLock>) -> Self {
        self.lock = Some(lock);
        self
    }

    /// Sets the progress receiver.
    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Runs a request on the calling thread.
    pub fn run(&self, request: &ScheduleRequest) -> Result<ScheduleResult> {
        let prepared = self.prepare(request.clone())?;
        let control = self.control_for(&prepared.request);
        let result = solve(&prepared, &control);
        Ok(self.apply(&prepared.request, result))
    }

    /// Starts a request on a worker thread.
    ///
    /// Loading, validation and locking happen before this returns, so
    /// those errors surface here rather than from [`RunHandle::join`].
    pub fn start(&self, request: ScheduleRequest) -> Result<RunHandle> {
        let prepared = self.prepare(request)?;
        let control = Arc::new(self.control_for(&prepared.request));
        let state = Arc::new(Mutex::new(RunState::Initialized));

        let engine = self.clone();
        let worker_control = Arc::clone(&control);
        let worker_state = Arc::clone(&state);
        *state.lock() = RunState::Running;
        let worker = thread::Builder::new()
            .name("u-roster-run".into())
            .spawn(move || {
                let result = solve(&prepared, &worker_control);
                *worker_state.lock() = RunState::from_status(result.status);
                Ok(engine.apply(&prepared.request, result))
            })
            .map_err(|e| EngineError::Internal(format!("failed to spawn worker: {e}")))?;
        Ok(RunHandle::new(control, state, worker))
    }

    fn control_for(&self, request: &ScheduleRequest) -> RunControl {
        let control = RunControl::new(Duration::from_millis(request.params.time_limit_ms));
        match &self.progress {
            Some(sink) => control.with_sink(Arc::clone(sink)),
            None => control,
        }
    }

    fn prepare(&self, request: ScheduleRequest) -> Result<PreparedRun> {
        let employees = self.source.list_employees(&request.scope)?;
        let shifts = self.source.list_shifts(&request.scope)?;

        validate_input(&employees, &shifts, request.start_date, request.end_date)
            .map_err(EngineError::InputValidation)?;
        let mut parameter_errors = Vec::new();
        if let Err(errors) = validate_constraints(&request.constraints) {
            parameter_errors.extend(errors);
        }
        if let Err(errors) = request.params.validate() {
            parameter_errors.extend(errors);
        }
        if !parameter_errors.is_empty() {
            return Err(EngineError::ParameterValidation(parameter_errors));
        }

        if request.apply && self.sink.is_none() {
            return Err(EngineError::Persistence(
                "apply requested but no assignment sink is configured".into(),
            ));
        }

        let lock = match &self.lock {
            Some(lock) => {
                let key = request.lock_key();
                match LockGuard::acquire(Arc::clone(lock), key.clone()) {
                    Some(guard) => Some(guard),
                    None => {
                        warn!("run lock '{key}' is held by another run");
                        return Err(EngineError::AlreadyRunning { key });
                    }
                }
            }
            None => None,
        };

        let problem = compile(employees, shifts, &request);
        Ok(PreparedRun {
            problem,
            request,
            _lock: lock,
        })
    }

    /// Checks the request's initial assignments against the rules without
    /// searching. Data is loaded through the source and validated as for a
    /// run; no lock is taken and solver parameters are not checked.
    pub fn validate(&self, request: &ScheduleRequest) -> Result<ViolationReport> {
        let employees = self.source.list_employees(&request.scope)?;
        let shifts = self.source.list_shifts(&request.scope)?;
        validate_input(&employees, &shifts, request.start_date, request.end_date)
            .map_err(EngineError::InputValidation)?;
        validate_constraints(&request.constraints).map_err(EngineError::ParameterValidation)?;

        let problem = compile(employees, shifts, request);
        let roster = problem.roster_from(&request.initial_assignments);
        let report = ConstraintEvaluator::new(&problem).evaluate(&roster);
        info!(
            "validated {} assignments: {} hard, {} soft violations",
            roster.len(),
            report.hard_count,
            report.soft_count
        );
        Ok(report)
    }

    /// Persists a successful result in apply mode. A sink failure is
    /// recorded on the result, which is returned either way.
    fn apply(&self, request: &ScheduleRequest, mut result: ScheduleResult) -> ScheduleResult {
        if !request.apply || !result.is_success() {
            return result;
        }
        let Some(sink) = &self.sink else {
            return result;
        };
        match sink.persist_assignments(&result.assignments) {
            Ok(()) => {
                info!("persisted {} assignments", result.assignments.len());
                result.persisted = true;
            }
            Err(e) => {
                error!("persisting {} assignments failed: {e}", result.assignments.len());
                result.persist_error = Some(e.to_string());
            }
        }
        result
    }
}

impl std::fmt::Debug for ScheduleEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScheduleEngine")
            .field("has_sink", &self.sink.is_some())
            .field("has_lock", &self.lock.is_some())
            .field("has_progress", &self.progress.is_some())
            .finish()
    }
}

fn compile(employees: Vec<Employee>, shifts: Vec<Shift>, request: &ScheduleRequest) -> RosterProblem {
    RosterProblem::new(
        employees,
        shifts,
        request.start_date,
        request.end_date,
        RuleSet::from_constraints(&request.constraints),
    )
}

/// Runs the selected algorithm and builds the result.
fn solve(prepared: &PreparedRun, control: &RunControl) -> ScheduleResult {
    let request = &prepared.request;
    let problem = &prepared.problem;
    let algorithm = request.algorithm;
    info!(
        "{algorithm} run: {} employees, {} shifts, {} days, {} seats",
        problem.num_employees(),
        problem.shifts.len(),
        problem.days,
        problem.total_required()
    );

    let outcome = catch_unwind(AssertUnwindSafe(|| dispatch(prepared, control)));
    let outcome = match outcome {
        Ok(outcome) => outcome,
        Err(panic) => {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            error!("{algorithm} run failed: {message}");
            let mut result = ScheduleResult::error(algorithm, message);
            result.statistics.elapsed_ms = control.elapsed().as_millis() as u64;
            return result;
        }
    };

    let result = build_result(prepared, control, outcome);
    match result.status {
        RunStatus::TimedOut => warn!(
            "{algorithm} run timed out after {} ms",
            result.statistics.elapsed_ms
        ),
        status => info!(
            "{algorithm} run finished: {status}, score {:.4}, {} assignments, {} ms",
            result.score,
            result.assignments.len(),
            result.statistics.elapsed_ms
        ),
    }
    result
}

fn dispatch(prepared: &PreparedRun, control: &RunControl) -> SearchOutcome {
    let problem = &prepared.problem;
    let request = &prepared.request;
    let params = &request.params;
    let mut rng = match params.seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_os_rng(),
    };
    let scorer = ObjectiveScorer::new(problem, params.weights);

    match request.algorithm {
        AlgorithmKind::Backtrack => BacktrackSearch::new(problem, params, control).run(&mut rng),
        AlgorithmKind::Genetic => {
            let optimizer = GeneticOptimizer::new(RosterGaProblem::new(scorer), params, control);
            let optimizer = if request.initial_assignments.is_empty() {
                optimizer
            } else {
                optimizer.with_initial(problem.roster_from(&request.initial_assignments))
            };
            optimizer.run(&mut rng)
        }
        AlgorithmKind::Greedy => GreedySolver::new(problem, params, control).run(&mut rng),
        AlgorithmKind::Heuristic => RepairEngine::new(scorer, params, control)
            .run(problem.roster_from(&request.initial_assignments)),
    }
}

/// Maps an outcome to a status given whether its roster is feasible.
pub fn status_for(outcome: &SearchOutcome, feasible: bool) -> RunStatus {
    let has_best = outcome.best.is_some();
    match outcome.termination {
        Termination::Completed if has_best && feasible => RunStatus::Success,
        Termination::Completed | Termination::Exhausted => RunStatus::NoSolution,
        Termination::TimedOut if has_best && outcome.complete && feasible => RunStatus::Success,
        Termination::TimedOut => RunStatus::TimedOut,
        Termination::Stopped => RunStatus::Stopped,
    }
}

fn build_result(prepared: &PreparedRun, control: &RunControl, outcome: SearchOutcome) -> ScheduleResult {
    let problem = &prepared.problem;
    let request = &prepared.request;
    let scorer = ObjectiveScorer::new(problem, request.params.weights);

    let roster = outcome.best.clone().unwrap_or_default();
    let report = scorer.evaluator().evaluate(&roster);
    let status = status_for(&outcome, report.is_feasible());
    let score = scorer.score(&roster);

    let (initial_score, improvement_rate) = if request.initial_assignments.is_empty() {
        (None, None)
    } else {
        let initial = scorer.score(&problem.roster_from(&request.initial_assignments));
        let rate = (initial.abs() > f64::EPSILON).then(|| (score - initial) / initial.abs());
        (Some(initial), rate)
    };

    let message = match status {
        RunStatus::NoSolution if outcome.best.is_none() => Some("no roster found".to_string()),
        RunStatus::NoSolution => Some(format!(
            "best roster has {} hard violations",
            report.hard_count
        )),
        RunStatus::TimedOut => Some(format!(
            "time limit of {} ms reached",
            request.params.time_limit_ms
        )),
        RunStatus::Stopped => Some("stopped by caller".to_string()),
        _ => None,
    };

    ScheduleResult {
        status,
        algorithm: request.algorithm,
        assignments: problem.to_assignments(&roster),
        score,
        statistics: ScheduleStatistics {
            iterations: outcome.iterations,
            generations: outcome.generations,
            elapsed_ms: control.elapsed().as_millis() as u64,
            hard_violations: report.hard_count,
            soft_violations: report.soft_count,
            coverage_rate: report.coverage_rate(),
            kpi: RosterKpi::calculate(problem, &roster),
            initial_score,
            improvement_rate,
            score_history: outcome.history,
        },
        violations: report.violations,
        message,
        persisted: false,
        persist_error: None,
    }
}

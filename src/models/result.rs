//! Schedule result model.

use serde::{Deserialize, Serialize};

use super::{AlgorithmKind, Assignment, Violation};
use crate::evaluation::RosterKpi;

/// Final status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    /// A roster without hard violations was produced.
    Success,
    /// The search ended without a roster free of hard violations.
    NoSolution,
    /// The time limit was hit before a feasible roster was found.
    TimedOut,
    /// An unexpected failure inside the algorithm.
    Error,
    /// Stopped by the caller.
    Stopped,
}

impl RunStatus {
    /// Stable upper-case name.
    pub fn name(&self) -> &'static str {
        match self {
            RunStatus::Success => "SUCCESS",
            RunStatus::NoSolution => "NO_SOLUTION",
            RunStatus::TimedOut => "TIMED_OUT",
            RunStatus::Error => "ERROR",
            RunStatus::Stopped => "STOPPED",
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-run statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleStatistics {
    /// Search nodes, moves or repair iterations consumed.
    pub iterations: u64,
    /// GA generations consumed.
    pub generations: u64,
    /// Wall-clock time of the run.
    pub elapsed_ms: u64,
    /// Hard violations in the returned roster.
    pub hard_violations: usize,
    /// Soft violations in the returned roster.
    pub soft_violations: usize,
    /// Share of required headcount filled (0..=1).
    pub coverage_rate: f64,
    /// Workforce KPIs of the returned roster.
    pub kpi: RosterKpi,
    /// Score of the request's initial assignments, when given.
    pub initial_score: Option<f64>,
    /// Relative score change versus the initial assignments.
    pub improvement_rate: Option<f64>,
    /// Best score per generation (GA) or per accepted move (local search).
    pub score_history: Vec<f64>,
}

/// Outcome of a scheduling run, owned by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleResult {
    /// Final status.
    pub status: RunStatus,
    /// Algorithm that produced the roster.
    pub algorithm: AlgorithmKind,
    /// Best roster found (possibly partial or infeasible, see `status`).
    pub assignments: Vec<Assignment>,
    /// Objective score of `assignments`.
    pub score: f64,
    /// Violations of `assignments`.
    pub violations: Vec<Violation>,
    /// Run statistics.
    pub statistics: ScheduleStatistics,
    /// Error or diagnostic message.
    pub message: Option<String>,
    /// Whether the roster was handed to the assignment sink (apply mode).
    #[serde(default)]
    pub persisted: bool,
    /// Why the sink rejected the roster. The rest of the result is
    /// unaffected.
    #[serde(default)]
    pub persist_error: Option<String>,
}

impl ScheduleResult {
    /// An empty result with the given status.
    pub fn empty(status: RunStatus, algorithm: AlgorithmKind) -> Self {
        Self {
            status,
            algorithm,
            assignments: Vec::new(),
            score: 0.0,
            violations: Vec::new(),
            statistics: ScheduleStatistics::default(),
            message: None,
            persisted: false,
            persist_error: None,
        }
    }

    /// An ERROR result carrying a message.
    pub fn error(algorithm: AlgorithmKind, message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::empty(RunStatus::Error, algorithm)
        }
    }

    /// Whether the run succeeded.
    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Success
    }

    /// Hard violations of the returned roster.
    pub fn hard_violations(&self) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(|v| v.hard)
    }
}

//! Handle to a run executing on a worker thread.

use std::sync::Arc;
use std::thread::JoinHandle;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::control::{Progress, RunControl};
use crate::error::{EngineError, Result};
use crate::models::{RunStatus, ScheduleResult};

/// Lifecycle of a run.
///
/// ```text
/// INITIALIZED → RUNNING ⇄ PAUSED → COMPLETED | ERROR | STOPPED | TIMED_OUT
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunState {
    Initialized,
    Running,
    Paused,
    Completed,
    Error,
    Stopped,
    TimedOut,
}

impl RunState {
    /// Stable upper-case name.
    pub fn name(&self) -> &'static str {
        match self {
            RunState::Initialized => "INITIALIZED",
            RunState::Running => "RUNNING",
            RunState::Paused => "PAUSED",
            RunState::Completed => "COMPLETED",
            RunState::Error => "ERROR",
            RunState::Stopped => "STOPPED",
            RunState::TimedOut => "TIMED_OUT",
        }
    }

    /// Whether the run has ended.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunState::Completed | RunState::Error | RunState::Stopped | RunState::TimedOut
        )
    }

    /// Final state for a result status.
    pub fn from_status(status: RunStatus) -> Self {
        match status {
            RunStatus::Success | RunStatus::NoSolution => RunState::Completed,
            RunStatus::TimedOut => RunState::TimedOut,
            RunStatus::Stopped => RunState::Stopped,
            RunStatus::Error => RunState::Error,
        }
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Shared state cell between the handle and the worker.
pub(crate) type SharedState = Arc<Mutex<RunState>>;

/// Controls a run started with
/// [`ScheduleEngine::start`](super::ScheduleEngine::start).
#[derive(Debug)]
pub struct RunHandle {
    control: Arc<RunControl>,
    state: SharedState,
    worker: Option<JoinHandle<Result<ScheduleResult>>>,
}

impl RunHandle {
    pub(crate) fn new(
        control: Arc<RunControl>,
        state: SharedState,
        worker: JoinHandle<Result<ScheduleResult>>,
    ) -> Self {
        Self {
            control,
            state,
            worker: Some(worker),
        }
    }

    /// Current state.
    pub fn state(&self) -> RunState {
        *self.state.lock()
    }

    /// Most recent progress report.
    pub fn progress(&self) -> Option<Progress> {
        self.control.last_progress()
    }

    /// Pauses at the worker's next checkpoint. Only legal while running.
    pub fn pause(&self) -> Result<()> {
        let mut state = self.state.lock();
        if *state != RunState::Running {
            return Err(invalid(*state, "pause"));
        }
        self.control.pause();
        *state = RunState::Paused;
        Ok(())
    }

    /// Resumes a paused run.
    pub fn resume(&self) -> Result<()> {
        let mut state = self.state.lock();
        if *state != RunState::Paused {
            return Err(invalid(*state, "resume"));
        }
        self.control.resume();
        *state = RunState::Running;
        Ok(())
    }

    /// Asks the worker to stop. The final state is set when it exits.
    pub fn stop(&self) -> Result<()> {
        let state = self.state.lock();
        if state.is_terminal() {
            return Err(invalid(*state, "stop"));
        }
        self.control.request_stop();
        Ok(())
    }

    /// Whether the worker has exited.
    pub fn is_finished(&self) -> bool {
        self.worker.as_ref().map_or(true, |w| w.is_finished())
    }

    /// Waits for the worker and returns its result.
    pub fn join(mut self) -> Result<ScheduleResult> {
        let worker = self
            .worker
            .take()
            .ok_or_else(|| EngineError::Internal("run already joined".into()))?;
        match worker.join() {
            Ok(result) => result,
            Err(_) => {
                *self.state.lock() = RunState::Error;
                Err(EngineError::Internal("worker thread panicked".into()))
            }
        }
    }
}

fn invalid(from: RunState, action: &str) -> EngineError {
    EngineError::InvalidState {
        from: from.name().to_string(),
        action: action.to_string(),
    }
}

//! Stop flag, pause gate and deadline.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use super::outcome::Termination;
use super::progress::{Progress, ProgressSink};

/// What an algorithm should do at a checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Checkpoint {
    /// Keep going.
    Continue,
    /// The caller asked to stop.
    Stop,
    /// The wall-clock budget is spent.
    TimedOut,
}

impl Checkpoint {
    /// Whether the algorithm may keep going.
    #[inline]
    pub fn should_continue(self) -> bool {
        self == Checkpoint::Continue
    }

    /// The termination reason for a non-continue checkpoint.
    pub fn termination(self) -> Option<Termination> {
        match self {
            Checkpoint::Continue => None,
            Checkpoint::Stop => Some(Termination::Stopped),
            Checkpoint::TimedOut => Some(Termination::TimedOut),
        }
    }
}

/// Control signals for one run.
///
/// Shared (through `Arc`) between the caller, who stops, pauses and
/// resumes, and the worker, who polls [`RunControl::checkpoint`].
pub struct RunControl {
    stop: AtomicBool,
    paused: Mutex<bool>,
    resumed: Condvar,
    started: Instant,
    deadline: Instant,
    last_progress: Mutex<Option<Progress>>,
    sink: Option<Arc<dyn ProgressSink>>,
}

impl RunControl {
    /// Creates a control whose deadline is `time_limit` from now.
    pub fn new(time_limit: Duration) -> Self {
        let started = Instant::now();
        Self {
            stop: AtomicBool::new(false),
            paused: Mutex::new(false),
            resumed: Condvar::new(),
            started,
            deadline: started + time_limit,
            last_progress: Mutex::new(None),
            sink: None,
        }
    }

    /// A control with an effectively unlimited budget.
    pub fn unlimited() -> Self {
        Self::new(Duration::from_secs(365 * 24 * 3600))
    }

    /// Attaches a progress sink.
    pub fn with_sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Asks the worker to stop at its next checkpoint. Wakes a paused worker.
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Release);
        let _guard = self.paused.lock();
        self.resumed.notify_all();
    }

    /// Whether a stop was requested.
    #[inline]
    pub fn is_stop_requested(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }

    /// Closes the pause gate. Returns `false` if already paused.
    pub fn pause(&self) -> bool {
        let mut paused = self.paused.lock();
        if *paused {
            return false;
        }
        *paused = true;
        true
    }

    /// Opens the pause gate. Returns `false` if not paused.
    pub fn resume(&self) -> bool {
        let mut paused = self.paused.lock();
        if !*paused {
            return false;
        }
        *paused = false;
        self.resumed.notify_all();
        true
    }

    /// Whether the pause gate is closed.
    pub fn is_paused(&self) -> bool {
        *self.paused.lock()
    }

    /// Time since the control was created.
    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Budget left before the deadline.
    #[inline]
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// Whether the deadline has passed.
    #[inline]
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.deadline
    }

    /// Polls stop, pause and deadline.
    ///
    /// While paused the call blocks on a condition variable until resumed,
    /// stopped or the deadline passes.
    pub fn checkpoint(&self) -> Checkpoint {
        if self.is_stop_requested() {
            return Checkpoint::Stop;
        }
        {
            let mut paused = self.paused.lock();
            while *paused && !self.is_stop_requested() {
                if self
                    .resumed
                    .wait_until(&mut paused, self.deadline)
                    .timed_out()
                {
                    break;
                }
            }
        }
        if self.is_stop_requested() {
            Checkpoint::Stop
        } else if self.is_expired() {
            Checkpoint::TimedOut
        } else {
            Checkpoint::Continue
        }
    }

    /// Records a progress report and forwards it to the sink.
    pub fn report(&self, fraction: f64, phase: &str) {
        let fraction = if fraction.is_finite() {
            fraction.clamp(0.0, 1.0)
        } else {
            0.0
        };
        *self.last_progress.lock() = Some(Progress {
            fraction,
            phase: phase.to_string(),
        });
        if let Some(sink) = &self.sink {
            sink.on_progress(fraction, phase);
        }
    }

    /// The most recent progress report.
    pub fn last_progress(&self) -> Option<Progress> {
        self.last_progress.lock().clone()
    }
}

impl std::fmt::Debug for RunControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunControl")
            .field("stop", &self.is_stop_requested())
            .field("paused", &self.is_paused())
            .field("elapsed", &self.elapsed())
            .field("has_sink", &self.sink.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::thread;

    #[test]
    fn test_checkpoint_continue_and_stop() {
        let control = RunControl::unlimited();
        assert_eq!(control.checkpoint(), Checkpoint::Continue);
        control.request_stop();
        assert_eq!(control.checkpoint(), Checkpoint::Stop);
        assert_eq!(control.checkpoint().termination(), Some(Termination::Stopped));
    }

    #[test]
    fn test_checkpoint_timeout() {
        let control = RunControl::new(Duration::from_millis(1));
        thread::sleep(Duration::from_millis(5));
        assert_eq!(control.checkpoint(), Checkpoint::TimedOut);
        assert!(control.is_expired());
        assert_eq!(control.remaining(), Duration::ZERO);
    }

    #[test]
    fn test_pause_resume_transitions() {
        let control = RunControl::unlimited();
        assert!(!control.resume());
        assert!(control.pause());
        assert!(!control.pause());
        assert!(control.is_paused());
        assert!(control.resume());
        assert!(!control.is_paused());
    }

    #[test]
    fn test_paused_worker_resumes() {
        let control = Arc::new(RunControl::unlimited());
        control.pause();
        let worker = {
            let control = Arc::clone(&control);
            thread::spawn(move || control.checkpoint())
        };
        thread::sleep(Duration::from_millis(20));
        control.resume();
        assert_eq!(worker.join().unwrap(), Checkpoint::Continue);
    }

    #[test]
    fn test_stop_wakes_paused_worker() {
        let control = Arc::new(RunControl::unlimited());
        control.pause();
        let worker = {
            let control = Arc::clone(&control);
            thread::spawn(move || control.checkpoint())
        };
        thread::sleep(Duration::from_millis(20));
        control.request_stop();
        assert_eq!(worker.join().unwrap(), Checkpoint::Stop);
    }

    #[test]
    fn test_deadline_applies_while_paused() {
        let control = RunControl::new(Duration::from_millis(20));
        control.pause();
        assert_eq!(control.checkpoint(), Checkpoint::TimedOut);
    }

    #[test]
    fn test_progress_sink() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let control = RunControl::unlimited().with_sink(Arc::new(move |f: f64, _: &str| {
            assert!((0.0..=1.0).contains(&f));
            seen.fetch_add(1, Ordering::SeqCst);
        }));
        control.report(0.5, "generation 10");
        control.report(7.0, "done");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        let last = control.last_progress().unwrap();
        assert_eq!(last.fraction, 1.0);
        assert_eq!(last.phase, "done");
    }
}

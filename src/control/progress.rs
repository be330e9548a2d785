//! Progress reporting.

use serde::{Deserialize, Serialize};

/// A progress report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    /// Completed fraction in [0, 1].
    pub fraction: f64,
    /// Human-readable phase label.
    pub phase: String,
}

/// Receiver of progress reports.
///
/// Called from the worker thread at most once per outer iteration.
pub trait ProgressSink: Send + Sync {
    /// Receives a fraction in [0, 1] and a phase label.
    fn on_progress(&self, fraction: f64, phase: &str);
}

impl<F> ProgressSink for F
where
    F: Fn(f64, &str) + Send + Sync,
{
    fn on_progress(&self, fraction: f64, phase: &str) {
        self(fraction, phase)
    }
}

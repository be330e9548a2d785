//! Run control shared between the caller and the worker running an
//! algorithm.
//!
//! - [`RunControl`]: stop flag, pause gate and wall-clock deadline, polled
//!   by algorithms at their checkpoints
//! - [`ProgressSink`]: receiver of `(fraction, phase)` progress reports
//! - [`SearchOutcome`]: what every algorithm hands back to the engine
//!
//! Cancellation is cooperative: a stop or pause takes effect at the next
//! checkpoint (one backtracking node, one generation, one local-search
//! pass or one repair iteration).

mod outcome;
mod progress;
mod signal;

pub use outcome::{SearchOutcome, Termination};
pub use progress::{Progress, ProgressSink};
pub use signal::{Checkpoint, RunControl};

//! Engine error taxonomy.
//!
//! Only failures that prevent a run from starting (or that occur in the
//! surrounding ports) are errors. Search outcomes such as "no feasible
//! roster", "time limit reached" or "stopped by caller" are reported as
//! [`RunStatus`](crate::models::RunStatus) values on the result instead.

use thiserror::Error;

use crate::validation::ValidationError;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors raised by the rostering engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Employees, shifts or the date range are missing or inconsistent.
    #[error("invalid input: {}", join_messages(.0))]
    InputValidation(Vec<ValidationError>),

    /// A tuning parameter or constraint value is out of range.
    #[error("invalid parameters: {}", join_messages(.0))]
    ParameterValidation(Vec<ValidationError>),

    /// The run lock for this scope and period is held by another run.
    #[error("a scheduling run is already in progress for {key}")]
    AlreadyRunning { key: String },

    /// The roster source failed to deliver reference data.
    #[error("data access failed: {0}")]
    DataAccess(String),

    /// The assignment sink rejected the accepted roster.
    #[error("persisting assignments failed: {0}")]
    Persistence(String),

    /// A control action is not allowed in the current run state.
    #[error("cannot {action} while run is {from}")]
    InvalidState { from: String, action: String },

    /// Configuration could not be parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// Unexpected failure inside the engine.
    #[error("internal error: {0}")]
    Internal(String),
}

impl EngineError {
    /// Validation errors attached to this error, if any.
    pub fn validation_errors(&self) -> &[ValidationError] {
        match self {
            EngineError::InputValidation(errors) | EngineError::ParameterValidation(errors) => {
                errors
            }
            _ => &[],
        }
    }
}

impl From<toml::de::Error> for EngineError {
    fn from(err: toml::de::Error) -> Self {
        EngineError::Config(err.to_string())
    }
}

fn join_messages(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

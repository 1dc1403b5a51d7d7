//! Error types for control operations.

use thiserror::Error;

/// Result type for control operations.
pub type ControlResult<T> = Result<T, ControlError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ControlError {
    /// Invalid argument provided to a control constructor.
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    /// Unrecognised servo mode label.
    #[error("Unknown servo mode '{label}' (expected 'position' or 'velocity')")]
    UnknownMode { label: String },
}

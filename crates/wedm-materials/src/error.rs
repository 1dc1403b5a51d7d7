//! Material lookup errors.

use thiserror::Error;
use wedm_core::CoreError;

/// Result type for material operations.
pub type MaterialResult<T> = Result<T, MaterialError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MaterialError {
    /// Requested material is not in the database.
    #[error("Unknown wire material '{name}' (available: {available})")]
    NotFound { name: String, available: String },

    /// Non-physical property value.
    #[error("Invalid property {what} for material '{name}': {value}")]
    InvalidProperty {
        name: String,
        what: &'static str,
        value: f64,
    },

    #[error("Material file I/O error: {message}")]
    Io { message: String },

    #[error("Material file parse error: {message}")]
    Parse { message: String },
}

impl From<MaterialError> for CoreError {
    fn from(err: MaterialError) -> Self {
        match err {
            MaterialError::NotFound { .. } => CoreError::InvalidArg {
                what: "unknown wire material",
            },
            MaterialError::InvalidProperty { .. } => CoreError::InvalidArg {
                what: "non-physical material property",
            },
            MaterialError::Io { .. } | MaterialError::Parse { .. } => CoreError::InvalidArg {
                what: "unreadable material file",
            },
        }
    }
}

impl From<std::io::Error> for MaterialError {
    fn from(err: std::io::Error) -> Self {
        MaterialError::Io {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for MaterialError {
    fn from(err: serde_json::Error) -> Self {
        MaterialError::Parse {
            message: err.to_string(),
        }
    }
}

//! Error types for simulation operations.
//!
//! Terminal process conditions (wire break, target reached) are flags on the
//! process state, never errors.

use thiserror::Error;
use wedm_project::{UnknownCurrentMode, ValidationError};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Configuration error: {0}")]
    Config(#[from] ValidationError),

    /// NaN or infinity in the process state. The tick that produced it was discarded.
    #[error("Numerical fault in {what}: {value}")]
    NumericalFault { what: &'static str, value: f64 },

    #[error("Unknown current mode '{label}'")]
    UnknownCurrentMode { label: String },

    #[error("Environment faulted by an earlier numerical error; reset required")]
    Faulted,

    #[error("Backend error: {message}")]
    Backend { message: String },
}

pub type SimResult<T> = Result<T, SimError>;

impl From<UnknownCurrentMode> for SimError {
    fn from(e: UnknownCurrentMode) -> Self {
        SimError::UnknownCurrentMode { label: e.label }
    }
}

impl From<wedm_materials::MaterialError> for SimError {
    fn from(e: wedm_materials::MaterialError) -> Self {
        match e {
            wedm_materials::MaterialError::NotFound { name, .. } => {
                SimError::Config(ValidationError::UnknownMaterial { name })
            }
            other => SimError::Backend {
                message: other.to_string(),
            },
        }
    }
}

impl From<wedm_controls::ControlError> for SimError {
    fn from(e: wedm_controls::ControlError) -> Self {
        match e {
            wedm_controls::ControlError::InvalidArg { what } => SimError::InvalidArg { what },
            other => SimError::Backend {
                message: other.to_string(),
            },
        }
    }
}

impl From<wedm_core::CoreError> for SimError {
    fn from(e: wedm_core::CoreError) -> Self {
        match e {
            wedm_core::CoreError::NonFinite { what, value }
            | wedm_core::CoreError::NonFiniteElement { what, value, .. } => {
                SimError::NumericalFault { what, value }
            }
            wedm_core::CoreError::InvalidArg { what } => SimError::InvalidArg { what },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn material_not_found_is_config_error() {
        let err: SimError = wedm_materials::MaterialError::NotFound {
            name: "tungsten".into(),
            available: "brass".into(),
        }
        .into();
        assert!(matches!(
            err,
            SimError::Config(ValidationError::UnknownMaterial { .. })
        ));
    }

    #[test]
    fn non_finite_field_is_numerical_fault() {
        let err: SimError = wedm_core::ensure_all_finite(&[1.0, f64::NAN], "wire_temperature")
            .unwrap_err()
            .into();
        assert!(matches!(
            err,
            SimError::NumericalFault {
                what: "wire_temperature",
                ..
            }
        ));
    }
}

//! Feed-axis servo dynamics.
//!
//! The axis carries position [µm], velocity [µm/s] and the acceleration
//! [µm/s²] applied on the previous update (needed for jerk limiting).
//!
//! Each update, in order:
//! 1. nominal acceleration from the control law,
//! 2. clamp to `±max_acceleration`,
//! 3. limit the change from the previous acceleration to `±max_jerk·dt`,
//! 4. integrate velocity, clamp it to `±max_speed`, then integrate position.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ControlError, ControlResult};

/// How the servo command is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServoMode {
    /// Command is a position increment [µm].
    #[default]
    Position,
    /// Command is a target velocity [µm/s].
    Velocity,
}

impl fmt::Display for ServoMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServoMode::Position => f.write_str("position"),
            ServoMode::Velocity => f.write_str("velocity"),
        }
    }
}

impl FromStr for ServoMode {
    type Err = ControlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "position" => Ok(ServoMode::Position),
            "velocity" => Ok(ServoMode::Velocity),
            _ => Err(ControlError::UnknownMode {
                label: s.to_string(),
            }),
        }
    }
}

/// Physical limits of the axis drive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ServoLimits {
    /// [µm/s²]
    pub max_acceleration: f64,
    /// [µm/s³]
    pub max_jerk: f64,
    /// [µm/s]
    pub max_speed: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ServoState {
    pub position: f64,
    pub velocity: f64,
    /// Acceleration applied on the previous update.
    pub acceleration: f64,
}

/// Second-order (position) or first-order (velocity) tracking law.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ServoLaw {
    pub mode: ServoMode,
    /// Natural frequency [rad/s].
    pub omega_n: f64,
    /// Damping ratio, position mode only.
    pub zeta: f64,
    pub limits: ServoLimits,
}

impl ServoLaw {
    /// # Errors
    ///
    /// Returns error if `omega_n`, any limit is not positive and finite, or
    /// `zeta` is negative.
    pub fn new(mode: ServoMode, omega_n: f64, zeta: f64, limits: ServoLimits) -> ControlResult<Self> {
        if !(omega_n.is_finite() && omega_n > 0.0) {
            return Err(ControlError::InvalidArg {
                what: "omega_n must be positive",
            });
        }
        if !(zeta.is_finite() && zeta >= 0.0) {
            return Err(ControlError::InvalidArg {
                what: "zeta must be non-negative",
            });
        }
        if !(limits.max_acceleration.is_finite() && limits.max_acceleration > 0.0) {
            return Err(ControlError::InvalidArg {
                what: "max_acceleration must be positive",
            });
        }
        if !(limits.max_jerk.is_finite() && limits.max_jerk > 0.0) {
            return Err(ControlError::InvalidArg {
                what: "max_jerk must be positive",
            });
        }
        if !(limits.max_speed.is_finite() && limits.max_speed > 0.0) {
            return Err(ControlError::InvalidArg {
                what: "max_speed must be positive",
            });
        }
        Ok(Self {
            mode,
            omega_n,
            zeta,
            limits,
        })
    }

    /// Unlimited acceleration requested by the control law.
    pub fn nominal_acceleration(&self, state: &ServoState, command: f64) -> f64 {
        match self.mode {
            // Target is `x + command`, so the position error is `-command`.
            ServoMode::Position => {
                -2.0 * self.zeta * self.omega_n * state.velocity
                    + self.omega_n * self.omega_n * command
            }
            ServoMode::Velocity => -self.omega_n * (state.velocity - command),
        }
    }

    /// Advance the axis by `dt` seconds. A non-positive `dt` is a no-op.
    pub fn step(&self, state: &ServoState, dt: f64, command: f64) -> ServoState {
        if dt <= 0.0 {
            return *state;
        }
        let max_acc = self.limits.max_acceleration;
        let a_nom = self.nominal_acceleration(state, command).clamp(-max_acc, max_acc);

        let max_da = self.limits.max_jerk * dt;
        let da = (a_nom - state.acceleration).clamp(-max_da, max_da);
        let acceleration = state.acceleration + da;

        let max_v = self.limits.max_speed;
        let velocity = (state.velocity + acceleration * dt).clamp(-max_v, max_v);
        let position = state.position + velocity * dt;

        ServoState {
            position,
            velocity,
            acceleration,
        }
    }
}

//! Servo and generator-side control primitives for the wire EDM simulation.
//!
//! - [`ServoLaw`]: the feed-axis control law. Position mode tracks a position
//!   increment with a second-order response, velocity mode tracks a velocity
//!   with a first-order response. Both are acceleration, jerk and speed limited
//!   and integrated with explicit Euler.
//! - [`PIController`]: sampled PI with output clamping and anti-windup.
//! - [`GapVoltageController`]: a PI loop on the windowed mean gap voltage that
//!   produces servo commands, used as the reference policy by the CLI.

pub mod controller;
pub mod error;
pub mod servo;

pub use controller::{GapVoltageController, PIController, PIControllerState, VoltageWindow};
pub use error::{ControlError, ControlResult};
pub use servo::{ServoLaw, ServoLimits, ServoMode, ServoState};

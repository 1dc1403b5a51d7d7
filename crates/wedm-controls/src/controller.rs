//! Sampled PI control and the gap-voltage servo policy.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::error::{ControlError, ControlResult};
use crate::servo::ServoMode;

/// PI controller configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PIController {
    /// Proportional gain.
    pub kp: f64,
    /// Integral time constant, in the same unit as `dt` passed to `update`.
    pub ti: f64,
    pub out_min: f64,
    pub out_max: f64,
    /// Clamp on the integral accumulator.
    pub integral_limit: Option<f64>,
    /// Reverse acting: output rises when the process variable is above setpoint.
    #[serde(default)]
    pub reverse: bool,
}

impl PIController {
    pub fn new(kp: f64, ti: f64, out_min: f64, out_max: f64) -> ControlResult<Self> {
        if ti <= 0.0 {
            return Err(ControlError::InvalidArg {
                what: "ti must be positive",
            });
        }
        if out_min >= out_max {
            return Err(ControlError::InvalidArg {
                what: "out_min must be less than out_max",
            });
        }
        Ok(Self {
            kp,
            ti,
            out_min,
            out_max,
            integral_limit: None,
            reverse: false,
        })
    }

    pub fn with_integral_limit(mut self, limit: f64) -> Self {
        self.integral_limit = Some(limit);
        self
    }

    pub fn reverse_acting(mut self) -> Self {
        self.reverse = true;
        self
    }

    /// Compute controller output given process variable and setpoint.
    ///
    /// Returns the updated state and the clamped output. The integral is
    /// frozen while the output saturates.
    pub fn update(
        &self,
        state: &PIControllerState,
        pv: f64,
        sp: f64,
        dt: f64,
    ) -> (PIControllerState, f64) {
        let error = if self.reverse { pv - sp } else { sp - pv };

        let new_integral = state.integral + error * dt;
        let clamped_integral = match self.integral_limit {
            Some(limit) => new_integral.clamp(-limit, limit),
            None => new_integral,
        };

        let output_raw = self.kp * error + (self.kp / self.ti) * clamped_integral;
        let output = output_raw.clamp(self.out_min, self.out_max);

        let integral = if output == output_raw {
            clamped_integral
        } else {
            state.integral
        };

        (PIControllerState { integral }, output)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PIControllerState {
    pub integral: f64,
}

/// Sliding time window over gap-voltage samples.
#[derive(Debug, Clone, PartialEq)]
pub struct VoltageWindow {
    span_us: f64,
    samples: VecDeque<(f64, f64)>,
    sum: f64,
}

impl VoltageWindow {
    pub fn new(span_us: f64) -> ControlResult<Self> {
        if !(span_us.is_finite() && span_us > 0.0) {
            return Err(ControlError::InvalidArg {
                what: "voltage window span must be positive",
            });
        }
        Ok(Self {
            span_us,
            samples: VecDeque::new(),
            sum: 0.0,
        })
    }

    /// Record a sample and drop those older than the span.
    pub fn push(&mut self, time_us: f64, voltage: f64) {
        self.samples.push_back((time_us, voltage));
        self.sum += voltage;
        let cutoff = time_us - self.span_us;
        while let Some(&(t, v)) = self.samples.front() {
            if t >= cutoff {
                break;
            }
            self.sum -= v;
            self.samples.pop_front();
        }
    }

    pub fn mean(&self) -> Option<f64> {
        if self.samples.is_empty() {
            None
        } else {
            Some(self.sum / self.samples.len() as f64)
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
        self.sum = 0.0;
    }
}

/// Proportional gain on the voltage error.
const KP: f64 = 0.05;
/// Integral gain per control step.
const KI_PER_STEP: f64 = 1.0e-4;
const INTEGRAL_LIMIT: f64 = 100.0;
const POSITION_LIMIT_UM: f64 = 5.0;
const VELOCITY_GAIN: f64 = 100.0;
const VELOCITY_LIMIT_UM_S: f64 = 1000.0;

/// Servo policy that holds the mean gap voltage at a setpoint.
///
/// A mean voltage above the setpoint means the gap is too wide, so the
/// controller is reverse acting: it feeds the wire forward. The integral
/// accumulates once per control step.
#[derive(Debug, Clone)]
pub struct GapVoltageController {
    pub target_voltage: f64,
    pi: PIController,
    state: PIControllerState,
    window: VoltageWindow,
}

impl GapVoltageController {
    /// `window_us` is the averaging span in microseconds (1000 for 1 ms).
    pub fn new(mode: ServoMode, target_voltage: f64, window_us: f64) -> ControlResult<Self> {
        if !(target_voltage.is_finite() && target_voltage >= 0.0) {
            return Err(ControlError::InvalidArg {
                what: "target voltage must be non-negative",
            });
        }
        let (kp, limit) = match mode {
            ServoMode::Position => (KP, POSITION_LIMIT_UM),
            ServoMode::Velocity => (KP * VELOCITY_GAIN, VELOCITY_LIMIT_UM_S),
        };
        let pi = PIController::new(kp, KP / KI_PER_STEP, -limit, limit)?
            .with_integral_limit(INTEGRAL_LIMIT)
            .reverse_acting();
        Ok(Self {
            target_voltage,
            pi,
            state: PIControllerState::default(),
            window: VoltageWindow::new(window_us)?,
        })
    }

    /// Feed one gap-voltage sample.
    pub fn observe(&mut self, time_us: f64, voltage: f64) {
        self.window.push(time_us, voltage);
    }

    pub fn mean_voltage(&self) -> Option<f64> {
        self.window.mean()
    }

    /// Produce the next servo command. Uses `fallback_voltage` when no sample
    /// has been observed yet.
    pub fn command(&mut self, fallback_voltage: f64) -> f64 {
        let pv = self.window.mean().unwrap_or(fallback_voltage);
        let (state, out) = self.pi.update(&self.state, pv, self.target_voltage, 1.0);
        self.state = state;
        out
    }

    pub fn reset(&mut self) {
        self.state = PIControllerState::default();
        self.window.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pi_controller_proportional_only() {
        let pi = PIController::new(2.0, 1000.0, 0.0, 1.0).unwrap();
        let (_, output) = pi.update(&PIControllerState::default(), 0.5, 1.0, 0.1);
        assert!((output - 1.0).abs() < 1e-6);
    }

    #[test]
    fn pi_controller_integral_action() {
        let pi = PIController::new(1.0, 1.0, 0.0, 10.0).unwrap();
        let mut state = PIControllerState::default();
        for _ in 0..10 {
            state = pi.update(&state, 0.0, 1.0, 0.1).0;
        }
        assert!(state.integral > 0.5);
    }

    #[test]
    fn pi_controller_anti_windup() {
        let pi = PIController::new(10.0, 1.0, 0.0, 1.0).unwrap();
        let (state, output) = pi.update(&PIControllerState::default(), 0.0, 10.0, 0.1);
        assert_eq!(output, 1.0);
        assert_eq!(state.integral, 0.0);
    }

    #[test]
    fn reverse_acting_flips_sign() {
        let pi = PIController::new(1.0, 1e6, -10.0, 10.0).unwrap().reverse_acting();
        let (_, out) = pi.update(&PIControllerState::default(), 5.0, 2.0, 1.0);
        assert!(out > 0.0);
    }

    #[test]
    fn invalid_controller_params() {
        assert!(PIController::new(1.0, -1.0, 0.0, 1.0).is_err());
        assert!(PIController::new(1.0, 1.0, 1.0, 0.0).is_err());
        assert!(VoltageWindow::new(0.0).is_err());
    }

    #[test]
    fn window_drops_old_samples() {
        let mut w = VoltageWindow::new(10.0).unwrap();
        for t in 0..=20 {
            w.push(t as f64, t as f64);
        }
        // Samples 10..=20 remain.
        assert_eq!(w.len(), 11);
        assert!((w.mean().unwrap() - 15.0).abs() < 1e-12);
        w.clear();
        assert!(w.mean().is_none());
    }

    #[test]
    fn high_voltage_feeds_wire_forward() {
        let mut c = GapVoltageController::new(ServoMode::Position, 30.0, 1000.0).unwrap();
        for t in 0..1000 {
            c.observe(t as f64, 80.0);
        }
        let cmd = c.command(0.0);
        // 0.05 * 50 = 2.5 plus a small integral contribution.
        assert!(cmd > 2.5 && cmd <= 5.0);
    }

    #[test]
    fn low_voltage_backs_off_and_clamps() {
        let mut c = GapVoltageController::new(ServoMode::Velocity, 30.0, 1000.0).unwrap();
        c.observe(0.0, 0.0);
        let cmd = c.command(0.0);
        assert!(cmd < 0.0);
        assert!(cmd >= -1000.0);
    }

    #[test]
    fn fallback_when_no_samples() {
        let mut c = GapVoltageController::new(ServoMode::Position, 30.0, 1000.0).unwrap();
        assert!(c.mean_voltage().is_none());
        assert_eq!(c.command(30.0), 0.0);
    }
}

//! Feed-axis servo, run once per servo interval.

use wedm_controls::{ServoLaw, ServoLimits, ServoMode, ServoState};
use wedm_core::{ensure_finite, us_to_s};
use wedm_project::{MechanicsParams, ServoAxis};

use crate::error::SimResult;
use crate::module::{ProcessModule, StepContext};
use crate::state::ProcessState;

#[derive(Debug, Clone)]
pub struct Mechanics {
    law: ServoLaw,
    axis: ServoAxis,
}

impl Mechanics {
    pub fn new(params: &MechanicsParams, mode: ServoMode) -> SimResult<Self> {
        let limits = ServoLimits {
            max_acceleration: params.max_acceleration,
            max_jerk: params.max_jerk,
            max_speed: params.max_speed,
        };
        let law = ServoLaw::new(mode, params.omega_n, params.zeta, limits)?;
        Ok(Self {
            law,
            axis: params.axis,
        })
    }

    pub fn mode(&self) -> ServoMode {
        self.law.mode
    }

    pub fn axis(&self) -> ServoAxis {
        self.axis
    }
}

impl ProcessModule for Mechanics {
    fn name(&self) -> &'static str {
        "mechanics"
    }

    fn step(&self, state: &mut ProcessState, ctx: &mut StepContext<'_>) -> SimResult<()> {
        let before = ServoState {
            position: state.servo_travel,
            velocity: state.wire_velocity,
            acceleration: state.servo_acceleration,
        };
        let dt = us_to_s(ctx.servo_dt_us as f64);
        let after = self.law.step(&before, dt, state.target_delta);

        let delta = ensure_finite(after.position - before.position, "servo_travel")?;
        state.servo_travel = after.position;
        state.wire_velocity = ensure_finite(after.velocity, "wire_velocity")?;
        state.servo_acceleration = after.acceleration;

        match self.axis {
            ServoAxis::Wire => state.wire_position += delta,
            ServoAxis::Workpiece => state.workpiece_position -= delta,
        }
        Ok(())
    }
}

//! Reinforcement-learning style environment: `reset` and `step` over the
//! five process modules.

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use wedm_controls::ServoMode;
use wedm_core::ensure_finite;
use wedm_materials::MaterialDatabase;
use wedm_project::{
    CurrentMode, EnvironmentConfig, GeneratorSettings, ModuleParams, Project, ServoAxis,
    validate_project_with,
};

use crate::dielectric::Dielectric;
use crate::error::{SimError, SimResult};
use crate::ignition::Ignition;
use crate::mechanics::Mechanics;
use crate::module::{ProcessModule, StepContext};
use crate::removal::MaterialRemoval;
use crate::state::ProcessState;
use crate::wire_thermal::WireThermal;

/// How far [µm] the wire may run past the cutting frontier before it is
/// considered broken.
pub const MAX_WIRE_INTRUSION: f64 = 100.0;

/// One control input. Generator fields left at `None` keep their current value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Action {
    /// Position increment [µm] or velocity [µm/s], depending on the control mode.
    pub target_delta: f64,
    pub target_voltage: Option<f64>,
    pub current_mode: Option<CurrentMode>,
    /// [µs]
    pub on_time: Option<f64>,
    /// [µs]
    pub off_time: Option<f64>,
}

impl Action {
    pub fn servo(target_delta: f64) -> Self {
        Self {
            target_delta,
            ..Self::default()
        }
    }

    /// Set the current mode from its label, e.g. `"I7"`.
    pub fn with_current_mode_label(mut self, label: &str) -> SimResult<Self> {
        self.current_mode = Some(label.parse::<CurrentMode>()?);
        Ok(self)
    }

    fn validate(&self) -> SimResult<()> {
        if !self.target_delta.is_finite() {
            return Err(SimError::InvalidArg {
                what: "target_delta must be finite",
            });
        }
        if self.target_voltage.is_some_and(|v| !(v.is_finite() && v >= 0.0)) {
            return Err(SimError::InvalidArg {
                what: "target_voltage must be non-negative",
            });
        }
        if self.on_time.is_some_and(|t| !(t.is_finite() && t > 0.0)) {
            return Err(SimError::InvalidArg {
                what: "on_time must be positive",
            });
        }
        if self.off_time.is_some_and(|t| !(t.is_finite() && t >= 0.0)) {
            return Err(SimError::InvalidArg {
                what: "off_time must be non-negative",
            });
        }
        Ok(())
    }

    fn latch(&self, state: &mut ProcessState) {
        state.target_delta = self.target_delta;
        if let Some(v) = self.target_voltage {
            state.target_voltage = v;
        }
        if let Some(mode) = self.current_mode {
            state.current_mode = mode;
        }
        if let Some(t) = self.on_time {
            state.on_time = t;
        }
        if let Some(t) = self.off_time {
            state.off_time = t;
        }
    }
}

/// Terminal and near-terminal flags after a tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DoneFlags {
    pub wire_broken: bool,
    pub target_reached: bool,
    pub short_circuit: bool,
    pub wire_colliding: bool,
}

impl DoneFlags {
    fn from_state(state: &ProcessState) -> Self {
        Self {
            wire_broken: state.is_wire_broken,
            target_reached: state.is_target_distance_reached,
            short_circuit: state.is_short_circuit,
            wire_colliding: state.is_wire_colliding,
        }
    }

    /// The episode is over.
    pub fn terminated(&self) -> bool {
        self.wire_broken || self.target_reached
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    pub flags: DoneFlags,
    /// The servo ran on this tick.
    pub control_step: bool,
    /// Simulation time after the tick [µs].
    pub time: u64,
}

/// A single, independent wire EDM process.
///
/// Each environment owns its state, parameters and random generator, so
/// parallel rollouts simply use one environment per worker.
#[derive(Debug, Clone)]
pub struct WireEdmEnv {
    config: EnvironmentConfig,
    params: ModuleParams,
    generator: Option<GeneratorSettings>,
    ignition: Ignition,
    thermal: WireThermal,
    removal: MaterialRemoval,
    dielectric: Dielectric,
    mechanics: Mechanics,
    state: ProcessState,
    rng: ChaCha8Rng,
    seed: u64,
    faulted: bool,
}

impl WireEdmEnv {
    /// # Errors
    ///
    /// Returns [`SimError::Config`] if the configuration or any parameter
    /// record is invalid, or the wire material is unknown.
    pub fn new(
        config: EnvironmentConfig,
        params: ModuleParams,
        control_mode: ServoMode,
        materials: &MaterialDatabase,
    ) -> SimResult<Self> {
        config.validate(materials)?;
        params.validate()?;
        let material = materials.get(&config.wire_material)?.clone();

        let ignition = Ignition::new(params.ignition.clone(), config.workpiece_height);
        let thermal = WireThermal::new(params.wire.clone(), material, &config)?;
        let removal = MaterialRemoval::new(params.material.clone(), &config)?;
        let dielectric = Dielectric::new(params.dielectric.clone(), &config);
        let mechanics = Mechanics::new(&params.mechanics, control_mode)?;

        let state = ProcessState::initial(&config, &params, None, thermal.geometry().n_segments);
        Ok(Self {
            config,
            params,
            generator: None,
            ignition,
            thermal,
            removal,
            dielectric,
            mechanics,
            state,
            rng: ChaCha8Rng::seed_from_u64(0),
            seed: 0,
            faulted: false,
        })
    }

    /// Build from a project file and reset with its seed.
    pub fn from_project(project: &Project, materials: &MaterialDatabase) -> SimResult<Self> {
        validate_project_with(project, materials)?;
        let mut env = Self::new(
            project.environment.clone(),
            project.modules.clone(),
            project.control_mode,
            materials,
        )?;
        if let Some(generator) = &project.generator {
            env = env.with_generator(generator.clone())?;
        }
        env.reset(Some(project.seed.unwrap_or(0)));
        Ok(env)
    }

    /// Generator setpoints used at every reset instead of the ignition defaults.
    pub fn with_generator(mut self, generator: GeneratorSettings) -> SimResult<Self> {
        generator.validate()?;
        self.generator = Some(generator);
        self.state = self.initial_state();
        Ok(self)
    }

    fn initial_state(&self) -> ProcessState {
        ProcessState::initial(
            &self.config,
            &self.params,
            self.generator.as_ref(),
            self.thermal.geometry().n_segments,
        )
    }

    /// Start a new episode. Without a seed, one is drawn from the previous generator.
    pub fn reset(&mut self, seed: Option<u64>) -> &ProcessState {
        let seed = seed.unwrap_or_else(|| self.rng.next_u64());
        self.seed = seed;
        self.rng = ChaCha8Rng::seed_from_u64(seed);
        self.state = self.initial_state();
        self.faulted = false;
        info!(
            seed,
            gap = self.config.initial_gap,
            mode = %self.mechanics.mode(),
            "episode reset"
        );
        &self.state
    }

    /// Advance one tick of `dt`.
    ///
    /// # Errors
    ///
    /// - [`SimError::InvalidArg`] for a malformed action; the state is untouched.
    /// - [`SimError::NumericalFault`] if the tick produced NaN or infinity. The
    ///   tick is discarded and the environment faults.
    /// - [`SimError::Faulted`] on every call after a fault, until [`reset`](Self::reset).
    pub fn step(&mut self, action: &Action) -> SimResult<StepOutcome> {
        if self.faulted {
            return Err(SimError::Faulted);
        }
        action.validate()?;

        let mut next = self.state.clone();
        action.latch(&mut next);

        let control_step = match self.tick(&mut next) {
            Ok(control_step) => control_step,
            Err(e) => {
                self.faulted = true;
                error!(time = next.time, error = %e, "tick failed, environment faulted");
                return Err(e);
            }
        };

        self.log_transitions(&next);
        self.state = next;
        Ok(StepOutcome {
            flags: DoneFlags::from_state(&self.state),
            control_step,
            time: self.state.time,
        })
    }

    fn tick(&mut self, state: &mut ProcessState) -> SimResult<bool> {
        let dt = self.config.dt;
        let servo_elapsed = state.time_since_servo + dt;
        let control_step = servo_elapsed >= self.config.servo_interval;
        let mut ctx = StepContext {
            rng: &mut self.rng,
            dt_us: dt,
            servo_dt_us: servo_elapsed,
        };

        run_stage(&self.ignition, state, &mut ctx)?;
        run_stage(&self.thermal, state, &mut ctx)?;
        if state.spark_status.is_fresh_spark() {
            run_stage(&self.removal, state, &mut ctx)?;
        }
        run_stage(&self.dielectric, state, &mut ctx)?;
        if control_step {
            run_stage(&self.mechanics, state, &mut ctx)?;
        }

        state.time += dt;
        state.time_since_servo = if control_step { 0 } else { servo_elapsed };
        state.time_since_spark_ignition += dt;
        state.time_since_spark_end += dt;
        state.time_since_open_voltage += dt;

        self.check_terminal(state);
        ensure_finite(state.wire_position, "wire_position")?;
        ensure_finite(state.workpiece_position, "workpiece_position")?;
        ensure_finite(state.voltage, "voltage")?;
        ensure_finite(state.current, "current")?;
        Ok(control_step)
    }

    fn check_terminal(&self, state: &mut ProcessState) {
        let gap = state.gap();
        if gap < -MAX_WIRE_INTRUSION {
            state.is_wire_broken = true;
        }
        state.is_wire_colliding = gap < self.config.min_gap_for_operation;
        if self.cut_frontier(state) >= state.target_position {
            state.is_target_distance_reached = true;
        }
    }

    /// Frontier position in the workpiece frame [µm].
    fn cut_frontier(&self, state: &ProcessState) -> f64 {
        match self.mechanics.axis() {
            ServoAxis::Wire => state.workpiece_position,
            ServoAxis::Workpiece => state.workpiece_position + state.servo_travel,
        }
    }

    fn log_transitions(&self, next: &ProcessState) {
        let prev = &self.state;
        if prev.short_circuit_count == 0 && next.short_circuit_count > 0 {
            info!(time = next.time, gap = next.gap(), "first short circuit");
        }
        if !prev.is_wire_broken && next.is_wire_broken {
            warn!(
                time = next.time,
                max_temperature = next.max_wire_temperature(),
                gap = next.gap(),
                "wire broken"
            );
        }
        if !prev.is_target_distance_reached && next.is_target_distance_reached {
            info!(
                time = next.time,
                sparks = next.spark_count,
                "target cutting distance reached"
            );
        }
    }

    pub fn state(&self) -> &ProcessState {
        &self.state
    }

    /// Direct access for tests and scenario setup.
    pub fn state_mut(&mut self) -> &mut ProcessState {
        &mut self.state
    }

    pub fn config(&self) -> &EnvironmentConfig {
        &self.config
    }

    pub fn params(&self) -> &ModuleParams {
        &self.params
    }

    pub fn control_mode(&self) -> ServoMode {
        self.mechanics.mode()
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn is_faulted(&self) -> bool {
        self.faulted
    }

    /// The servo will run on the next call to [`step`](Self::step).
    pub fn next_tick_is_servo(&self) -> bool {
        self.state.time_since_servo + self.config.dt >= self.config.servo_interval
    }
}

fn run_stage<M: ProcessModule>(
    module: &M,
    state: &mut ProcessState,
    ctx: &mut StepContext<'_>,
) -> SimResult<()> {
    module.step(state, ctx).inspect_err(|e| {
        error!(module = module.name(), time = state.time, error = %e, "process module failed");
    })
}

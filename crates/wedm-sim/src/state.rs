//! The per-episode process state.
//!
//! Every time-varying quantity of the process lives here, including the small
//! amount of memory the modules carry between ticks (active short duration,
//! previous servo acceleration, thermal step count). Modules are therefore
//! plain functions of `(state, params)` and a tick can be applied to a working
//! copy and committed atomically.

use serde::{Deserialize, Serialize};
use wedm_project::{CurrentMode, EnvironmentConfig, GeneratorSettings, ModuleParams};

/// What the gap is doing this tick. Exactly one variant per tick.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum SparkStatus {
    #[default]
    None,
    /// Discharge at `y_mm` above the workpiece bottom. `fresh` only on the ignition tick.
    Spark { y_mm: f64, fresh: bool },
    Short,
}

impl SparkStatus {
    pub fn is_fresh_spark(&self) -> bool {
        matches!(self, SparkStatus::Spark { fresh: true, .. })
    }

    pub fn location(&self) -> Option<f64> {
        match self {
            SparkStatus::Spark { y_mm, .. } => Some(*y_mm),
            _ => None,
        }
    }

    /// Export code: 1 spark, 0 none, -1 short.
    pub fn code(&self) -> f64 {
        match self {
            SparkStatus::None => 0.0,
            SparkStatus::Spark { .. } => 1.0,
            SparkStatus::Short => -1.0,
        }
    }
}

/// Pulse generator cycle.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum GeneratorPhase {
    /// Open voltage applied, waiting for breakdown.
    #[default]
    Open,
    /// Discharge burning at `y_mm` for `ON_time`.
    Discharge { y_mm: f64 },
    /// Pause for `OFF_time`.
    Off,
}

impl GeneratorPhase {
    pub fn label(&self) -> &'static str {
        match self {
            GeneratorPhase::Open => "open",
            GeneratorPhase::Discharge { .. } => "discharge",
            GeneratorPhase::Off => "off",
        }
    }
}

/// Residual plasma channel after a discharge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IonizedChannel {
    /// [mm]
    pub y_mm: f64,
    /// Deionization time left [µs].
    pub remaining_us: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessState {
    // Time [µs]
    pub time: u64,
    pub time_since_servo: u64,
    pub time_since_spark_ignition: u64,
    pub time_since_spark_end: u64,
    pub time_since_open_voltage: u64,
    pub time_in_critical_temp: u64,

    // Electrical
    /// [V]
    pub voltage: f64,
    /// [A]
    pub current: f64,

    // Generator setpoints
    /// [V]
    pub target_voltage: f64,
    pub current_mode: CurrentMode,
    /// [µs]
    pub on_time: f64,
    /// [µs]
    pub off_time: f64,
    pub generator_phase: GeneratorPhase,

    // Kinematics [µm], [µm/s], unwinding [m/s]
    pub workpiece_position: f64,
    pub wire_position: f64,
    pub wire_velocity: f64,
    pub wire_unwinding_velocity: f64,
    /// Acceleration applied on the last servo update [µm/s²].
    pub servo_acceleration: f64,
    /// Cumulative servo displacement in the gap-closing direction [µm].
    pub servo_travel: f64,

    // Wire thermal [K]
    pub wire_temperature: Vec<f64>,
    /// Mean over the workpiece span; `None` before the first thermal step.
    pub wire_average_temperature: Option<f64>,
    pub thermal_steps: u64,

    // Discharge
    pub spark_status: SparkStatus,
    /// [mm³]
    pub last_crater_volume: f64,

    // Dielectric
    /// [S/m]
    pub dielectric_conductivity: f64,
    /// [K]
    pub dielectric_temperature: f64,
    pub ionized_channel: Option<IonizedChannel>,

    // Debris
    /// [mm³]
    pub debris_volume: f64,
    pub debris_density: f64,
    /// [mm³]
    pub cavity_volume: f64,
    /// Effective flushing fraction.
    pub flow_rate: f64,

    // Flags
    pub is_short_circuit: bool,
    pub is_wire_broken: bool,
    pub is_wire_colliding: bool,
    pub is_target_distance_reached: bool,
    /// Ticks left of a debris or random short [µs].
    pub short_circuit_remaining: u64,

    // Servo command
    pub target_delta: f64,
    /// [µm]
    pub target_position: f64,

    // Totals
    pub spark_count: u64,
    pub short_circuit_count: u64,
    pub crater_count: u64,
    /// [mm³]
    pub removed_volume: f64,
}

impl ProcessState {
    /// State at episode start: zero time, wire at 0, workpiece at the initial
    /// gap, ambient temperatures, no debris, open voltage applied.
    pub fn initial(
        config: &EnvironmentConfig,
        params: &ModuleParams,
        generator: Option<&GeneratorSettings>,
        n_segments: usize,
    ) -> Self {
        let ign = &params.ignition;
        let (target_voltage, current_mode, on_time, off_time) = match generator {
            Some(g) => (g.target_voltage, g.current_mode, g.on_time, g.off_time),
            None => (
                ign.default_target_voltage,
                ign.default_current_mode,
                ign.default_on_time,
                ign.default_off_time,
            ),
        };
        let diel = &params.dielectric;

        Self {
            time: 0,
            time_since_servo: 0,
            time_since_spark_ignition: 0,
            time_since_spark_end: 0,
            time_since_open_voltage: 0,
            time_in_critical_temp: 0,
            voltage: target_voltage,
            current: 0.0,
            target_voltage,
            current_mode,
            on_time,
            off_time,
            generator_phase: GeneratorPhase::Open,
            workpiece_position: config.initial_gap,
            wire_position: 0.0,
            wire_velocity: 0.0,
            wire_unwinding_velocity: params.wire.wire_unwinding_velocity,
            servo_acceleration: 0.0,
            servo_travel: 0.0,
            wire_temperature: vec![params.wire.spool_t; n_segments],
            wire_average_temperature: None,
            thermal_steps: 0,
            spark_status: SparkStatus::None,
            last_crater_volume: 0.0,
            dielectric_conductivity: diel.base_conductivity,
            dielectric_temperature: diel.dielectric_temperature,
            ionized_channel: None,
            debris_volume: 0.0,
            debris_density: 0.0,
            cavity_volume: 0.0,
            flow_rate: 0.0,
            is_short_circuit: false,
            is_wire_broken: false,
            is_wire_colliding: false,
            is_target_distance_reached: false,
            short_circuit_remaining: 0,
            target_delta: 0.0,
            target_position: config.target_position(),
            spark_count: 0,
            short_circuit_count: 0,
            crater_count: 0,
            removed_volume: 0.0,
        }
    }

    /// Gap between wire and cutting frontier [µm]. Negative when the wire intrudes.
    pub fn gap(&self) -> f64 {
        self.workpiece_position - self.wire_position
    }

    pub fn max_wire_temperature(&self) -> Option<f64> {
        self.wire_temperature.iter().copied().reduce(f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state_from_defaults() {
        let config = EnvironmentConfig::default();
        let params = ModuleParams::default();
        let state = ProcessState::initial(&config, &params, None, 400);
        assert_eq!(state.gap(), 50.0);
        assert_eq!(state.target_position, 500.0);
        assert_eq!(state.voltage, 80.0);
        assert_eq!(state.current_mode.to_string(), "I5");
        assert_eq!(state.wire_temperature.len(), 400);
        assert!(state.wire_average_temperature.is_none());
        assert_eq!(state.max_wire_temperature(), Some(293.15));
    }

    #[test]
    fn generator_settings_override_defaults() {
        let config = EnvironmentConfig::default();
        let params = ModuleParams::default();
        let generator = GeneratorSettings {
            target_voltage: 100.0,
            current_mode: "I7".parse().unwrap(),
            on_time: 2.0,
            off_time: 33.0,
        };
        let state = ProcessState::initial(&config, &params, Some(&generator), 10);
        assert_eq!(state.target_voltage, 100.0);
        assert_eq!(state.on_time, 2.0);
        assert_eq!(state.current_mode.peak_current(), 84.0);
    }

    #[test]
    fn spark_status_helpers() {
        let fresh = SparkStatus::Spark {
            y_mm: 4.0,
            fresh: true,
        };
        assert!(fresh.is_fresh_spark());
        assert_eq!(fresh.location(), Some(4.0));
        assert_eq!(SparkStatus::Short.code(), -1.0);
        assert!(!SparkStatus::None.is_fresh_spark());
    }
}

//! Per-module empirical constants.
//!
//! Each record is immutable once an environment is built. Missing fields in a
//! project file take the defaults below.

use serde::{Deserialize, Serialize};

use crate::current::CurrentMode;

/// Spark ignition, short-circuit and generator constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IgnitionParams {
    /// Critical debris density at zero gap.
    pub base_critical_density: f64,
    /// Increase of critical density per µm of gap.
    pub gap_coefficient: f64,
    pub max_critical_density: f64,
    /// Gap [µm] at or below which the gap is always shorted.
    pub hard_short_gap: f64,
    /// Logistic steepness of the debris short tail below critical density.
    pub sigmoid_steepness: f64,
    /// [µs]
    pub debris_short_duration: u64,
    /// [µs]
    pub random_short_duration: u64,
    /// [µm]
    pub random_short_min_gap: f64,
    /// [µm]
    pub random_short_max_gap: f64,
    /// Probability per µs at `random_short_min_gap`.
    pub random_short_max_probability: f64,
    /// Median ignition delay [µs] is `a·g² + b·g + c` with `g` in µm.
    pub ignition_a_coeff: f64,
    pub ignition_b_coeff: f64,
    pub ignition_c_coeff: f64,
    /// [V]
    pub default_target_voltage: f64,
    /// [µs]
    pub default_on_time: f64,
    /// [µs]
    pub default_off_time: f64,
    pub default_current_mode: CurrentMode,
    /// Discharge voltage as a fraction of the open voltage.
    pub spark_voltage_factor: f64,
    /// [V]
    pub short_circuit_voltage: f64,
    /// [A]
    pub max_short_current: f64,
}

impl Default for IgnitionParams {
    fn default() -> Self {
        Self {
            base_critical_density: 0.3,
            gap_coefficient: 0.02,
            max_critical_density: 0.95,
            hard_short_gap: 2.0,
            sigmoid_steepness: 500.0,
            debris_short_duration: 50,
            random_short_duration: 100,
            random_short_min_gap: 2.0,
            random_short_max_gap: 50.0,
            random_short_max_probability: 0.0,
            ignition_a_coeff: 0.48,
            ignition_b_coeff: -3.69,
            ignition_c_coeff: 14.05,
            default_target_voltage: 80.0,
            default_on_time: 3.0,
            default_off_time: 80.0,
            default_current_mode: CurrentMode::default(),
            spark_voltage_factor: 0.3,
            short_circuit_voltage: 0.0,
            max_short_current: 100.0,
        }
    }
}

impl IgnitionParams {
    /// Critical debris density for a gap [µm], capped at `max_critical_density`.
    pub fn critical_density(&self, gap: f64) -> f64 {
        (self.base_critical_density + self.gap_coefficient * gap).min(self.max_critical_density)
    }

    /// Gap [µm] below which the delay polynomial is held at its minimum.
    pub fn delay_vertex(&self) -> f64 {
        if self.ignition_a_coeff > 0.0 {
            (-self.ignition_b_coeff / (2.0 * self.ignition_a_coeff)).max(0.0)
        } else {
            0.0
        }
    }

    /// Median ignition delay [µs] at a gap [µm].
    pub fn median_delay(&self, gap: f64) -> f64 {
        let g = gap.max(self.delay_vertex());
        self.ignition_a_coeff * g * g + self.ignition_b_coeff * g + self.ignition_c_coeff
    }
}

/// Wire geometry and heat transfer constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WireParams {
    /// [mm]
    pub buffer_len_bottom: f64,
    /// [mm]
    pub buffer_len_top: f64,
    /// [mm]
    pub segment_len: f64,
    /// Spool temperature, both wire ends [K].
    #[serde(rename = "spool_T")]
    pub spool_t: f64,
    /// Lower contact distance below the workpiece [mm].
    pub contact_offset_bottom: f64,
    /// Upper contact distance above the workpiece [mm].
    pub contact_offset_top: f64,
    /// [W/(m²·K)]
    pub base_convection_coefficient: f64,
    pub plasma_efficiency: f64,
    pub convection_velocity_factor: f64,
    pub convection_flow_enhancement: f64,
    pub compute_zone_mean: bool,
    pub zone_mean_interval: u64,
    /// Fraction of the melting point counted as critical.
    pub critical_temp_threshold: f64,
    pub wire_breaking_temp_factor: f64,
    /// Time above critical temperature that parts the wire [µs].
    pub critical_temp_duration: u64,
    /// Initial wire unwinding speed [m/s].
    pub wire_unwinding_velocity: f64,
}

impl Default for WireParams {
    fn default() -> Self {
        Self {
            buffer_len_bottom: 30.0,
            buffer_len_top: 30.0,
            segment_len: 0.2,
            spool_t: 293.15,
            contact_offset_bottom: 10.0,
            contact_offset_top: 10.0,
            base_convection_coefficient: 14_000.0,
            plasma_efficiency: 0.1,
            convection_velocity_factor: 0.5,
            convection_flow_enhancement: 1.0,
            compute_zone_mean: false,
            zone_mean_interval: 100,
            critical_temp_threshold: 0.9,
            wire_breaking_temp_factor: 1.1,
            critical_temp_duration: 1000,
            wire_unwinding_velocity: 0.2,
        }
    }
}

/// Crater model constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialParams {
    /// Kerf overcut per side [mm].
    pub base_overcut: f64,
    /// Median crater volume at the reference pulse [µm³].
    pub crater_volume_median: f64,
    /// Log-normal shape parameter.
    pub crater_volume_sigma: f64,
    /// [A]
    pub reference_current: f64,
    /// [µs]
    pub reference_on_time: f64,
    /// Exponent on the pulse energy ratio.
    pub energy_exponent: f64,
}

impl Default for MaterialParams {
    fn default() -> Self {
        Self {
            base_overcut: 0.12,
            crater_volume_median: 1.0e4,
            crater_volume_sigma: 0.5,
            reference_current: 60.0,
            reference_on_time: 3.0,
            energy_exponent: 1.0,
        }
    }
}

/// Flushing and debris transport constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DielectricParams {
    /// Pump capacity [mm³/s].
    pub base_flow_rate: f64,
    pub debris_removal_efficiency: f64,
    pub debris_obstruction_coeff: f64,
    /// [µm]
    pub reference_gap: f64,
    /// [K]
    pub dielectric_temperature: f64,
    /// [µs]
    pub ion_channel_duration: u64,
    /// Flow fraction below which no debris is flushed.
    pub min_flow_fraction: f64,
    /// Debris volume [mm³] the flow cannot clear.
    pub residual_debris_volume: f64,
    /// Clean dielectric conductivity [S/m].
    pub base_conductivity: f64,
    pub debris_conductivity_coeff: f64,
}

impl Default for DielectricParams {
    fn default() -> Self {
        Self {
            base_flow_rate: 100.0,
            debris_removal_efficiency: 0.01,
            debris_obstruction_coeff: 1.0,
            reference_gap: 25.0,
            dielectric_temperature: 293.15,
            ion_channel_duration: 6,
            min_flow_fraction: 0.001,
            residual_debris_volume: 0.001,
            base_conductivity: 5.0e-4,
            debris_conductivity_coeff: 10.0,
        }
    }
}

/// Which body the servo moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServoAxis {
    #[default]
    Wire,
    Workpiece,
}

/// Feed-axis servo constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MechanicsParams {
    /// [rad/s]
    pub omega_n: f64,
    pub zeta: f64,
    /// [µm/s²]
    pub max_acceleration: f64,
    /// [µm/s³]
    pub max_jerk: f64,
    /// [µm/s]
    pub max_speed: f64,
    pub axis: ServoAxis,
}

impl Default for MechanicsParams {
    fn default() -> Self {
        Self {
            omega_n: 235.0,
            zeta: 0.38,
            max_acceleration: 3.0e5,
            max_jerk: 1.0e8,
            max_speed: 3.0e4,
            axis: ServoAxis::Wire,
        }
    }
}

/// The five parameter records together.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleParams {
    pub ignition: IgnitionParams,
    pub wire: WireParams,
    pub material: MaterialParams,
    pub dielectric: DielectricParams,
    pub mechanics: MechanicsParams,
}

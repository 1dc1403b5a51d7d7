//! Configuration validation. Values are rejected, never clamped.

use wedm_materials::MaterialDatabase;

use crate::params::{
    DielectricParams, IgnitionParams, MaterialParams, MechanicsParams, ModuleParams, WireParams,
};
use crate::schema::{ControllerSettings, EnvironmentConfig, GeneratorSettings, Project};

/// Lowest admissible maximum wire temperature [K].
const ROOM_TEMPERATURE_K: f64 = wedm_core::constants::ROOM_TEMPERATURE_K;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported wire material '{name}'")]
    UnknownMaterial { name: String },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

fn invalid(field: &str, value: impl ToString, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn positive(field: &str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, value, "must be positive and finite"))
    }
}

fn non_negative(field: &str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(field, value, "must be non-negative and finite"))
    }
}

fn fraction(field: &str, value: f64) -> Result<(), ValidationError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(field, value, "must lie in [0, 1]"))
    }
}

fn finite(field: &str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(invalid(field, value, "must be finite"))
    }
}

fn at_least_one(field: &str, value: u64) -> Result<(), ValidationError> {
    if value >= 1 {
        Ok(())
    } else {
        Err(invalid(field, value, "must be at least 1"))
    }
}

impl EnvironmentConfig {
    /// Check dimensions, timing and that the wire material is known.
    pub fn validate(&self, materials: &MaterialDatabase) -> Result<(), ValidationError> {
        positive("environment.workpiece_height", self.workpiece_height)?;
        positive("environment.wire_diameter", self.wire_diameter)?;
        at_least_one("environment.dt", self.dt)?;
        at_least_one("environment.servo_interval", self.servo_interval)?;
        positive("environment.initial_gap", self.initial_gap)?;
        positive(
            "environment.target_cutting_distance",
            self.target_cutting_distance,
        )?;
        if !(self.max_wire_temperature.is_finite()
            && self.max_wire_temperature > ROOM_TEMPERATURE_K)
        {
            return Err(invalid(
                "environment.max_wire_temperature",
                self.max_wire_temperature,
                "must exceed room temperature (293.15 K)",
            ));
        }
        non_negative(
            "environment.min_gap_for_operation",
            self.min_gap_for_operation,
        )?;
        if !materials.contains(&self.wire_material) {
            return Err(ValidationError::UnknownMaterial {
                name: self.wire_material.clone(),
            });
        }
        Ok(())
    }
}

impl IgnitionParams {
    pub fn validate(&self) -> Result<(), ValidationError> {
        non_negative("ignition.base_critical_density", self.base_critical_density)?;
        finite("ignition.gap_coefficient", self.gap_coefficient)?;
        fraction("ignition.max_critical_density", self.max_critical_density)?;
        non_negative("ignition.hard_short_gap", self.hard_short_gap)?;
        positive("ignition.sigmoid_steepness", self.sigmoid_steepness)?;
        at_least_one("ignition.debris_short_duration", self.debris_short_duration)?;
        at_least_one("ignition.random_short_duration", self.random_short_duration)?;
        non_negative("ignition.random_short_min_gap", self.random_short_min_gap)?;
        finite("ignition.random_short_max_gap", self.random_short_max_gap)?;
        if self.random_short_max_gap <= self.random_short_min_gap {
            return Err(invalid(
                "ignition.random_short_max_gap",
                self.random_short_max_gap,
                "must exceed random_short_min_gap",
            ));
        }
        fraction(
            "ignition.random_short_max_probability",
            self.random_short_max_probability,
        )?;

        non_negative("ignition.ignition_a_coeff", self.ignition_a_coeff)?;
        finite("ignition.ignition_b_coeff", self.ignition_b_coeff)?;
        finite("ignition.ignition_c_coeff", self.ignition_c_coeff)?;
        if self.ignition_a_coeff == 0.0 && self.ignition_b_coeff < 0.0 {
            return Err(invalid(
                "ignition.ignition_b_coeff",
                self.ignition_b_coeff,
                "must be non-negative when ignition_a_coeff is zero",
            ));
        }
        let min_delay = self.median_delay(0.0);
        if !(min_delay.is_finite() && min_delay > 0.0) {
            return Err(invalid(
                "ignition.ignition_c_coeff",
                min_delay,
                "ignition delay polynomial must stay positive",
            ));
        }

        positive("ignition.default_target_voltage", self.default_target_voltage)?;
        positive("ignition.default_on_time", self.default_on_time)?;
        non_negative("ignition.default_off_time", self.default_off_time)?;
        fraction("ignition.spark_voltage_factor", self.spark_voltage_factor)?;
        non_negative("ignition.short_circuit_voltage", self.short_circuit_voltage)?;
        positive("ignition.max_short_current", self.max_short_current)?;
        Ok(())
    }
}

impl WireParams {
    pub fn validate(&self) -> Result<(), ValidationError> {
        non_negative("wire.buffer_len_bottom", self.buffer_len_bottom)?;
        non_negative("wire.buffer_len_top", self.buffer_len_top)?;
        positive("wire.segment_len", self.segment_len)?;
        positive("wire.spool_T", self.spool_t)?;
        non_negative("wire.contact_offset_bottom", self.contact_offset_bottom)?;
        non_negative("wire.contact_offset_top", self.contact_offset_top)?;
        non_negative(
            "wire.base_convection_coefficient",
            self.base_convection_coefficient,
        )?;
        fraction("wire.plasma_efficiency", self.plasma_efficiency)?;
        finite("wire.convection_velocity_factor", self.convection_velocity_factor)?;
        non_negative(
            "wire.convection_flow_enhancement",
            self.convection_flow_enhancement,
        )?;
        at_least_one("wire.zone_mean_interval", self.zone_mean_interval)?;
        if !(self.critical_temp_threshold > 0.0 && self.critical_temp_threshold <= 1.0) {
            return Err(invalid(
                "wire.critical_temp_threshold",
                self.critical_temp_threshold,
                "must lie in (0, 1]",
            ));
        }
        positive("wire.wire_breaking_temp_factor", self.wire_breaking_temp_factor)?;
        at_least_one("wire.critical_temp_duration", self.critical_temp_duration)?;
        finite("wire.wire_unwinding_velocity", self.wire_unwinding_velocity)?;
        Ok(())
    }
}

impl MaterialParams {
    pub fn validate(&self) -> Result<(), ValidationError> {
        non_negative("material.base_overcut", self.base_overcut)?;
        positive("material.crater_volume_median", self.crater_volume_median)?;
        non_negative("material.crater_volume_sigma", self.crater_volume_sigma)?;
        positive("material.reference_current", self.reference_current)?;
        positive("material.reference_on_time", self.reference_on_time)?;
        finite("material.energy_exponent", self.energy_exponent)?;
        Ok(())
    }
}

impl DielectricParams {
    pub fn validate(&self) -> Result<(), ValidationError> {
        non_negative("dielectric.base_flow_rate", self.base_flow_rate)?;
        fraction(
            "dielectric.debris_removal_efficiency",
            self.debris_removal_efficiency,
        )?;
        non_negative(
            "dielectric.debris_obstruction_coeff",
            self.debris_obstruction_coeff,
        )?;
        positive("dielectric.reference_gap", self.reference_gap)?;
        positive("dielectric.dielectric_temperature", self.dielectric_temperature)?;
        fraction("dielectric.min_flow_fraction", self.min_flow_fraction)?;
        non_negative(
            "dielectric.residual_debris_volume",
            self.residual_debris_volume,
        )?;
        non_negative("dielectric.base_conductivity", self.base_conductivity)?;
        non_negative(
            "dielectric.debris_conductivity_coeff",
            self.debris_conductivity_coeff,
        )?;
        Ok(())
    }
}

impl MechanicsParams {
    pub fn validate(&self) -> Result<(), ValidationError> {
        positive("mechanics.omega_n", self.omega_n)?;
        non_negative("mechanics.zeta", self.zeta)?;
        positive("mechanics.max_acceleration", self.max_acceleration)?;
        positive("mechanics.max_jerk", self.max_jerk)?;
        positive("mechanics.max_speed", self.max_speed)?;
        Ok(())
    }
}

impl ModuleParams {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.ignition.validate()?;
        self.wire.validate()?;
        self.material.validate()?;
        self.dielectric.validate()?;
        self.mechanics.validate()?;
        Ok(())
    }
}

impl GeneratorSettings {
    pub fn validate(&self) -> Result<(), ValidationError> {
        non_negative("generator.target_voltage", self.target_voltage)?;
        positive("generator.on_time", self.on_time)?;
        non_negative("generator.off_time", self.off_time)?;
        Ok(())
    }
}

impl ControllerSettings {
    pub fn validate(&self) -> Result<(), ValidationError> {
        non_negative("controller.target_voltage", self.target_voltage)?;
        positive("controller.window_us", self.window_us)?;
        Ok(())
    }
}

/// Validate against the built-in material database.
pub fn validate_project(project: &Project) -> Result<(), ValidationError> {
    validate_project_with(project, &MaterialDatabase::builtin())
}

pub fn validate_project_with(
    project: &Project,
    materials: &MaterialDatabase,
) -> Result<(), ValidationError> {
    if project.version == 0 || project.version > crate::schema::LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: project.version,
        });
    }
    project.environment.validate(materials)?;
    project.modules.validate()?;
    if let Some(generator) = &project.generator {
        generator.validate()?;
    }
    project.controller.validate()?;
    Ok(())
}

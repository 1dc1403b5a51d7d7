//! Project file and environment configuration schema.

use serde::{Deserialize, Serialize};
use wedm_controls::ServoMode;

use crate::current::CurrentMode;
use crate::params::ModuleParams;

pub const LATEST_VERSION: u32 = 1;

/// Fixed physical setup of one environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    /// [mm]
    pub workpiece_height: f64,
    /// [mm]
    pub wire_diameter: f64,
    pub wire_material: String,
    /// Simulation step [µs].
    pub dt: u64,
    /// Servo update period [µs].
    pub servo_interval: u64,
    /// [µm]
    pub initial_gap: f64,
    /// [µm]
    pub target_cutting_distance: f64,
    /// [K]
    pub max_wire_temperature: f64,
    /// [µm]
    pub min_gap_for_operation: f64,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            workpiece_height: 20.0,
            wire_diameter: 0.2,
            wire_material: "brass".to_string(),
            dt: 1,
            servo_interval: 1000,
            initial_gap: 50.0,
            target_cutting_distance: 500.0,
            max_wire_temperature: 1500.0,
            min_gap_for_operation: 2.0,
        }
    }
}

impl EnvironmentConfig {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Dictionary form, one key per field.
    pub fn to_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// Wire radius [mm].
    pub fn wire_radius(&self) -> f64 {
        self.wire_diameter / 2.0
    }

    /// Frontier position, measured from the initial wire position, at which
    /// the cut is complete [µm].
    pub fn target_position(&self) -> f64 {
        self.target_cutting_distance
    }
}

/// Generator setpoints applied at reset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorSettings {
    /// [V]
    pub target_voltage: f64,
    pub current_mode: CurrentMode,
    /// [µs]
    pub on_time: f64,
    /// [µs]
    pub off_time: f64,
}

/// Reference gap-voltage policy used by batch and CLI runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerSettings {
    /// Mean gap voltage setpoint [V].
    pub target_voltage: f64,
    /// Averaging window [µs].
    pub window_us: f64,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            target_voltage: 30.0,
            window_us: 1000.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub version: u32,
    pub name: String,
    #[serde(default)]
    pub environment: EnvironmentConfig,
    #[serde(default)]
    pub modules: ModuleParams,
    #[serde(default)]
    pub control_mode: ServoMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generator: Option<GeneratorSettings>,
    #[serde(default)]
    pub controller: ControllerSettings,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            version: LATEST_VERSION,
            name: name.into(),
            environment: EnvironmentConfig::default(),
            modules: ModuleParams::default(),
            control_mode: ServoMode::default(),
            seed: None,
            generator: None,
            controller: ControllerSettings::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_json_roundtrip() {
        let config = EnvironmentConfig {
            workpiece_height: 5.0,
            initial_gap: 35.5,
            ..EnvironmentConfig::default()
        };
        let json = config.to_json().unwrap();
        assert_eq!(EnvironmentConfig::from_json(&json).unwrap(), config);

        let value = config.to_value().unwrap();
        assert_eq!(value["dt"], 1);
        assert_eq!(value["wire_material"], "brass");
        assert_eq!(EnvironmentConfig::from_value(value).unwrap(), config);
    }

    #[test]
    fn partial_environment_uses_defaults() {
        let config = EnvironmentConfig::from_json(r#"{"workpiece_height": 5.0}"#).unwrap();
        assert_eq!(config.workpiece_height, 5.0);
        assert_eq!(config.servo_interval, 1000);
        assert_eq!(config.target_position(), 500.0);
    }

    #[test]
    fn minimal_project_yaml() {
        let project: Project = serde_yaml::from_str("version: 1\nname: demo\n").unwrap();
        assert_eq!(project, Project::new("demo"));
    }
}

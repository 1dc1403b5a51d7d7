//! Named access to every process-state field for recorders.

use serde::{Deserialize, Serialize};

use crate::state::ProcessState;

/// One sampled signal value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SignalValue {
    Scalar(f64),
    Flag(bool),
    Field(Vec<f64>),
    Text(String),
    Empty,
}

impl SignalValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SignalValue::Scalar(v) => Some(*v),
            SignalValue::Flag(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }
}

impl From<f64> for SignalValue {
    fn from(v: f64) -> Self {
        SignalValue::Scalar(v)
    }
}

impl From<u64> for SignalValue {
    fn from(v: u64) -> Self {
        SignalValue::Scalar(v as f64)
    }
}

impl From<bool> for SignalValue {
    fn from(v: bool) -> Self {
        SignalValue::Flag(v)
    }
}

impl From<Option<f64>> for SignalValue {
    fn from(v: Option<f64>) -> Self {
        v.map_or(SignalValue::Empty, SignalValue::Scalar)
    }
}

/// Stable names accepted by [`ProcessState::signal`].
pub const SIGNAL_NAMES: &[&str] = &[
    "time",
    "time_since_servo",
    "time_since_spark_ignition",
    "time_since_spark_end",
    "time_since_open_voltage",
    "time_in_critical_temp",
    "voltage",
    "current",
    "target_voltage",
    "current_mode",
    "ON_time",
    "OFF_time",
    "generator_phase",
    "workpiece_position",
    "wire_position",
    "wire_velocity",
    "wire_unwinding_velocity",
    "servo_acceleration",
    "servo_travel",
    "wire_temperature",
    "wire_average_temperature",
    "spark_status",
    "spark_location",
    "last_crater_volume",
    "dielectric_conductivity",
    "dielectric_temperature",
    "ionized_channel",
    "debris_volume",
    "debris_density",
    "cavity_volume",
    "flow_rate",
    "is_short_circuit",
    "is_wire_broken",
    "is_wire_colliding",
    "is_target_distance_reached",
    "target_delta",
    "target_position",
    "spark_count",
    "short_circuit_count",
    "crater_count",
    "removed_volume",
    "gap_width",
];

pub fn is_signal_name(name: &str) -> bool {
    SIGNAL_NAMES.contains(&name)
}

impl ProcessState {
    /// Sample one field by name. `None` for unknown names.
    pub fn signal(&self, name: &str) -> Option<SignalValue> {
        let value: SignalValue = match name {
            "time" => self.time.into(),
            "time_since_servo" => self.time_since_servo.into(),
            "time_since_spark_ignition" => self.time_since_spark_ignition.into(),
            "time_since_spark_end" => self.time_since_spark_end.into(),
            "time_since_open_voltage" => self.time_since_open_voltage.into(),
            "time_in_critical_temp" => self.time_in_critical_temp.into(),
            "voltage" => self.voltage.into(),
            "current" => self.current.into(),
            "target_voltage" => self.target_voltage.into(),
            "current_mode" => SignalValue::Text(self.current_mode.to_string()),
            "ON_time" => self.on_time.into(),
            "OFF_time" => self.off_time.into(),
            "generator_phase" => SignalValue::Text(self.generator_phase.label().to_string()),
            "workpiece_position" => self.workpiece_position.into(),
            "wire_position" => self.wire_position.into(),
            "wire_velocity" => self.wire_velocity.into(),
            "wire_unwinding_velocity" => self.wire_unwinding_velocity.into(),
            "servo_acceleration" => self.servo_acceleration.into(),
            "servo_travel" => self.servo_travel.into(),
            "wire_temperature" => SignalValue::Field(self.wire_temperature.clone()),
            "wire_average_temperature" => self.wire_average_temperature.into(),
            "spark_status" => self.spark_status.code().into(),
            "spark_location" => self.spark_status.location().into(),
            "last_crater_volume" => self.last_crater_volume.into(),
            "dielectric_conductivity" => self.dielectric_conductivity.into(),
            "dielectric_temperature" => self.dielectric_temperature.into(),
            "ionized_channel" => match self.ionized_channel {
                Some(ch) => SignalValue::Field(vec![ch.y_mm, ch.remaining_us as f64]),
                None => SignalValue::Empty,
            },
            "debris_volume" => self.debris_volume.into(),
            "debris_density" => self.debris_density.into(),
            "cavity_volume" => self.cavity_volume.into(),
            "flow_rate" => self.flow_rate.into(),
            "is_short_circuit" => self.is_short_circuit.into(),
            "is_wire_broken" => self.is_wire_broken.into(),
            "is_wire_colliding" => self.is_wire_colliding.into(),
            "is_target_distance_reached" => self.is_target_distance_reached.into(),
            "target_delta" => self.target_delta.into(),
            "target_position" => self.target_position.into(),
            "spark_count" => self.spark_count.into(),
            "short_circuit_count" => self.short_circuit_count.into(),
            "crater_count" => self.crater_count.into(),
            "removed_volume" => self.removed_volume.into(),
            "gap_width" => self.gap().into(),
            _ => return None,
        };
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wedm_project::{EnvironmentConfig, ModuleParams};

    fn state() -> ProcessState {
        ProcessState::initial(&EnvironmentConfig::default(), &ModuleParams::default(), None, 5)
    }

    #[test]
    fn every_listed_name_resolves() {
        let s = state();
        for name in SIGNAL_NAMES {
            assert!(s.signal(name).is_some(), "missing signal {name}");
        }
        assert!(s.signal("not_a_signal").is_none());
    }

    #[test]
    fn values_and_serialization() {
        let s = state();
        assert_eq!(s.signal("gap_width"), Some(SignalValue::Scalar(50.0)));
        assert_eq!(s.signal("ON_time"), Some(SignalValue::Scalar(3.0)));
        assert_eq!(s.signal("wire_average_temperature"), Some(SignalValue::Empty));
        assert_eq!(s.signal("is_wire_broken").and_then(|v| v.as_f64()), Some(0.0));

        let json = serde_json::to_string(&s.signal("current_mode").unwrap()).unwrap();
        assert_eq!(json, "\"I5\"");
        let json = serde_json::to_string(&SignalValue::Empty).unwrap();
        assert_eq!(json, "null");
    }
}

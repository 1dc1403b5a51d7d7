//! Result data types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use wedm_sim::{EpisodeSummary, SignalValue, WireEdmEnv};

pub type RunId = String;

/// Geometry and timing needed to interpret a recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    /// [mm]
    pub wire_diameter: f64,
    /// [µm]
    pub initial_gap: f64,
    /// [mm]
    pub workpiece_height: f64,
    /// [mm]
    pub base_overcut: f64,
    /// [µs]
    pub dt: u64,
    /// [µs]
    pub servo_interval: u64,
    pub seed: u64,
}

impl RunMetadata {
    pub fn from_env(env: &WireEdmEnv) -> Self {
        let config = env.config();
        Self {
            wire_diameter: config.wire_diameter,
            initial_gap: config.initial_gap,
            workpiece_height: config.workpiece_height,
            base_overcut: env.params().material.base_overcut,
            dt: config.dt,
            servo_interval: config.servo_interval,
            seed: env.seed(),
        }
    }
}

/// Time-aligned signal samples: every series has one entry per `time` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub metadata: RunMetadata,
    /// [µs]
    pub time: Vec<u64>,
    pub signals: BTreeMap<String, Vec<SignalValue>>,
}

impl RunRecord {
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn series(&self, name: &str) -> Option<&[SignalValue]> {
        self.signals.get(name).map(Vec::as_slice)
    }

    /// Numeric view of a scalar or flag series; non-numeric samples become NaN.
    pub fn scalar_series(&self, name: &str) -> Option<Vec<f64>> {
        self.series(name).map(|values| {
            values
                .iter()
                .map(|v| v.as_f64().unwrap_or(f64::NAN))
                .collect()
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub run_id: RunId,
    pub project_name: String,
    /// RFC 3339
    pub timestamp: String,
    pub seed: u64,
    pub max_steps: u64,
    pub summary: RunSummary,
    pub solver_version: String,
}

/// Stored copy of an episode summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub steps: u64,
    pub terminal_reason: String,
    /// [µs]
    pub time: u64,
    pub spark_count: u64,
    pub short_circuit_count: u64,
    /// [mm³]
    pub removed_volume: f64,
    /// [µm]
    pub workpiece_position: f64,
    /// [µm]
    pub wire_position: f64,
}

impl From<&EpisodeSummary> for RunSummary {
    fn from(s: &EpisodeSummary) -> Self {
        Self {
            steps: s.steps,
            terminal_reason: s.reason.label().to_string(),
            time: s.time,
            spark_count: s.spark_count,
            short_circuit_count: s.short_circuit_count,
            removed_volume: s.removed_volume,
            workpiece_position: s.workpiece_position,
            wire_position: s.wire_position,
        }
    }
}

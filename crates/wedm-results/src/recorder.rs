//! Sampling of named process signals during an episode.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use wedm_sim::{ProcessState, SIGNAL_NAMES, StepOutcome, is_signal_name};

use crate::types::{RunMetadata, RunRecord};
use crate::{ResultsError, ResultsResult};

/// When the recorder takes a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SampleSchedule {
    EveryStep,
    /// Ticks on which the servo ran.
    #[default]
    ControlStep,
    /// Every `steps`-th tick.
    Interval { steps: u64 },
}

#[derive(Debug, Clone)]
pub struct Recorder {
    names: Vec<String>,
    schedule: SampleSchedule,
    ticks: u64,
    record: RunRecord,
}

impl Recorder {
    /// # Errors
    ///
    /// Returns [`ResultsError::UnknownSignal`] for a name the process state
    /// does not export, or [`ResultsError::InvalidSchedule`] for a zero interval.
    pub fn new<I, S>(names: I, schedule: SampleSchedule, metadata: RunMetadata) -> ResultsResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if schedule == (SampleSchedule::Interval { steps: 0 }) {
            return Err(ResultsError::InvalidSchedule {
                what: "interval must be at least one step",
            });
        }
        let mut seen = BTreeSet::new();
        let names: Vec<String> = names
            .into_iter()
            .map(Into::into)
            .filter(|n: &String| seen.insert(n.clone()))
            .collect();
        if let Some(bad) = names.iter().find(|n| !is_signal_name(n)) {
            return Err(ResultsError::UnknownSignal { name: bad.clone() });
        }
        let signals = names.iter().map(|n| (n.clone(), Vec::new())).collect();
        Ok(Self {
            names,
            schedule,
            ticks: 0,
            record: RunRecord {
                metadata,
                time: Vec::new(),
                signals,
            },
        })
    }

    /// Recorder over every exported signal.
    pub fn all_signals(schedule: SampleSchedule, metadata: RunMetadata) -> ResultsResult<Self> {
        Self::new(SIGNAL_NAMES.iter().copied(), schedule, metadata)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.record.len()
    }

    pub fn is_empty(&self) -> bool {
        self.record.is_empty()
    }

    /// Take a sample regardless of the schedule.
    pub fn sample(&mut self, state: &ProcessState) {
        self.record.time.push(state.time);
        for name in &self.names {
            if let (Some(series), Some(value)) =
                (self.record.signals.get_mut(name), state.signal(name))
            {
                series.push(value);
            }
        }
    }

    /// Feed one committed tick; samples when the schedule says so.
    pub fn observe(&mut self, state: &ProcessState, outcome: &StepOutcome) {
        self.ticks += 1;
        let due = match self.schedule {
            SampleSchedule::EveryStep => true,
            SampleSchedule::ControlStep => outcome.control_step,
            SampleSchedule::Interval { steps } => self.ticks % steps == 0,
        };
        if due {
            self.sample(state);
        }
    }

    pub fn finish(self) -> RunRecord {
        self.record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wedm_sim::DoneFlags;

    fn metadata() -> RunMetadata {
        RunMetadata {
            wire_diameter: 0.2,
            initial_gap: 50.0,
            workpiece_height: 20.0,
            base_overcut: 0.12,
            dt: 1,
            servo_interval: 1000,
            seed: 0,
        }
    }

    fn state(time: u64) -> ProcessState {
        let mut s = ProcessState::initial(
            &wedm_project::EnvironmentConfig::default(),
            &wedm_project::ModuleParams::default(),
            None,
            4,
        );
        s.time = time;
        s
    }

    fn outcome(control_step: bool) -> StepOutcome {
        StepOutcome {
            flags: DoneFlags::default(),
            control_step,
            time: 0,
        }
    }

    #[test]
    fn unknown_names_are_rejected() {
        let err = Recorder::new(["voltage", "flux_capacitor"], SampleSchedule::EveryStep, metadata())
            .unwrap_err();
        assert!(matches!(err, ResultsError::UnknownSignal { name } if name == "flux_capacitor"));
    }

    #[test]
    fn zero_interval_is_rejected() {
        let result = Recorder::new(["voltage"], SampleSchedule::Interval { steps: 0 }, metadata());
        assert!(matches!(result, Err(ResultsError::InvalidSchedule { .. })));
    }

    #[test]
    fn interval_schedule() {
        let mut rec =
            Recorder::new(["voltage", "gap_width"], SampleSchedule::Interval { steps: 3 }, metadata())
                .unwrap();
        for t in 1..=10 {
            rec.observe(&state(t), &outcome(false));
        }
        let record = rec.finish();
        assert_eq!(record.time, vec![3, 6, 9]);
        assert_eq!(record.series("voltage").unwrap().len(), 3);
        assert_eq!(record.scalar_series("gap_width").unwrap(), vec![50.0; 3]);
    }

    #[test]
    fn control_step_schedule() {
        let mut rec = Recorder::new(["time"], SampleSchedule::ControlStep, metadata()).unwrap();
        rec.sample(&state(0));
        rec.observe(&state(1), &outcome(false));
        rec.observe(&state(2), &outcome(true));
        assert_eq!(rec.finish().time, vec![0, 2]);
    }

    #[test]
    fn all_signals_are_aligned() {
        let mut rec = Recorder::all_signals(SampleSchedule::EveryStep, metadata()).unwrap();
        for t in 0..4 {
            rec.observe(&state(t), &outcome(false));
        }
        let record = rec.finish();
        assert_eq!(record.signals.len(), SIGNAL_NAMES.len());
        assert!(record.signals.values().all(|s| s.len() == record.len()));
    }
}

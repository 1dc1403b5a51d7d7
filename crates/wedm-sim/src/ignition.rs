//! Spark ignition and short-circuit model.
//!
//! Per tick, in order of precedence:
//! 1. hard short when the gap is at or below `hard_short_gap` (negative gaps included),
//! 2. continuation of an active debris or random short,
//! 3. a new debris short (certain at or above the critical density, logistic tail below),
//! 4. a new random short (linear in gap between the configured bounds),
//! 5. the generator cycle: open voltage with Poisson ignition trials,
//!    discharge for `ON_time`, pause for `OFF_time`.

use rand::Rng;
use tracing::debug;
use wedm_core::{logistic, poisson_step_probability};
use wedm_project::IgnitionParams;

use crate::error::SimResult;
use crate::module::{ProcessModule, StepContext, draw};
use crate::state::{GeneratorPhase, ProcessState, SparkStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortKind {
    Hard,
    Continuing,
    Debris,
    Random,
}

#[derive(Debug, Clone)]
pub struct Ignition {
    params: IgnitionParams,
    workpiece_height: f64,
}

impl Ignition {
    pub fn new(params: IgnitionParams, workpiece_height: f64) -> Self {
        Self {
            params,
            workpiece_height,
        }
    }

    pub fn params(&self) -> &IgnitionParams {
        &self.params
    }

    /// Debris short probability for one tick.
    pub fn debris_short_probability(&self, gap: f64, debris_density: f64) -> f64 {
        let critical = self.params.critical_density(gap);
        if debris_density >= critical {
            1.0
        } else {
            logistic(self.params.sigmoid_steepness * (debris_density - critical))
        }
    }

    /// Random short probability per µs.
    pub fn random_short_probability(&self, gap: f64) -> f64 {
        let p = &self.params;
        if gap >= p.random_short_max_gap {
            0.0
        } else if gap <= p.random_short_min_gap {
            p.random_short_max_probability
        } else {
            let span = p.random_short_max_gap - p.random_short_min_gap;
            p.random_short_max_probability * (1.0 - (gap - p.random_short_min_gap) / span)
        }
    }

    /// Breakdown rate [1/µs] at open voltage `voltage` across `gap` µm.
    pub fn ignition_rate(&self, gap: f64, voltage: f64) -> f64 {
        let delay = self.params.median_delay(gap);
        if delay <= 0.0 || voltage <= 0.0 {
            return 0.0;
        }
        std::f64::consts::LN_2 / delay * (voltage / self.params.default_target_voltage)
    }

    /// Probability of breakdown within one tick of `dt_us`.
    pub fn ignition_probability(&self, gap: f64, voltage: f64, dt_us: u64) -> f64 {
        poisson_step_probability(self.ignition_rate(gap, voltage), dt_us as f64)
    }

    fn detect_short(
        &self,
        state: &mut ProcessState,
        ctx: &mut StepContext<'_>,
    ) -> Option<ShortKind> {
        let p = &self.params;
        let gap = state.gap();

        if gap <= p.hard_short_gap {
            return Some(ShortKind::Hard);
        }
        if state.short_circuit_remaining > 0 {
            state.short_circuit_remaining = state.short_circuit_remaining.saturating_sub(ctx.dt_us);
            return Some(ShortKind::Continuing);
        }
        if draw(ctx.rng, self.debris_short_probability(gap, state.debris_density)) {
            state.short_circuit_remaining = p.debris_short_duration.saturating_sub(ctx.dt_us);
            return Some(ShortKind::Debris);
        }
        let per_us = self.random_short_probability(gap);
        let per_tick = 1.0 - (1.0 - per_us).powf(ctx.dt_us as f64);
        if draw(ctx.rng, per_tick) {
            state.short_circuit_remaining = p.random_short_duration.saturating_sub(ctx.dt_us);
            return Some(ShortKind::Random);
        }
        None
    }

    fn apply_short(&self, state: &mut ProcessState, kind: ShortKind) {
        if !state.is_short_circuit {
            state.short_circuit_count += 1;
        }
        if kind != ShortKind::Continuing {
            debug!(?kind, time = state.time, gap = state.gap(), "short circuit");
        }
        state.is_short_circuit = true;
        if matches!(state.generator_phase, GeneratorPhase::Discharge { .. }) {
            state.generator_phase = GeneratorPhase::Off;
            state.time_since_spark_end = 0;
        }
        state.spark_status = SparkStatus::Short;
        state.voltage = self.params.short_circuit_voltage;
        state.current = state
            .current_mode
            .peak_current()
            .min(self.params.max_short_current);
    }

    fn open_voltage(&self, state: &mut ProcessState) {
        state.spark_status = SparkStatus::None;
        state.voltage = state.target_voltage;
        state.current = 0.0;
    }

    fn burn(&self, state: &mut ProcessState, y_mm: f64, fresh: bool) {
        state.spark_status = SparkStatus::Spark { y_mm, fresh };
        state.voltage = state.target_voltage * self.params.spark_voltage_factor;
        state.current = state.current_mode.peak_current();
    }
}

impl ProcessModule for Ignition {
    fn name(&self) -> &'static str {
        "ignition"
    }

    fn step(&self, state: &mut ProcessState, ctx: &mut StepContext<'_>) -> SimResult<()> {
        if let Some(kind) = self.detect_short(state, ctx) {
            self.apply_short(state, kind);
            return Ok(());
        }
        state.is_short_circuit = false;

        match state.generator_phase {
            GeneratorPhase::Discharge { y_mm } => {
                if state.time_since_spark_ignition as f64 >= state.on_time {
                    state.generator_phase = GeneratorPhase::Off;
                    state.time_since_spark_end = 0;
                    self.open_voltage(state);
                    state.current = 0.0;
                } else {
                    self.burn(state, y_mm, false);
                }
                return Ok(());
            }
            GeneratorPhase::Off => {
                if (state.time_since_spark_end as f64) < state.off_time {
                    self.open_voltage(state);
                    return Ok(());
                }
                state.generator_phase = GeneratorPhase::Open;
                state.time_since_open_voltage = 0;
            }
            GeneratorPhase::Open => {}
        }

        let p = self.ignition_probability(state.gap(), state.target_voltage, ctx.dt_us);
        if draw(ctx.rng, p) {
            let y_mm = ctx.rng.gen_range(0.0..self.workpiece_height);
            state.generator_phase = GeneratorPhase::Discharge { y_mm };
            state.time_since_spark_ignition = 0;
            state.spark_count += 1;
            self.burn(state, y_mm, true);
        } else {
            self.open_voltage(state);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use wedm_project::{EnvironmentConfig, ModuleParams};

    fn setup() -> (Ignition, ProcessState) {
        let config = EnvironmentConfig::default();
        let params = ModuleParams::default();
        let state = ProcessState::initial(&config, &params, None, 10);
        (Ignition::new(params.ignition, config.workpiece_height), state)
    }

    fn tick(ign: &Ignition, state: &mut ProcessState, rng: &mut ChaCha8Rng) {
        let mut ctx = StepContext {
            rng,
            dt_us: 1,
            servo_dt_us: 0,
        };
        ign.step(state, &mut ctx).unwrap();
        state.time_since_open_voltage += 1;
        state.time_since_spark_ignition += 1;
        state.time_since_spark_end += 1;
    }

    #[test]
    fn hard_short_at_small_and_negative_gap() {
        let (ign, mut state) = setup();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for gap in [2.0, 1.0, 0.0, -3.0] {
            state.workpiece_position = state.wire_position + gap;
            tick(&ign, &mut state, &mut rng);
            assert!(state.is_short_circuit);
            assert_eq!(state.spark_status, SparkStatus::Short);
            assert_eq!(state.voltage, 0.0);
            assert_eq!(state.current, 60.0);
        }
        assert_eq!(state.short_circuit_count, 1);
    }

    #[test]
    fn debris_short_above_critical_density_lasts_its_duration() {
        let (ign, mut state) = setup();
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        state.debris_density = 0.99;
        tick(&ign, &mut state, &mut rng);
        assert!(state.is_short_circuit);
        assert_eq!(state.short_circuit_remaining, 49);
        state.debris_density = 0.0;
        for _ in 0..49 {
            tick(&ign, &mut state, &mut rng);
            assert!(state.is_short_circuit);
        }
        assert_eq!(state.short_circuit_remaining, 0);
        tick(&ign, &mut state, &mut rng);
        assert!(!state.is_short_circuit);
        assert_eq!(state.short_circuit_count, 1);
    }

    #[test]
    fn short_aborts_discharge() {
        let (ign, mut state) = setup();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        state.generator_phase = GeneratorPhase::Discharge { y_mm: 3.0 };
        state.workpiece_position = 1.0;
        tick(&ign, &mut state, &mut rng);
        assert_eq!(state.generator_phase, GeneratorPhase::Off);
    }

    #[test]
    fn spark_cycle_timing_and_voltage() {
        let (ign, mut state) = setup();
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        // Close gap for a fast breakdown.
        state.workpiece_position = 5.0;
        let mut guard = 0;
        while !state.spark_status.is_fresh_spark() {
            tick(&ign, &mut state, &mut rng);
            guard += 1;
            assert!(guard < 10_000, "no ignition");
        }
        assert_eq!(state.spark_count, 1);
        let mut burning = 1;
        loop {
            tick(&ign, &mut state, &mut rng);
            match state.spark_status {
                SparkStatus::Spark { fresh, .. } => {
                    assert!(!fresh);
                    assert_eq!(state.voltage, state.target_voltage * 0.3);
                    assert_eq!(state.current, 60.0);
                    burning += 1;
                }
                _ => break,
            }
        }
        assert_eq!(burning, 3);
        assert_eq!(state.generator_phase, GeneratorPhase::Off);
        // OFF phase: open voltage, no current, no trials for OFF_time.
        for _ in 1..80 {
            tick(&ign, &mut state, &mut rng);
            assert_eq!(state.generator_phase, GeneratorPhase::Off);
            assert_eq!(state.voltage, state.target_voltage);
            assert_eq!(state.current, 0.0);
        }
        assert_eq!(state.spark_count, 1);
    }

    #[test]
    fn ignition_probability_shape() {
        let (ign, _) = setup();
        assert!(ign.ignition_probability(10.0, 80.0, 1) > ign.ignition_probability(50.0, 80.0, 1));
        assert!(ign.ignition_probability(30.0, 120.0, 1) > ign.ignition_probability(30.0, 80.0, 1));
        assert_eq!(ign.ignition_probability(30.0, 0.0, 1), 0.0);
        // Held at the vertex below ~3.84 µm.
        assert_eq!(ign.ignition_probability(0.5, 80.0, 1), ign.ignition_probability(3.0, 80.0, 1));
    }

    #[test]
    fn random_short_probability_is_linear() {
        let mut params = IgnitionParams::default();
        params.random_short_max_probability = 0.01;
        let ign = Ignition::new(params, 20.0);
        assert_eq!(ign.random_short_probability(60.0), 0.0);
        assert_eq!(ign.random_short_probability(1.0), 0.01);
        assert!((ign.random_short_probability(26.0) - 0.005).abs() < 1e-12);
    }

    fn random_short_setup() -> (Ignition, ProcessState) {
        let config = EnvironmentConfig::default();
        let mut params = ModuleParams::default();
        params.ignition.random_short_max_probability = 1.0;
        params.ignition.random_short_min_gap = 10.0;
        params.ignition.max_short_current = 40.0;
        let mut state = ProcessState::initial(&config, &params, None, 10);
        state.workpiece_position = state.wire_position + 5.0;
        (Ignition::new(params.ignition, config.workpiece_height), state)
    }

    #[test]
    fn random_short_holds_for_its_duration() {
        let (ign, mut state) = random_short_setup();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        {
            let mut ctx = StepContext {
                rng: &mut rng,
                dt_us: 1,
                servo_dt_us: 0,
            };
            let kind = ign.detect_short(&mut state.clone(), &mut ctx);
            assert_eq!(kind, Some(ShortKind::Random));
        }

        tick(&ign, &mut state, &mut rng);
        assert_eq!(state.short_circuit_remaining, 99);
        // Leave the band so no new short follows the first one.
        state.workpiece_position = state.wire_position + 60.0;
        let mut shorted = 1;
        while state.is_short_circuit {
            assert_eq!(state.spark_status, SparkStatus::Short);
            assert_eq!(state.voltage, 0.0);
            assert_eq!(state.current, 40.0);
            tick(&ign, &mut state, &mut rng);
            if state.is_short_circuit {
                shorted += 1;
            }
            assert!(shorted <= 100);
        }
        assert_eq!(shorted, 100);
        assert_eq!(state.short_circuit_count, 1);
        assert!(state.voltage > 0.0);
    }

    #[test]
    fn random_short_aborts_discharge() {
        let (ign, mut state) = random_short_setup();
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        state.generator_phase = GeneratorPhase::Discharge { y_mm: 2.0 };
        state.spark_status = SparkStatus::Spark {
            y_mm: 2.0,
            fresh: false,
        };
        state.time_since_spark_ignition = 1;
        tick(&ign, &mut state, &mut rng);
        assert!(state.is_short_circuit);
        assert_eq!(state.generator_phase, GeneratorPhase::Off);
        assert_eq!(state.time_since_spark_end, 1);
        assert_eq!(state.voltage, 0.0);
        assert_eq!(state.current, 40.0);
    }

    proptest! {
        #[test]
        fn ignition_probability_is_monotone(
            g1 in -50.0f64..200.0,
            dg in 0.0f64..100.0,
            v1 in 1.0f64..300.0,
            dv in 0.0f64..100.0,
        ) {
            let (ign, _) = setup();
            let (g2, v2) = (g1 + dg, v1 + dv);
            let p11 = ign.ignition_probability(g1, v1, 1);
            let p21 = ign.ignition_probability(g2, v1, 1);
            let p12 = ign.ignition_probability(g1, v2, 1);
            prop_assert!(p11 >= p21 - 1e-12);
            prop_assert!(p11 <= p12 + 1e-12);
            for p in [p11, p21, p12] {
                prop_assert!((0.0..=1.0).contains(&p));
            }
        }
    }
}

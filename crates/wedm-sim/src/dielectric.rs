//! Debris transport and flushing in the gap cavity.

use std::f64::consts::PI;

use wedm_core::{ensure_finite, um_to_mm};
use wedm_project::{DielectricParams, EnvironmentConfig};

use crate::error::SimResult;
use crate::module::{ProcessModule, StepContext};
use crate::state::{IonizedChannel, ProcessState, SparkStatus};

/// Smallest gap [µm] used for the cavity volume.
const MIN_CAVITY_GAP: f64 = 0.001;

#[derive(Debug, Clone)]
pub struct Dielectric {
    params: DielectricParams,
    /// [mm]
    wire_radius: f64,
    /// [mm]
    workpiece_height: f64,
}

impl Dielectric {
    pub fn new(params: DielectricParams, config: &EnvironmentConfig) -> Self {
        Self {
            params,
            wire_radius: config.wire_radius(),
            workpiece_height: config.workpiece_height,
        }
    }

    /// Cavity volume [mm³] for a gap in µm.
    pub fn cavity_volume(&self, gap: f64) -> f64 {
        PI * self.wire_radius * self.workpiece_height * um_to_mm(gap.max(MIN_CAVITY_GAP))
    }

    /// Effective flushing fraction in [0, 1].
    pub fn flow_fraction(&self, gap: f64, debris_density: f64) -> f64 {
        let p = &self.params;
        let geometric = (gap.max(0.0) / p.reference_gap).powi(3).min(1.0);
        (geometric * (-p.debris_obstruction_coeff * debris_density).exp()).clamp(0.0, 1.0)
    }

    pub fn conductivity(&self, debris_density: f64) -> f64 {
        self.params.base_conductivity * (1.0 + self.params.debris_conductivity_coeff * debris_density)
    }

    fn density(volume: f64, cavity: f64) -> f64 {
        if cavity > 0.0 {
            (volume / cavity).clamp(0.0, 1.0)
        } else {
            1.0
        }
    }
}

impl ProcessModule for Dielectric {
    fn name(&self) -> &'static str {
        "dielectric"
    }

    fn step(&self, state: &mut ProcessState, ctx: &mut StepContext<'_>) -> SimResult<()> {
        let p = &self.params;
        let gap = state.gap();
        let cavity = self.cavity_volume(gap);
        state.cavity_volume = cavity;

        if let SparkStatus::Spark { y_mm, fresh: true } = state.spark_status {
            state.debris_volume += state.last_crater_volume;
            state.ionized_channel = Some(IonizedChannel {
                y_mm,
                remaining_us: p.ion_channel_duration,
            });
        }
        // The ignition tick counts toward the channel lifetime.
        if let Some(channel) = state.ionized_channel.as_mut() {
            channel.remaining_us = channel.remaining_us.saturating_sub(ctx.dt_us);
            if channel.remaining_us == 0 {
                state.ionized_channel = None;
            }
        }

        let density = Self::density(state.debris_volume, cavity);
        let flow = self.flow_fraction(gap, density);
        state.flow_rate = flow;

        if flow > p.min_flow_fraction && state.debris_volume > p.residual_debris_volume {
            let removed = p.debris_removal_efficiency * p.base_flow_rate * flow * ctx.dt_s();
            state.debris_volume = (state.debris_volume - removed).max(p.residual_debris_volume);
        }
        state.debris_volume = ensure_finite(state.debris_volume, "debris_volume")?;

        state.debris_density = Self::density(state.debris_volume, cavity);
        state.dielectric_conductivity = self.conductivity(state.debris_density);
        state.dielectric_temperature = p.dielectric_temperature;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use wedm_project::ModuleParams;

    fn setup() -> (Dielectric, ProcessState) {
        let config = EnvironmentConfig::default();
        let params = ModuleParams::default();
        let diel = Dielectric::new(params.dielectric.clone(), &config);
        (diel, ProcessState::initial(&config, &params, None, 10))
    }

    fn run(diel: &Dielectric, state: &mut ProcessState, ticks: usize) {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut ctx = StepContext {
            rng: &mut rng,
            dt_us: 1,
            servo_dt_us: 0,
        };
        for _ in 0..ticks {
            diel.step(state, &mut ctx).unwrap();
        }
    }

    #[test]
    fn cavity_of_default_geometry() {
        let (diel, _) = setup();
        let expected = PI * 0.1 * 20.0 * 0.05;
        assert!((diel.cavity_volume(50.0) - expected).abs() < 1e-12);
        assert!(diel.cavity_volume(-3.0) > 0.0);
    }

    #[test]
    fn flow_drops_with_gap_and_debris() {
        let (diel, _) = setup();
        assert_eq!(diel.flow_fraction(50.0, 0.0), 1.0);
        assert!((diel.flow_fraction(12.5, 0.0) - 0.125).abs() < 1e-12);
        assert!(diel.flow_fraction(50.0, 0.5) < diel.flow_fraction(50.0, 0.1));
        assert_eq!(diel.flow_fraction(-1.0, 0.0), 0.0);
    }

    #[test]
    fn fresh_spark_adds_debris_and_opens_channel() {
        let (diel, mut state) = setup();
        state.spark_status = SparkStatus::Spark {
            y_mm: 4.0,
            fresh: true,
        };
        state.last_crater_volume = 1.0e-5;
        run(&diel, &mut state, 1);
        assert!((state.debris_volume - 1.0e-5).abs() < 1e-18);
        assert!(state.debris_density > 0.0);
        let channel = state.ionized_channel.unwrap();
        assert_eq!(channel.remaining_us, 5);
        assert_eq!(channel.y_mm, 4.0);

        state.spark_status = SparkStatus::Spark {
            y_mm: 4.0,
            fresh: false,
        };
        run(&diel, &mut state, 4);
        assert_eq!(state.ionized_channel.unwrap().remaining_us, 1);
        run(&diel, &mut state, 1);
        assert!(state.ionized_channel.is_none());
    }

    #[test]
    fn flushing_stops_at_residual_volume() {
        let (diel, mut state) = setup();
        state.debris_volume = 0.002;
        run(&diel, &mut state, 2_000);
        assert!((state.debris_volume - 0.001).abs() < 1e-12);
    }

    #[test]
    fn density_saturates_in_a_closed_gap() {
        let (diel, mut state) = setup();
        state.workpiece_position = 0.0;
        state.debris_volume = 1.0;
        run(&diel, &mut state, 1);
        assert_eq!(state.debris_density, 1.0);
        assert_eq!(state.flow_rate, 0.0);
        assert!(state.dielectric_conductivity > 5.0e-4);
    }
}

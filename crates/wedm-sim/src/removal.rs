//! Crater model: one log-normal crater per spark, converted into frontier advance.

use rand_distr::{Distribution, LogNormal};
use wedm_core::{constants::UM3_PER_MM3, mm_to_um};
use wedm_project::{EnvironmentConfig, MaterialParams};

use crate::error::{SimError, SimResult};
use crate::module::{ProcessModule, StepContext};
use crate::state::ProcessState;

#[derive(Debug, Clone)]
pub struct MaterialRemoval {
    params: MaterialParams,
    /// Kerf width [mm].
    removal_width: f64,
    /// [mm]
    workpiece_height: f64,
}

impl MaterialRemoval {
    pub fn new(params: MaterialParams, config: &EnvironmentConfig) -> SimResult<Self> {
        let removal_width = config.wire_diameter + 2.0 * params.base_overcut;
        if removal_width <= 0.0 || config.workpiece_height <= 0.0 {
            return Err(SimError::InvalidArg {
                what: "removal cross section must be positive",
            });
        }
        Ok(Self {
            params,
            removal_width,
            workpiece_height: config.workpiece_height,
        })
    }

    pub fn removal_width(&self) -> f64 {
        self.removal_width
    }

    /// Median crater volume [µm³] for a pulse of `current` A lasting `on_time` µs.
    pub fn median_volume(&self, current: f64, on_time: f64) -> f64 {
        let p = &self.params;
        let ratio = (current * on_time) / (p.reference_current * p.reference_on_time);
        p.crater_volume_median * ratio.max(0.0).powf(p.energy_exponent)
    }

    /// Frontier advance [µm] for a crater of `volume_mm3`.
    pub fn advance_for(&self, volume_mm3: f64) -> f64 {
        mm_to_um(volume_mm3 / (self.removal_width * self.workpiece_height))
    }

    fn sample_volume(&self, median: f64, ctx: &mut StepContext<'_>) -> SimResult<f64> {
        if median <= 0.0 {
            return Ok(0.0);
        }
        let dist = LogNormal::new(median.ln(), self.params.crater_volume_sigma).map_err(|e| {
            SimError::Backend {
                message: e.to_string(),
            }
        })?;
        Ok(dist.sample(&mut *ctx.rng))
    }
}

impl ProcessModule for MaterialRemoval {
    fn name(&self) -> &'static str {
        "material_removal"
    }

    fn step(&self, state: &mut ProcessState, ctx: &mut StepContext<'_>) -> SimResult<()> {
        if !state.spark_status.is_fresh_spark() {
            return Ok(());
        }
        let median = self.median_volume(state.current_mode.peak_current(), state.on_time);
        let volume_um3 = self.sample_volume(median, ctx)?;
        let volume = volume_um3 / UM3_PER_MM3;

        state.last_crater_volume = volume;
        state.workpiece_position += self.advance_for(volume);
        state.crater_count += 1;
        state.removed_volume += volume;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::SparkStatus;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use wedm_project::{CurrentMode, ModuleParams};

    fn setup() -> (MaterialRemoval, ProcessState) {
        let config = EnvironmentConfig::default();
        let params = ModuleParams::default();
        let removal = MaterialRemoval::new(params.material.clone(), &config).unwrap();
        (removal, ProcessState::initial(&config, &params, None, 10))
    }

    fn step(removal: &MaterialRemoval, state: &mut ProcessState, seed: u64) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut ctx = StepContext {
            rng: &mut rng,
            dt_us: 1,
            servo_dt_us: 0,
        };
        removal.step(state, &mut ctx).unwrap();
    }

    #[test]
    fn median_scales_with_pulse_energy() {
        let (removal, _) = setup();
        assert!((removal.median_volume(60.0, 3.0) - 1.0e4).abs() < 1e-6);
        assert!((removal.median_volume(120.0, 3.0) - 2.0e4).abs() < 1e-6);
        assert_eq!(removal.median_volume(0.0, 3.0), 0.0);
    }

    #[test]
    fn advance_uses_kerf_cross_section() {
        let (removal, _) = setup();
        assert!((removal.removal_width() - 0.44).abs() < 1e-12);
        // 0.44 mm · 20 mm · 1 µm = 8.8e-3 mm³
        assert!((removal.advance_for(8.8e-3) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn fresh_spark_removes_material_once() {
        let (removal, mut state) = setup();
        state.spark_status = SparkStatus::Spark {
            y_mm: 5.0,
            fresh: true,
        };
        let before = state.workpiece_position;
        step(&removal, &mut state, 1);
        assert!(state.workpiece_position > before);
        assert!(state.last_crater_volume > 0.0);
        assert_eq!(state.crater_count, 1);
        assert!((state.removed_volume - state.last_crater_volume).abs() < 1e-18);

        let after = state.workpiece_position;
        state.spark_status = SparkStatus::Spark {
            y_mm: 5.0,
            fresh: false,
        };
        step(&removal, &mut state, 2);
        assert_eq!(state.workpiece_position, after);
        assert_eq!(state.crater_count, 1);
    }

    #[test]
    fn shorts_and_open_ticks_remove_nothing() {
        let (removal, mut state) = setup();
        for status in [SparkStatus::Short, SparkStatus::None] {
            state.spark_status = status;
            step(&removal, &mut state, 3);
        }
        assert_eq!(state.workpiece_position, 50.0);
        assert_eq!(state.crater_count, 0);
    }

    #[test]
    fn sampled_volumes_are_seed_deterministic() {
        let (removal, mut a) = setup();
        let mut b = a.clone();
        a.current_mode = CurrentMode::new(9).unwrap();
        b.current_mode = CurrentMode::new(9).unwrap();
        for s in [&mut a, &mut b] {
            s.spark_status = SparkStatus::Spark {
                y_mm: 1.0,
                fresh: true,
            };
            step(&removal, s, 42);
        }
        assert_eq!(a.last_crater_volume, b.last_crater_volume);
    }
}

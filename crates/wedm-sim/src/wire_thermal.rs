//! 1-D transient heat balance of the travelling wire.
//!
//! The wire between the spools is split into segments of `segment_len`. Each
//! segment exchanges heat by axial conduction, gains Joule heat between the
//! electrical contacts and plasma heat at the spark location, loses heat by
//! convection to the dielectric and is advected by unwinding (upwind). Both
//! ends are held at the spool temperature.
//!
//! The explicit update is sub-stepped so every coefficient of the old field
//! stays non-negative. Without sources this is a convex combination of
//! neighbours, boundary and dielectric temperatures, so the field relaxes
//! monotonically and cannot grow unbounded.

use std::f64::consts::PI;

use tracing::debug;
use wedm_core::{ensure_all_finite, mm_to_m};
use wedm_materials::WireMaterial;
use wedm_project::{EnvironmentConfig, WireParams};

use crate::error::{SimError, SimResult};
use crate::module::{ProcessModule, StepContext};
use crate::state::{ProcessState, SparkStatus};

/// Segment index layout along the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireGeometry {
    pub n_segments: usize,
    /// First segment inside the workpiece.
    pub zone_start: usize,
    /// One past the last segment inside the workpiece.
    pub zone_end: usize,
    pub contact_bottom: usize,
    pub contact_top: usize,
}

impl WireGeometry {
    pub fn new(params: &WireParams, workpiece_height: f64) -> SimResult<Self> {
        let seg = params.segment_len;
        let count = |len: f64| (len / seg + 1e-9).floor() as usize;

        let total = params.buffer_len_bottom + workpiece_height + params.buffer_len_top;
        let n_segments = count(total);
        if n_segments < 3 {
            return Err(SimError::InvalidArg {
                what: "wire needs at least three segments",
            });
        }

        let zone_end_raw = count(params.buffer_len_bottom) + count(workpiece_height).max(1);
        let zone_end = zone_end_raw.min(n_segments - 1);
        let zone_start = count(params.buffer_len_bottom).clamp(1, zone_end.saturating_sub(1).max(1));

        let bottom_mm = (params.buffer_len_bottom - params.contact_offset_bottom).max(0.0);
        let top_mm = params.buffer_len_bottom + workpiece_height + params.contact_offset_top;
        let contact_bottom = count(bottom_mm).min(zone_start.saturating_sub(1));
        let contact_top = count(top_mm).max(zone_end).min(n_segments - 1);

        Ok(Self {
            n_segments,
            zone_start,
            zone_end,
            contact_bottom,
            contact_top,
        })
    }

    pub fn in_zone(&self, i: usize) -> bool {
        (self.zone_start..self.zone_end).contains(&i)
    }

    pub fn between_contacts(&self, i: usize) -> bool {
        (self.contact_bottom..=self.contact_top).contains(&i)
    }
}

#[derive(Debug, Clone)]
pub struct WireThermal {
    params: WireParams,
    material: WireMaterial,
    geometry: WireGeometry,
    segment_len_m: f64,
    /// Cross section [m²].
    section: f64,
    /// Lateral area per segment [m²].
    lateral_area: f64,
    /// Heat capacity per segment [J/K].
    heat_capacity: f64,
    /// Axial conductance between neighbours [W/K].
    conductance: f64,
    critical_temperature: f64,
    zone_break_temperature: f64,
    max_break_temperature: f64,
}

impl WireThermal {
    pub fn new(
        params: WireParams,
        material: WireMaterial,
        config: &EnvironmentConfig,
    ) -> SimResult<Self> {
        let geometry = WireGeometry::new(&params, config.workpiece_height)?;
        let radius_m = mm_to_m(config.wire_radius());
        let segment_len_m = mm_to_m(params.segment_len);
        let section = PI * radius_m * radius_m;
        let lateral_area = 2.0 * PI * radius_m * segment_len_m;
        let heat_capacity = material.volumetric_heat_capacity() * section * segment_len_m;
        let conductance = material.thermal_conductivity * section / segment_len_m;

        debug!(
            segments = geometry.n_segments,
            zone_start = geometry.zone_start,
            zone_end = geometry.zone_end,
            contact_bottom = geometry.contact_bottom,
            contact_top = geometry.contact_top,
            "wire thermal geometry"
        );

        Ok(Self {
            critical_temperature: material.melting_point * params.critical_temp_threshold,
            zone_break_temperature: material.breaking_temperature * params.wire_breaking_temp_factor,
            max_break_temperature: material.breaking_temperature.min(config.max_wire_temperature),
            params,
            material,
            geometry,
            segment_len_m,
            section,
            lateral_area,
            heat_capacity,
            conductance,
        })
    }

    pub fn geometry(&self) -> &WireGeometry {
        &self.geometry
    }

    pub fn critical_temperature(&self) -> f64 {
        self.critical_temperature
    }

    /// Mean over the segments inside the workpiece.
    pub fn zone_mean(&self, field: &[f64]) -> f64 {
        let zone = &field[self.geometry.zone_start..self.geometry.zone_end.min(field.len())];
        if zone.is_empty() {
            field.iter().sum::<f64>() / field.len().max(1) as f64
        } else {
            zone.iter().sum::<f64>() / zone.len() as f64
        }
    }

    /// Convection coefficients [W/(m²·K)] outside and inside the workpiece.
    pub fn convection_coefficients(&self, unwinding_velocity: f64, flow_rate: f64) -> (f64, f64) {
        let p = &self.params;
        let base = p.base_convection_coefficient
            * (1.0 + p.convection_velocity_factor * unwinding_velocity).max(0.1);
        let zone = base * (1.0 + p.convection_flow_enhancement * flow_rate.max(0.0));
        (base, zone)
    }

    fn plasma_segment(&self, y_mm: f64) -> usize {
        let offset = (y_mm.max(0.0) / self.params.segment_len + 1e-9).floor() as usize;
        (self.geometry.zone_start + offset).min(self.geometry.zone_end.saturating_sub(1))
    }

    fn integrate(&self, state: &mut ProcessState, dt_s: f64) {
        let g = &self.geometry;
        let n = g.n_segments;
        let spool = self.params.spool_t;
        let t_diel = state.dielectric_temperature;

        let (h_base, h_zone) =
            self.convection_coefficients(state.wire_unwinding_velocity, state.flow_rate);
        let advection = self.material.volumetric_heat_capacity()
            * state.wire_unwinding_velocity.abs()
            * self.section;

        // I²·Δy/S; multiplied by ρ_e(T) per segment.
        let current_sq = state.current * state.current;
        let joule = if current_sq > 1e-12 {
            current_sq * self.segment_len_m / self.section
        } else {
            0.0
        };

        let plasma = match state.spark_status {
            SparkStatus::Spark { y_mm, .. } => {
                let heat = self.params.plasma_efficiency * state.voltage * state.current;
                heat.is_finite().then(|| (self.plasma_segment(y_mm), heat))
            }
            _ => None,
        };

        // Largest loss coefficient of any segment [W/K].
        let loss = 2.0 * self.conductance + h_base.max(h_zone) * self.lateral_area + advection;
        let substeps = ((dt_s * loss / self.heat_capacity).ceil() as usize).max(1);
        let k = dt_s / substeps as f64 / self.heat_capacity;

        let t = &mut state.wire_temperature;
        for _ in 0..substeps {
            t[0] = spool;
            t[n - 1] = spool;
            let mut left = t[0];
            for i in 1..n - 1 {
                let ti = t[i];
                let right = t[i + 1];

                let mut q = self.conductance * (left - 2.0 * ti + right);
                if joule > 0.0 && g.between_contacts(i) {
                    q += joule * self.material.resistivity_at(ti);
                }
                if let Some((idx, heat)) = plasma {
                    if idx == i {
                        q += heat;
                    }
                }
                let h = if g.in_zone(i) { h_zone } else { h_base };
                q -= h * self.lateral_area * (ti - t_diel);
                q += advection * (left - ti);

                t[i] = ti + q * k;
                left = ti;
            }
        }
    }

    fn check_breakage(&self, state: &mut ProcessState, dt_us: u64) {
        let max_t = state.max_wire_temperature().unwrap_or(self.params.spool_t);
        if max_t > self.critical_temperature {
            state.time_in_critical_temp += dt_us;
        } else {
            state.time_in_critical_temp = 0;
        }

        let zone_hot = state
            .wire_average_temperature
            .is_some_and(|avg| avg >= self.zone_break_temperature);
        if zone_hot
            || max_t >= self.max_break_temperature
            || state.time_in_critical_temp >= self.params.critical_temp_duration
        {
            state.is_wire_broken = true;
        }
    }
}

impl ProcessModule for WireThermal {
    fn name(&self) -> &'static str {
        "wire_thermal"
    }

    fn step(&self, state: &mut ProcessState, ctx: &mut StepContext<'_>) -> SimResult<()> {
        if state.is_wire_broken {
            return Ok(());
        }
        if state.wire_temperature.len() != self.geometry.n_segments {
            state.wire_temperature = vec![self.params.spool_t; self.geometry.n_segments];
        }

        self.integrate(state, ctx.dt_s());
        ensure_all_finite(&state.wire_temperature, "wire_temperature")?;

        let refresh = !self.params.compute_zone_mean
            || state.thermal_steps % self.params.zone_mean_interval == 0;
        if refresh {
            state.wire_average_temperature = Some(self.zone_mean(&state.wire_temperature));
        }
        state.thermal_steps += 1;

        self.check_breakage(state, ctx.dt_us);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use wedm_materials::MaterialDatabase;
    use wedm_project::ModuleParams;

    fn setup() -> (WireThermal, ProcessState) {
        let config = EnvironmentConfig::default();
        let params = ModuleParams::default();
        let db = MaterialDatabase::builtin();
        let brass = db.get("brass").unwrap().clone();
        let thermal = WireThermal::new(params.wire.clone(), brass, &config).unwrap();
        let state = ProcessState::initial(&config, &params, None, thermal.geometry().n_segments);
        (thermal, state)
    }

    fn run(thermal: &WireThermal, state: &mut ProcessState, ticks: usize) {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut ctx = StepContext {
            rng: &mut rng,
            dt_us: 1,
            servo_dt_us: 0,
        };
        for _ in 0..ticks {
            thermal.step(state, &mut ctx).unwrap();
        }
    }

    #[test]
    fn geometry_of_default_wire() {
        let (thermal, _) = setup();
        let g = thermal.geometry();
        assert_eq!(g.n_segments, 400);
        assert_eq!(g.zone_start, 150);
        assert_eq!(g.zone_end, 250);
        assert_eq!(g.contact_bottom, 100);
        assert_eq!(g.contact_top, 300);
    }

    #[test]
    fn too_short_wire_is_rejected() {
        let params = WireParams {
            buffer_len_bottom: 0.0,
            buffer_len_top: 0.0,
            segment_len: 1.0,
            ..WireParams::default()
        };
        let config = EnvironmentConfig {
            workpiece_height: 1.5,
            ..EnvironmentConfig::default()
        };
        let brass = MaterialDatabase::builtin().get("brass").unwrap().clone();
        assert!(WireThermal::new(params, brass, &config).is_err());
    }

    #[test]
    fn average_is_none_until_first_step() {
        let (thermal, mut state) = setup();
        assert!(state.wire_average_temperature.is_none());
        run(&thermal, &mut state, 1);
        let avg = state.wire_average_temperature.unwrap();
        assert!((avg - 293.15).abs() < 1e-9);
    }

    #[test]
    fn spark_heats_the_spark_segment() {
        let (thermal, mut state) = setup();
        state.spark_status = SparkStatus::Spark {
            y_mm: 10.0,
            fresh: true,
        };
        state.voltage = 24.0;
        state.current = 60.0;
        run(&thermal, &mut state, 3);
        let idx = thermal.plasma_segment(10.0);
        assert_eq!(idx, 200);
        let t = &state.wire_temperature;
        assert!(t[idx] > 300.0, "spark segment at {}", t[idx]);
        assert!(t[idx] > t[idx - 5]);
        assert!(!state.is_wire_broken);
    }

    #[test]
    fn zone_mean_refresh_interval() {
        let (mut thermal, mut state) = setup();
        thermal.params.compute_zone_mean = true;
        thermal.params.zone_mean_interval = 10;
        run(&thermal, &mut state, 1);
        let first = state.wire_average_temperature.unwrap();
        state.spark_status = SparkStatus::Spark {
            y_mm: 10.0,
            fresh: false,
        };
        state.voltage = 24.0;
        state.current = 60.0;
        run(&thermal, &mut state, 5);
        assert_eq!(state.wire_average_temperature, Some(first));
        run(&thermal, &mut state, 5);
        assert!(state.wire_average_temperature.unwrap() > first);
    }

    #[test]
    fn overheating_breaks_the_wire() {
        let (thermal, mut state) = setup();
        let zone = thermal.geometry().zone_start + 10;
        state.wire_temperature[zone] = 1600.0;
        run(&thermal, &mut state, 1);
        assert!(state.is_wire_broken);
    }

    #[test]
    fn sustained_critical_temperature_breaks_the_wire() {
        let (mut thermal, mut state) = setup();
        thermal.params.critical_temp_duration = 5;
        let idx = thermal.geometry().zone_start + 20;
        for _ in 0..5 {
            state.wire_temperature[idx] = 1100.0;
            run(&thermal, &mut state, 1);
        }
        assert!(state.time_in_critical_temp >= 5);
        assert!(state.is_wire_broken);
    }

    #[test]
    fn nan_temperature_is_a_numerical_fault() {
        let (thermal, mut state) = setup();
        state.wire_temperature[100] = f64::NAN;
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut ctx = StepContext {
            rng: &mut rng,
            dt_us: 1,
            servo_dt_us: 0,
        };
        let err = thermal.step(&mut state, &mut ctx).unwrap_err();
        assert!(matches!(err, SimError::NumericalFault { .. }));
    }
}

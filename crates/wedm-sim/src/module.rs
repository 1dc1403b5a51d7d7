//! The process-module seam.

use rand_chacha::ChaCha8Rng;

use crate::error::SimResult;
use crate::state::ProcessState;

/// Per-tick inputs shared by all modules.
pub struct StepContext<'a> {
    /// Episode generator, the only source of randomness.
    pub rng: &'a mut ChaCha8Rng,
    /// Simulation step [µs].
    pub dt_us: u64,
    /// Time since the previous servo update [µs]; only meaningful on servo ticks.
    pub servo_dt_us: u64,
}

impl StepContext<'_> {
    pub fn dt_s(&self) -> f64 {
        wedm_core::us_to_s(self.dt_us as f64)
    }
}

/// One physics stage of the tick.
///
/// Modules hold only immutable parameters and geometry; everything that
/// changes lives in the [`ProcessState`] they are handed.
pub trait ProcessModule {
    fn name(&self) -> &'static str;

    fn step(&self, state: &mut ProcessState, ctx: &mut StepContext<'_>) -> SimResult<()>;
}

/// Bernoulli draw that accepts any probability, clamping to [0, 1].
pub(crate) fn draw(rng: &mut ChaCha8Rng, p: f64) -> bool {
    use rand::Rng;
    if p.is_nan() || p <= 0.0 {
        false
    } else if p >= 1.0 {
        true
    } else {
        rng.gen_bool(p)
    }
}

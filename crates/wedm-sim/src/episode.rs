//! Episode runner: drives an environment with a policy until a terminal flag
//! or the step limit.

use serde::Serialize;
use tracing::info;

use crate::env::{Action, StepOutcome, WireEdmEnv};
use crate::error::{SimError, SimResult};
use crate::state::ProcessState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalReason {
    WireBroken,
    TargetReached,
    StepLimit,
}

impl TerminalReason {
    pub fn label(self) -> &'static str {
        match self {
            TerminalReason::WireBroken => "wire_broken",
            TerminalReason::TargetReached => "target_reached",
            TerminalReason::StepLimit => "step_limit",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpisodeSummary {
    pub seed: u64,
    pub steps: u64,
    pub reason: TerminalReason,
    /// [µs]
    pub time: u64,
    pub spark_count: u64,
    pub short_circuit_count: u64,
    pub crater_count: u64,
    /// [mm³]
    pub removed_volume: f64,
    /// [µm]
    pub workpiece_position: f64,
    /// [µm]
    pub wire_position: f64,
}

impl EpisodeSummary {
    fn new(env: &WireEdmEnv, steps: u64, reason: TerminalReason) -> Self {
        let s = env.state();
        Self {
            seed: env.seed(),
            steps,
            reason,
            time: s.time,
            spark_count: s.spark_count,
            short_circuit_count: s.short_circuit_count,
            crater_count: s.crater_count,
            removed_volume: s.removed_volume,
            workpiece_position: s.workpiece_position,
            wire_position: s.wire_position,
        }
    }
}

/// Run from the current state for at most `max_steps` ticks.
///
/// `policy` sees the state before each tick and whether that tick is a servo
/// tick; `observer` sees the committed state after it.
pub fn run_episode<P, O>(
    env: &mut WireEdmEnv,
    max_steps: u64,
    mut policy: P,
    mut observer: O,
) -> SimResult<EpisodeSummary>
where
    P: FnMut(&ProcessState, bool) -> Action,
    O: FnMut(&ProcessState, &StepOutcome),
{
    if max_steps == 0 {
        return Err(SimError::InvalidArg {
            what: "max_steps must be positive",
        });
    }

    let mut steps = 0;
    let mut reason = TerminalReason::StepLimit;
    while steps < max_steps {
        let action = policy(env.state(), env.next_tick_is_servo());
        let outcome = env.step(&action)?;
        steps += 1;
        observer(env.state(), &outcome);

        if outcome.flags.wire_broken {
            reason = TerminalReason::WireBroken;
            break;
        }
        if outcome.flags.target_reached {
            reason = TerminalReason::TargetReached;
            break;
        }
    }

    let summary = EpisodeSummary::new(env, steps, reason);
    info!(
        steps,
        reason = summary.reason.label(),
        sparks = summary.spark_count,
        shorts = summary.short_circuit_count,
        "episode finished"
    );
    Ok(summary)
}

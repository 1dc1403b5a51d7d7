//! Wire EDM process simulation.
//!
//! A [`WireEdmEnv`] advances a [`ProcessState`] one tick at a time through
//! five modules in a fixed order:
//!
//! 1. [`Ignition`]: short circuits and the generator open/discharge/off cycle
//! 2. [`WireThermal`]: 1-D transient heating of the wire, breakage
//! 3. [`MaterialRemoval`]: crater sampling on fresh sparks
//! 4. [`Dielectric`]: debris, flushing, ionized channel
//! 5. [`Mechanics`]: feed-axis servo on servo ticks
//!
//! All randomness comes from the environment's seeded generator.

pub mod dielectric;
pub mod env;
pub mod episode;
pub mod error;
pub mod ignition;
pub mod mechanics;
pub mod module;
pub mod removal;
pub mod signals;
pub mod state;
pub mod wire_thermal;

pub use dielectric::Dielectric;
pub use env::{Action, DoneFlags, MAX_WIRE_INTRUSION, StepOutcome, WireEdmEnv};
pub use episode::{EpisodeSummary, TerminalReason, run_episode};
pub use error::{SimError, SimResult};
pub use ignition::{Ignition, ShortKind};
pub use mechanics::Mechanics;
pub use module::{ProcessModule, StepContext};
pub use removal::MaterialRemoval;
pub use signals::{SIGNAL_NAMES, SignalValue, is_signal_name};
pub use state::{GeneratorPhase, IonizedChannel, ProcessState, SparkStatus};
pub use wire_thermal::{WireGeometry, WireThermal};

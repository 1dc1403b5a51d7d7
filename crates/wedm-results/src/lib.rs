//! wedm-results: signal recording and run storage.

pub mod hash;
pub mod recorder;
pub mod store;
pub mod types;

pub use hash::compute_run_id;
pub use recorder::{Recorder, SampleSchedule};
pub use store::{RunStore, timestamp_now};
pub use types::*;

pub type ResultsResult<T> = Result<T, ResultsError>;

#[derive(thiserror::Error, Debug)]
pub enum ResultsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Run not found: {run_id}")]
    RunNotFound { run_id: String },

    #[error("Unknown signal '{name}'")]
    UnknownSignal { name: String },

    #[error("Invalid recorder setting: {what}")]
    InvalidSchedule { what: &'static str },
}

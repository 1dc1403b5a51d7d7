//! Content-based hashing for run IDs.

use sha2::{Digest, Sha256};
use wedm_project::Project;

use crate::ResultsResult;

/// Run id from everything that determines a trajectory: the project, the
/// episode seed and the step budget.
pub fn compute_run_id(project: &Project, seed: u64, max_steps: u64) -> ResultsResult<String> {
    let mut hasher = Sha256::new();
    hasher.update(serde_json::to_string(project)?.as_bytes());
    hasher.update(seed.to_le_bytes());
    hasher.update(max_steps.to_le_bytes());
    hasher.update(env!("CARGO_PKG_VERSION").as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

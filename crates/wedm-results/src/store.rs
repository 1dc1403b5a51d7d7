//! Run storage API.
//!
//! Layout: `<root>/<run_id>/manifest.json` and `<root>/<run_id>/record.json`.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::types::{RunManifest, RunRecord};
use crate::{ResultsError, ResultsResult};

#[derive(Debug, Clone)]
pub struct RunStore {
    root_dir: PathBuf,
}

impl RunStore {
    pub fn new(root_dir: impl Into<PathBuf>) -> ResultsResult<Self> {
        let root_dir = root_dir.into();
        fs::create_dir_all(&root_dir)?;
        Ok(Self { root_dir })
    }

    pub fn root(&self) -> &Path {
        &self.root_dir
    }

    fn run_dir(&self, run_id: &str) -> PathBuf {
        self.root_dir.join(run_id)
    }

    pub fn has_run(&self, run_id: &str) -> bool {
        self.run_dir(run_id).join("manifest.json").exists()
    }

    pub fn save_run(&self, manifest: &RunManifest, record: &RunRecord) -> ResultsResult<()> {
        let run_dir = self.run_dir(&manifest.run_id);
        fs::create_dir_all(&run_dir)?;

        fs::write(
            run_dir.join("manifest.json"),
            serde_json::to_string_pretty(manifest)?,
        )?;
        fs::write(run_dir.join("record.json"), serde_json::to_string(record)?)?;

        debug!(run_id = %manifest.run_id, samples = record.len(), "run saved");
        Ok(())
    }

    pub fn load_manifest(&self, run_id: &str) -> ResultsResult<RunManifest> {
        let path = self.run_dir(run_id).join("manifest.json");
        if !path.exists() {
            return Err(ResultsError::RunNotFound {
                run_id: run_id.to_string(),
            });
        }
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    }

    pub fn load_record(&self, run_id: &str) -> ResultsResult<RunRecord> {
        let path = self.run_dir(run_id).join("record.json");
        if !path.exists() {
            return Err(ResultsError::RunNotFound {
                run_id: run_id.to_string(),
            });
        }
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    }

    /// All readable manifests, oldest first.
    pub fn list_runs(&self) -> ResultsResult<Vec<RunManifest>> {
        let mut runs = Vec::new();
        for entry in fs::read_dir(&self.root_dir)? {
            let entry = entry?;
            if entry.path().is_dir() {
                let run_id = entry.file_name().to_string_lossy().to_string();
                if let Ok(manifest) = self.load_manifest(&run_id) {
                    runs.push(manifest);
                }
            }
        }
        runs.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Ok(runs)
    }

    pub fn delete_run(&self, run_id: &str) -> ResultsResult<()> {
        let run_dir = self.run_dir(run_id);
        if run_dir.exists() {
            fs::remove_dir_all(run_dir)?;
        }
        Ok(())
    }
}

/// Current UTC time in RFC 3339, for manifests.
pub fn timestamp_now() -> String {
    chrono::Utc::now().to_rfc3339()
}

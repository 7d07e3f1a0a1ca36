//! Job array settings, read from a JSON file and overridden on the command line

use std::fs;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Everything needed to render a job array script except the commands themselves
///
/// Missing fields in the JSON file fall back to the defaults below, which match a brainreg run on
/// a single GPU node.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArrayJob {
    /// Stem of the log files in `logs/`, usually the tool being run
    pub name: String,
    /// Slurm time limit, e.g. `3-0:0` for three days
    pub time_limit: String,
    /// Memory pool for all cores, in GB
    pub memory_limit: u32,
    pub partition: String,
    /// Generic resources, omitted from the script when unset
    pub gres: Option<String>,
    /// Address for all job state notifications, omitted when unset
    pub email: Option<String>,
    /// Tasks allowed to run at the same time
    pub max_concurrent: u32,
    pub modules: Vec<String>,
    pub conda_environments: Vec<String>,
    /// Extra shell lines run before each task's command
    pub additional_commands: Vec<String>,
}

impl Default for ArrayJob {
    fn default() -> Self {
        ArrayJob {
            name: "brainreg".to_string(),
            time_limit: "3-0:0".to_string(),
            memory_limit: 60,
            partition: "gpu".to_string(),
            gres: Some("gpu:1".to_string()),
            email: None,
            max_concurrent: 4,
            modules: vec!["brainglobe/2024-03-01".to_string()],
            conda_environments: Vec::new(),
            additional_commands: Vec::new(),
        }
    }
}

impl ArrayJob {
    pub fn load(path: &Path) -> Result<ArrayJob> {
        info!("Reading array job config {}", path.display());
        let json = fs::read_to_string(path).map_err(Error::io(path))?;
        serde_json::from_str(&json).map_err(|source| Error::Config { path: path.to_path_buf(), source })
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("job.json");
        fs::write(&path, r#"{"name": "cellfinder", "memory_limit": 120, "gres": null}"#).unwrap();

        let job = ArrayJob::load(&path).unwrap();
        assert_eq!(job.name, "cellfinder");
        assert_eq!(job.memory_limit, 120);
        assert_eq!(job.gres, None);
        assert_eq!(job.time_limit, "3-0:0");
        assert_eq!(job.modules, vec!["brainglobe/2024-03-01"]);
    }

    #[test]
    fn unknown_field_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("job.json");
        fs::write(&path, r#"{"n_jobz": 3}"#).unwrap();

        assert!(matches!(ArrayJob::load(&path), Err(Error::Config { .. })));
    }
}

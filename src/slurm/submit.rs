use std::fmt;
use std::path::Path;
use std::process::Command;

use log::{info, warn};

use crate::error::{Error, Result};
use crate::slurm::script::JobPath;

/// Default sbatch location on the cluster login nodes
pub static SBATCH: &str = "sbatch";

/// Job id printed by `sbatch --parsable`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobId(pub String);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl JobPath {
    /// Submit the script with sbatch from the script's directory
    ///
    /// The array script writes its logs to a relative `logs/` directory, which is created next to
    /// the script if it's missing.
    pub fn submit(&self, sbatch: &Path) -> Result<JobId> {
        let wd = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => Path::new(".").to_path_buf(),
        };
        let logs = wd.join("logs");
        std::fs::create_dir_all(&logs).map_err(Error::io(&logs))?;

        // sbatch runs inside wd, so the script is named relative to it
        let script = self.path.file_name().map(Path::new).unwrap_or(self.path.as_path());
        let mut cmd = Command::new(sbatch);
        cmd.arg("--parsable").arg(script).current_dir(&wd);
        info!("Running sbatch process");
        info!("{:?}", &cmd);

        let output = cmd.output().map_err(Error::io(sbatch))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!("sbatch failed: {stderr}");
            return Err(Error::Sbatch { status: output.status, stderr });
        }

        let job_id = parse_job_id(&String::from_utf8_lossy(&output.stdout));
        info!("SLURM job id: {job_id}");
        Ok(job_id)
    }
}

/// `--parsable` prints `jobid` or `jobid;cluster`
fn parse_job_id(stdout: &str) -> JobId {
    let id = stdout.trim().split(';').next().unwrap_or_default();
    JobId(id.to_string())
}

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::info;
use serde::Serialize;
use tinytemplate::TinyTemplate;

use crate::config::ArrayJob;
use crate::error::{Error, Result};
use crate::write::write_batch_script;

/// Rendered job array script, ready for sbatch
///
/// Each array task reads line `SLURM_ARRAY_TASK_ID + 1` of the commands file and `eval`s it, so the
/// commands file **must** be readable at `commands_path` from the compute nodes.
#[derive(Debug)]
pub struct JobScript {
    pub content: String,
}

impl JobScript {
    pub fn write(&self, out_path: &Path) -> Result<JobPath> {
        write_batch_script(out_path, &self.content)?;
        Ok(JobPath { path: out_path.to_path_buf() })
    }
}

/// A JobPath is the path to a job script that's submitted to SLURM via sbatch
#[derive(Debug, Clone)]
pub struct JobPath {
    pub path: PathBuf,
}

/// Rendering context for the array job template
#[derive(Serialize)]
struct ArrayContext<'a> {
    name: &'a str,
    time_limit: &'a str,
    memory_limit: u32,
    partition: &'a str,
    gres: Option<&'a str>,
    email: Option<&'a str>,
    last_task: usize,
    max_concurrent: u32,
    modules: Vec<&'a str>,
    conda_environments: Vec<&'a str>,
    additional_commands: Vec<&'a str>,
    commands_path: String,
    rendered_at: String,
}

impl ArrayJob {
    /// Render a script running `n_jobs` tasks, one per line of the commands file
    pub fn render(&self, commands_path: &Path, n_jobs: usize) -> Result<JobScript> {
        self.render_at(commands_path, n_jobs, Utc::now())
    }

    fn render_at(&self, commands_path: &Path, n_jobs: usize, now: DateTime<Utc>) -> Result<JobScript> {
        /// included array job template
        static ARRAY_JOB: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/templates/array_job.txt"));

        // task ids are zero based and the upper bound is inclusive
        let last_task = n_jobs.checked_sub(1).ok_or(Error::EmptyArray)?;
        info!("Rendering {} job array with {n_jobs} tasks, {} at a time", self.name, self.max_concurrent);

        let mut tt = TinyTemplate::new();
        tt.set_default_formatter(&tinytemplate::format_unescaped);
        tt.add_template("array_job", ARRAY_JOB)?;

        let context = ArrayContext {
            name: &self.name,
            time_limit: &self.time_limit,
            memory_limit: self.memory_limit,
            partition: &self.partition,
            gres: non_empty(&self.gres),
            email: non_empty(&self.email),
            last_task,
            max_concurrent: self.max_concurrent,
            modules: lines(&self.modules),
            conda_environments: lines(&self.conda_environments),
            additional_commands: lines(&self.additional_commands),
            commands_path: commands_path.to_string_lossy().into_owned(),
            rendered_at: now.to_string(),
        };

        Ok(JobScript { content: tt.render("array_job", &context)? })
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

/// Blank entries would render as empty shell lines
fn lines(values: &[String]) -> Vec<&str> {
    values.iter()
        .map(String::as_str)
        .filter(|s| !s.trim().is_empty())
        .collect()
}

//! Render job array scripts and submit them to SLURM

/// Render the job array template with array job settings
pub mod script;

/// Run sbatch on a rendered script
pub mod submit;

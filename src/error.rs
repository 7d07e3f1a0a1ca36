use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

/// Failures from the filesystem, recipe, template, and sbatch wrappers
///
/// Path translation never fails and has no variant here.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("can't access {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("malformed recipe {}: {source}", path.display())]
    Yaml { path: PathBuf, source: serde_saphyr::Error },

    #[error("recipe {} has no key {key}", path.display())]
    MissingKey { key: String, path: PathBuf },

    #[error("recipe {} has an unexpected value for {key}: {source}", path.display())]
    InvalidValue { key: String, path: PathBuf, source: serde_json::Error },

    #[error("malformed array job config {}: {source}", path.display())]
    Config { path: PathBuf, source: serde_json::Error },

    #[error("can't render job script: {0}")]
    Template(#[from] tinytemplate::error::Error),

    #[error("job array needs at least one command")]
    EmptyArray,

    #[error("sbatch exited with {status}: {stderr}")]
    Sbatch { status: ExitStatus, stderr: String },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Attach the offending path to an io::Error, used with `map_err`
    pub fn io(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Error {
        let path = path.into();
        move |source| Error::Io { path, source }
    }
}

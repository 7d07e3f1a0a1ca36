//! Find experiment, session, and channel directories on the shared filesystem

use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Session directories are named `ses-01`, `ses_baseline`, ...
static SESSION_PREFIX: &str = "ses";

/// Stitched channel images of a brain live in `<brain_dir>/<mouse_id>/stitchedImages_100`
static STITCHED_DIR: &str = "stitchedImages_100";

/// Every direct child of a rawdata directory, one per experiment
pub fn experiment_directories(rawdata_dir: &Path) -> Result<Vec<PathBuf>> {
    info!("Listing experiments in {}", rawdata_dir.display());
    list_children(rawdata_dir)
}

/// Directories named `ses*` at any depth below a rawdata directory
pub fn session_directories(rawdata_dir: &Path) -> Result<Vec<PathBuf>> {
    info!("Searching {} for sessions", rawdata_dir.display());
    let mut sessions = Vec::new();

    // min_depth skips the root, which may itself be called ses*
    for entry in WalkDir::new(rawdata_dir).min_depth(1) {
        let entry = entry.map_err(|err| {
            let path = err.path().unwrap_or(rawdata_dir).to_path_buf();
            Error::Io { path, source: err.into() }
        })?;

        let is_session = entry.file_name().to_string_lossy().starts_with(SESSION_PREFIX);
        if is_session && entry.file_type().is_dir() {
            sessions.push(entry.into_path());
        }
    }

    sessions.sort();
    info!("Found {} sessions", sessions.len());
    Ok(sessions)
}

/// Every file in a brain's stitched image directory, one per channel
pub fn channel_paths(mouse_id: &str, brain_dir: &Path) -> Result<Vec<PathBuf>> {
    let stitched = brain_dir.join(mouse_id).join(STITCHED_DIR);
    info!("Listing channels for {mouse_id} in {}", stitched.display());
    list_children(&stitched)
}

/// Children of `dir`, skipping dot entries like `.DS_Store` and `._*` resource forks
fn list_children(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(Error::io(dir))? {
        let entry = entry.map_err(Error::io(dir))?;
        if !entry.file_name().to_string_lossy().starts_with('.') {
            paths.push(entry.path());
        }
    }
    paths.sort();
    Ok(paths)
}

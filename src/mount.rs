//! Translate paths between a workstation's mounted volumes and the cluster's own mount root
//!
//! Commands are usually written on a laptop where shared storage shows up as
//! `/Volumes/<label>/...`, but they run on cluster nodes where the same data lives under a base
//! root like `/ceph/margrie`. Every command path is rewritten so it's valid on the cluster.

use std::path::{Component, Path, PathBuf};

use log::debug;

/// Default first segment of a locally mounted shared volume (macOS convention)
pub static DEFAULT_MARKER: &str = "Volumes";

/// A local mount convention: `/<marker>/<volume label>/...`
///
/// The volume label is deliberately ignored, users mount the same share under different names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountAlias {
    marker: String,
}

impl Default for MountAlias {
    fn default() -> Self {
        MountAlias::new(DEFAULT_MARKER)
    }
}

impl MountAlias {
    pub fn new(marker: impl Into<String>) -> Self {
        MountAlias { marker: marker.into() }
    }

    /// Rewrite `input` so it lives under `base_root`
    ///
    /// Checked in order:
    /// 1. `/<marker>/<label>/rest...` becomes `base_root/rest...` (needs at least one segment
    ///    after the label, and an absolute base root)
    /// 2. a path already under `base_root` is kept as is
    /// 3. any other absolute path loses its root segment (`/other/root/x` -> `root/x`) and is
    ///    appended to `base_root`
    /// 4. a relative path is appended to `base_root`
    ///
    /// The result is always rooted, `/` separated, with no empty or `\` segments. Never fails.
    pub fn translate(&self, base_root: &Path, input: &Path) -> PathBuf {
        let merged = if let Some(rest) = self.strip_alias(base_root, input) {
            debug!("{} is on a mounted volume", input.display());
            base_root.join(rest)
        } else if let Ok(rel) = input.strip_prefix(base_root) {
            base_root.join(rel)
        } else if input.has_root() {
            base_root.join(without_root(input))
        } else {
            base_root.join(input)
        };

        to_unix(&merged)
    }

    /// Returns the segments after `/<marker>/<label>` if `input` is on a mounted volume
    fn strip_alias(&self, base_root: &Path, input: &Path) -> Option<PathBuf> {
        if !input.has_root() || !base_root.has_root() {
            return None;
        }

        let mut segments = input.components().filter(|c| matches!(c, Component::Normal(_)));
        let marker = segments.next()?;
        let _label = segments.next()?;
        let rest: PathBuf = segments.collect();

        // the volume root itself falls through to the generic branches
        if marker.as_os_str() != self.marker.as_str() || rest.as_os_str().is_empty() {
            return None;
        }
        Some(rest)
    }
}

/// Translate a batch of paths against the same base root
pub fn translate_all<P: AsRef<Path>>(alias: &MountAlias, base_root: &Path, paths: &[P]) -> Vec<PathBuf> {
    paths.iter().map(|p| alias.translate(base_root, p.as_ref())).collect()
}

/// Drop the root and the first named segment under it
fn without_root(path: &Path) -> PathBuf {
    path.components()
        .skip_while(|c| matches!(c, Component::Prefix(_) | Component::RootDir))
        .skip(1)
        .collect()
}

/// Rebuild a path as `/a/b/c`, dropping empty and backslash-only segments
fn to_unix(path: &Path) -> PathBuf {
    let segments: Vec<String> = path.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            Component::ParentDir => Some("..".to_string()),
            Component::Prefix(_) | Component::RootDir | Component::CurDir => None,
        })
        .filter(|s| !s.is_empty() && s != "\\")
        .collect();

    PathBuf::from(format!("/{}", segments.join("/")))
}

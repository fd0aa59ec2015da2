//! On-disk layout of the two image collections.

use serde::Serialize;
use std::path::{Path, PathBuf};

/// Logical collection a stored image belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Collection {
    Profile,
    LiveCapture,
}

impl Collection {
    /// Prefix prepended to generated file names in this collection.
    pub fn name_prefix(self) -> &'static str {
        match self {
            Collection::Profile => "",
            Collection::LiveCapture => "livecam_",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Collection::Profile => "profile",
            Collection::LiveCapture => "live-capture",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Directories backing each collection. Handed to both ingestion and the
/// comparator at construction.
#[derive(Debug, Clone)]
pub struct StorageLayout {
    profile_dir: PathBuf,
    live_capture_dir: PathBuf,
}

impl StorageLayout {
    pub fn new(profile_dir: impl Into<PathBuf>, live_capture_dir: impl Into<PathBuf>) -> Self {
        Self {
            profile_dir: profile_dir.into(),
            live_capture_dir: live_capture_dir.into(),
        }
    }

    pub fn dir(&self, collection: Collection) -> &Path {
        match collection {
            Collection::Profile => &self.profile_dir,
            Collection::LiveCapture => &self.live_capture_dir,
        }
    }

    /// Create both collection directories if missing.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.profile_dir)?;
        std::fs::create_dir_all(&self.live_capture_dir)
    }

    /// Resolve a client-supplied name inside a collection.
    ///
    /// Only the final path segment is honoured, so `../../etc/passwd`
    /// resolves to `<dir>/passwd`. Returns `None` when no usable segment
    /// remains.
    pub fn resolve(&self, collection: Collection, name: &str) -> Option<PathBuf> {
        final_segment(name).map(|segment| self.dir(collection).join(segment))
    }
}

/// Last `/`- or `\`-separated segment of `name`, rejecting empty and dot segments.
pub fn final_segment(name: &str) -> Option<&str> {
    let segment = name.rsplit(['/', '\\']).next()?.trim();
    match segment {
        "" | "." | ".." => None,
        s => Some(s),
    }
}

//! Media Storage
//!
//! Read-only access to book images stored under the media root.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::domain::value_objects::MediaPath;

#[derive(Debug, Clone)]
pub struct MediaStorage {
    root: PathBuf,
}

impl MediaStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `MediaPath` never escapes the root
    pub fn path_of(&self, path: &MediaPath) -> PathBuf {
        self.root.join(path.as_str())
    }

    /// Size in bytes, `None` when the file is missing or unreadable
    pub async fn file_size(&self, path: &MediaPath) -> Option<u64> {
        match tokio::fs::metadata(self.path_of(path)).await {
            Ok(meta) if meta.is_file() => Some(meta.len()),
            Ok(_) => None,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.as_str(), "Book image missing on disk");
                None
            }
            Err(e) => {
                tracing::warn!(path = %path.as_str(), error = %e, "Could not stat book image");
                None
            }
        }
    }
}

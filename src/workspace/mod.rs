//! Disk-backed workspace holding the pipeline's stage artifacts.
//!
//! A workspace is a fixed `workspace/` subdirectory under a configured base
//! path. It is created implicitly on first write, persists across process
//! restarts, and is never cleaned up automatically. Logical artifact names
//! are resolved by a plain join onto the root; guarding against path
//! traversal out of the root is the job of the outer execution sandbox, not
//! this resolver.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tempfile::NamedTempFile;

use crate::error::WorkspaceError;

/// Fixed subdirectory appended to the configured base path.
pub const WORKSPACE_SUBDIR: &str = "workspace";

/// Maps logical artifact names onto a real directory and performs the
/// pipeline's file I/O.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Create a workspace rooted at `{base}/workspace`.
    ///
    /// The base path is an explicit configuration value; nothing here falls
    /// back to an environment-specific default.
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self {
            root: base.into().join(WORKSPACE_SUBDIR),
        }
    }

    /// The real directory holding the artifacts.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a logical relative name to its real path.
    pub fn resolve(&self, logical: &str) -> PathBuf {
        self.root.join(logical)
    }

    /// Whether an artifact currently exists.
    pub fn exists(&self, logical: &str) -> bool {
        self.resolve(logical).is_file()
    }

    /// Last modification time of an artifact, if it exists.
    pub fn modified(&self, logical: &str) -> Option<DateTime<Utc>> {
        let metadata = fs::metadata(self.resolve(logical)).ok()?;
        let modified = metadata.modified().ok()?;
        Some(DateTime::<Utc>::from(modified))
    }

    /// Read an artifact's full text.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceError::Missing`] if the artifact does not exist so
    /// callers can treat absence as a recoverable, operator-facing condition.
    pub fn read_artifact(&self, logical: &str) -> Result<String, WorkspaceError> {
        fs::read_to_string(self.resolve(logical)).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                WorkspaceError::Missing(logical.to_string())
            } else {
                WorkspaceError::Io(e)
            }
        })
    }

    /// Write an artifact, creating parent directories as needed and
    /// unconditionally replacing any prior content.
    ///
    /// The write goes through a temp file in the target directory followed
    /// by a rename, so a concurrent reader never observes a partially
    /// written artifact.
    pub fn write_artifact(&self, logical: &str, content: &str) -> Result<(), WorkspaceError> {
        let path = self.resolve(logical);
        let parent = path.parent().unwrap_or(&self.root).to_path_buf();
        fs::create_dir_all(&parent)?;

        let mut tmp = NamedTempFile::new_in(&parent)?;
        tmp.write_all(content.as_bytes())?;
        tmp.persist(&path)
            .map_err(|e| WorkspaceError::Io(e.error))?;

        tracing::debug!(artifact = logical, path = %path.display(), "Artifact written");
        Ok(())
    }
}

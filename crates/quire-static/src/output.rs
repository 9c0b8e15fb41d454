//! Output tree writer.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Writes files below an output root.
///
/// Parent directories are created on demand and existing files are
/// overwritten. Writes are not atomic: an interrupted write can leave a
/// truncated file behind until the next build replaces it.
#[derive(Debug, Clone)]
pub struct OutputWriter {
    root: PathBuf,
}

impl OutputWriter {
    /// Create a writer for the given output root.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The output root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute destination for a path relative to the root.
    pub fn resolve(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.root.join(relative)
    }

    /// Write `content` to `relative`, returning the destination path.
    pub fn write(
        &self,
        relative: impl AsRef<Path>,
        content: impl AsRef<[u8]>,
    ) -> Result<PathBuf, WriteError> {
        let dest = self.prepare(relative.as_ref())?;

        fs::write(&dest, content).map_err(|source| WriteError {
            path: dest.clone(),
            source,
        })?;

        Ok(dest)
    }

    /// Copy the file at `from` to `relative`, returning the destination path.
    pub fn copy(&self, from: &Path, relative: impl AsRef<Path>) -> Result<PathBuf, WriteError> {
        let dest = self.prepare(relative.as_ref())?;

        fs::copy(from, &dest).map_err(|source| WriteError {
            path: dest.clone(),
            source,
        })?;

        Ok(dest)
    }

    fn prepare(&self, relative: &Path) -> Result<PathBuf, WriteError> {
        let dest = self.resolve(relative);

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|source| WriteError {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        Ok(dest)
    }
}

/// A file or directory in the output tree could not be written.
#[derive(Debug, thiserror::Error)]
#[error("Failed to write {}: {source}", path.display())]
pub struct WriteError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

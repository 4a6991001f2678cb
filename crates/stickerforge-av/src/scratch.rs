//! Scratch-file management for conversion requests.
//!
//! A [`ScratchSpace`] hands out uniquely named files on disk. Each file is
//! wrapped in a [`ScratchFile`] guard that deletes it when dropped, unless
//! ownership was handed to the caller with [`ScratchFile::keep`].

use std::path::{Path, PathBuf};

use stickerforge_core::config::ScratchConfig;
use stickerforge_core::{Error, Result};

/// Directory in which per-request working files are created.
#[derive(Debug, Clone)]
pub struct ScratchSpace {
    dir: PathBuf,
    prefix: String,
}

impl ScratchSpace {
    /// Build a scratch space from configuration.
    pub fn new(config: &ScratchConfig) -> Self {
        Self {
            dir: config.resolved_dir(),
            prefix: config.prefix.clone(),
        }
    }

    /// Scratch space rooted at `dir` with the default prefix.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            prefix: ScratchConfig::default().prefix,
        }
    }

    /// Path to the scratch directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create a new, empty, uniquely named file ending in `suffix`.
    ///
    /// Names carry a random component, so concurrent requests sharing the
    /// directory never collide.
    pub fn acquire(&self, suffix: &str) -> Result<ScratchFile> {
        std::fs::create_dir_all(&self.dir)?;
        let path = tempfile::Builder::new()
            .prefix(&self.prefix)
            .suffix(suffix)
            .tempfile_in(&self.dir)?
            .into_temp_path()
            .keep()
            .map_err(|e| Error::from(e.error))?;

        tracing::trace!("acquired scratch file {}", path.display());
        Ok(ScratchFile::adopt(path))
    }
}

/// Owned handle to a working file. Deleted on drop unless kept.
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
    armed: bool,
}

impl ScratchFile {
    /// Take ownership of an existing path; it will be deleted on drop.
    pub fn adopt(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            armed: true,
        }
    }

    /// A sibling path named `<this file>.<extension>` for a derived output.
    ///
    /// Nothing is created on disk; the guard only removes the file if a
    /// converter wrote it.
    pub fn derive(&self, extension: &str) -> ScratchFile {
        let mut name = self.path.clone().into_os_string();
        name.push(".");
        name.push(extension);
        ScratchFile::adopt(PathBuf::from(name))
    }

    /// The file's path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the file now. Safe to call any number of times.
    pub fn release(&mut self) -> Result<()> {
        if self.armed {
            release_path(&self.path)?;
            self.armed = false;
        }
        Ok(())
    }

    /// Hand the file to the caller; it will no longer be deleted.
    pub fn keep(mut self) -> PathBuf {
        self.armed = false;
        std::mem::take(&mut self.path)
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            tracing::warn!("failed to release scratch file {}: {e}", self.path.display());
        }
    }
}

/// Delete `path` if present. A missing file is not an error.
pub fn release_path(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            tracing::trace!("released scratch file {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

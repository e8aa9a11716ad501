//! Scratch directory holding per-command sinks

use crate::core::error::{Error, Result};
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;

const WORKDIR_PREFIX: &str = "parallel_exec_";

/// Temporary directory shared by all executor invocations of one run
///
/// Dropping a `WorkDir` without calling [`WorkDir::release`] removes it, so
/// every early return and panic path still cleans up.
#[derive(Debug)]
pub struct WorkDir {
    dir: TempDir,
}

/// What happened to the directory at the end of a run
#[derive(Debug)]
pub enum Released {
    Removed,
    Kept(PathBuf),
    Failed(PathBuf, io::Error),
}

impl WorkDir {
    /// Create a fresh directory under the system temp location
    pub fn create() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(WORKDIR_PREFIX)
            .tempdir()
            .map_err(Error::WorkDir)?;
        debug!("Created working directory {}", dir.path().display());
        Ok(Self { dir })
    }

    /// Create the directory under a specific parent
    pub fn create_in<P: AsRef<Path>>(parent: P) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(WORKDIR_PREFIX)
            .tempdir_in(parent)
            .map_err(Error::WorkDir)?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Remove the directory, or keep it on disk when `keep` is set
    pub fn release(self, keep: bool) -> Released {
        if keep {
            return Released::Kept(self.dir.keep());
        }
        let path = self.dir.path().to_path_buf();
        match self.dir.close() {
            Ok(()) => Released::Removed,
            Err(err) => Released::Failed(path, err),
        }
    }
}

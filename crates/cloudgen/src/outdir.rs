//! Fresh output directories.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// A directory that was emptied (or created) on acquisition.
///
/// Whatever existed at the path before is gone once `prepare` returns,
/// so files written through this handle never mix with stale output.
#[derive(Debug)]
pub struct FreshDir {
    path: PathBuf,
}

impl FreshDir {
    /// Remove anything at `path` and create an empty directory there.
    pub fn prepare(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        match fs::symlink_metadata(&path) {
            Ok(meta) if meta.is_dir() => fs::remove_dir_all(&path)?,
            Ok(_) => fs::remove_file(&path)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
        fs::create_dir_all(&path)?;
        log::debug!("Prepared fresh directory {}", path.display());
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `contents` to `name` inside the directory.
    pub fn write(&self, name: &str, contents: &str) -> io::Result<PathBuf> {
        let target = self.path.join(name);
        fs::write(&target, contents)?;
        Ok(target)
    }
}

//! Exclusive ownership of a target directory for the length of one install

use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use crate::error::{InstallError, Result};

/// Lock file name inside the target directory
pub const LOCK_FILE: &str = ".gdcli.lock";

/// Advisory lock on a target directory, released (and its file removed) on drop
#[derive(Debug)]
pub struct TargetLock {
    file: File,
    path: PathBuf,
}

impl TargetLock {
    /// Take the lock without waiting; fails with `TargetBusy` if it is held
    pub fn acquire(target_dir: &Path) -> Result<Self> {
        let path = target_dir.join(LOCK_FILE);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| InstallError::install_io(target_dir, "cannot create lock file", e))?;

        Self::lock_opened(file, path, target_dir)
    }

    fn lock_opened(file: File, path: PathBuf, target_dir: &Path) -> Result<Self> {
        let busy = || InstallError::TargetBusy {
            target: target_dir.to_path_buf(),
        };

        if let Err(e) = file.try_lock_exclusive() {
            if e.raw_os_error() == fs2::lock_contended_error().raw_os_error()
                || e.kind() == std::io::ErrorKind::WouldBlock
            {
                return Err(busy());
            }
            return Err(InstallError::install_io(target_dir, "cannot lock target directory", e));
        }

        // The previous holder unlinks the file before unlocking. A handle
        // opened before that unlink locks an orphan, so the lock only counts
        // if the path still names the file we hold.
        if !still_linked(&file, &path) {
            tracing::debug!("Lock file {} was replaced while waiting", path.display());
            return Err(busy());
        }

        tracing::debug!("Locked {}", target_dir.display());
        Ok(Self { file, path })
    }
}

#[cfg(unix)]
fn still_linked(file: &File, path: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;

    match (file.metadata(), std::fs::metadata(path)) {
        (Ok(held), Ok(current)) => held.dev() == current.dev() && held.ino() == current.ino(),
        _ => false,
    }
}

// Open files cannot be unlinked on Windows, so the lock file is never replaced
#[cfg(not(unix))]
fn still_linked(_file: &File, _path: &Path) -> bool {
    true
}

impl Drop for TargetLock {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            tracing::debug!("Could not remove lock file {}: {}", self.path.display(), e);
        }
        if let Err(e) = FileExt::unlock(&self.file) {
            tracing::warn!("Failed to release lock {}: {}", self.path.display(), e);
        }
    }
}

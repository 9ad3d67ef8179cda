//! Removal of per-install scratch state

use std::io::ErrorKind;
use std::path::Path;

/// Remove the scratch tree and the downloaded archive
///
/// Runs on success and failure alike. Problems are logged and swallowed so
/// they never replace the outcome of the install itself.
pub fn cleanup(scratch_root: &Path, archive_path: &Path) {
    match std::fs::remove_dir_all(scratch_root) {
        Ok(()) => tracing::debug!("Removed scratch directory {}", scratch_root.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(
            "Failed to remove scratch directory {}: {}",
            scratch_root.display(),
            e
        ),
    }

    match std::fs::remove_file(archive_path) {
        Ok(()) => tracing::debug!("Removed archive {}", archive_path.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => tracing::warn!("Failed to remove archive {}: {}", archive_path.display(), e),
    }
}

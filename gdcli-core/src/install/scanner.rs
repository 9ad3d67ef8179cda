//! Locating the engine executables inside an extracted archive
//!
//! Upstream archives do not keep the executable at a fixed depth: it may sit
//! at the root or several directories down (`Godot_v4.3-stable_mono_win64/`,
//! `Godot.app/Contents/MacOS/`). The scan walks the tree depth-first in
//! lexical order and stops at the first directory holding a primary
//! executable. It does not try to pick the "best" directory.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{InstallError, Result};
use crate::platform::{ExecutableKind, PlatformPolicy};

/// Executables found in one directory of the scratch tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutableSet {
    /// Directory the executables were found in
    pub dir: PathBuf,
    pub primary: PathBuf,
    /// Console companion, when the archive ships one
    pub secondary: Option<PathBuf>,
}

/// Find the first directory under `root` (inclusive) holding a primary executable
pub fn locate_executables(root: &Path, policy: &PlatformPolicy) -> Result<ExecutableSet> {
    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("Skipping unreadable path during scan: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_dir());

    for dir in walker {
        match classify_dir(dir.path(), policy) {
            Ok(Some(found)) => {
                tracing::debug!(
                    "Found {} in {}",
                    found.primary.display(),
                    found.dir.display()
                );
                return Ok(found);
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!("Cannot list {}: {}", dir.path().display(), e);
            }
        }
    }

    Err(InstallError::ExecutableNotFound {
        root: root.to_path_buf(),
    })
}

/// Classify the immediate files of one directory
///
/// Returns `None` unless a primary executable is present. When several
/// files qualify, the lexically first one is chosen.
pub fn classify_dir(dir: &Path, policy: &PlatformPolicy) -> std::io::Result<Option<ExecutableSet>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
    }
    names.sort();

    let mut primary = None;
    let mut secondary = None;
    for name in names {
        match policy.classify(&name) {
            Some(ExecutableKind::Primary) if primary.is_none() => primary = Some(dir.join(&name)),
            Some(ExecutableKind::Secondary) if secondary.is_none() => {
                secondary = Some(dir.join(&name))
            }
            _ => {}
        }
    }

    Ok(primary.map(|primary| ExecutableSet {
        dir: dir.to_path_buf(),
        primary,
        secondary,
    }))
}

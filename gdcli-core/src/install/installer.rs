//! Placing located executables under their canonical names
//!
//! Each executable is copied (never renamed, so scratch and target may sit on
//! different volumes) into a staging file beside its destination, synced,
//! and then renamed over the canonical name. An earlier install stays intact
//! until its replacement is fully on disk. Whatever else shares the
//! executable's directory is copied alongside it.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use walkdir::WalkDir;

use super::scanner::ExecutableSet;
use crate::config::RetryPolicy;
use crate::error::{InstallError, Result};
use crate::platform::{ExecutableKind, PlatformPolicy};

/// Canonical paths written by a successful install
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
    pub primary: PathBuf,
    pub secondary: Option<PathBuf>,
}

/// Copies executables into a target directory
pub struct Installer {
    policy: &'static PlatformPolicy,
    retry: RetryPolicy,
}

impl Installer {
    pub fn new(policy: &'static PlatformPolicy, retry: RetryPolicy) -> Self {
        Self { policy, retry }
    }

    /// Install `executables` into `target_dir`, replacing any previous install
    pub async fn install(&self, executables: &ExecutableSet, target_dir: &Path) -> Result<InstallOutcome> {
        tokio::fs::create_dir_all(target_dir)
            .await
            .map_err(|e| InstallError::install_io(target_dir, "cannot create target directory", e))?;

        // Freshly extracted files can lag behind in directory listings
        tokio::time::sleep(self.retry.settle_delay()).await;

        let primary = self
            .place(&executables.primary, ExecutableKind::Primary, target_dir)
            .await?
            .ok_or_else(|| InstallError::InstallFailed {
                target: target_dir.to_path_buf(),
                reason: format!(
                    "main executable {} not visible after {} attempts",
                    executables.primary.display(),
                    self.retry.attempts()
                ),
                source: None,
            })?;

        let secondary = match &executables.secondary {
            Some(source) => self.place(source, ExecutableKind::Secondary, target_dir).await?,
            None => None,
        };

        if secondary.is_none() {
            tracing::warn!("Console executable not found after extraction");
            self.remove_stale(ExecutableKind::Secondary, target_dir).await?;
        }

        self.carry_siblings(executables, target_dir).await?;

        Ok(InstallOutcome { primary, secondary })
    }

    /// Copy everything else in the executable's directory into `target_dir`
    ///
    /// Mono builds keep their `GodotSharp` assemblies beside the editor and
    /// cannot start without them. Earlier copies of each entry are replaced.
    async fn carry_siblings(&self, executables: &ExecutableSet, target_dir: &Path) -> Result<()> {
        let mut skip: Vec<OsString> = [Some(&executables.primary), executables.secondary.as_ref()]
            .into_iter()
            .flatten()
            .filter_map(|path| path.file_name().map(OsString::from))
            .collect();
        skip.extend(
            [ExecutableKind::Primary, ExecutableKind::Secondary]
                .map(|kind| OsString::from(self.policy.canonical_name(kind))),
        );

        let (source_dir, target) = (executables.dir.clone(), target_dir.to_path_buf());
        let copied = tokio::task::spawn_blocking(move || copy_siblings(&source_dir, &target, &skip))
            .await
            .map_err(|e| InstallError::InstallFailed {
                target: target_dir.to_path_buf(),
                reason: format!("copy of companion files failed: {e}"),
                source: None,
            })??;

        if copied > 0 {
            tracing::info!("Copied {} companion entries into {}", copied, target_dir.display());
        }
        Ok(())
    }

    /// Wait for `source` to become visible, then swap it into place
    ///
    /// Returns `None` when the source never showed up.
    async fn place(&self, source: &Path, kind: ExecutableKind, target_dir: &Path) -> Result<Option<PathBuf>> {
        if !self.wait_until_listed(source).await {
            return Ok(None);
        }

        let canonical = self.policy.canonical_name(kind);
        let destination = target_dir.join(canonical);
        let staging = target_dir.join(format!(".{canonical}.partial"));

        if let Err(e) = self.stage(source, &staging).await {
            if let Err(cleanup_err) = tokio::fs::remove_file(&staging).await {
                if cleanup_err.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!("Failed to remove {}: {}", staging.display(), cleanup_err);
                }
            }
            return Err(e);
        }

        tokio::fs::rename(&staging, &destination)
            .await
            .map_err(|e| InstallError::install_io(target_dir, format!("cannot replace {canonical}"), e))?;

        if let Err(e) = tokio::fs::remove_file(source).await {
            tracing::warn!("Failed to remove original {}: {}", source.display(), e);
        }

        let source_name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        tracing::info!("Copied {} -> {}", source_name, canonical);

        Ok(Some(destination))
    }

    /// Copy into the staging file, fsync it and set permissions
    async fn stage(&self, source: &Path, staging: &Path) -> Result<()> {
        let target_dir = staging.parent().unwrap_or(staging);

        let mut input = tokio::fs::File::open(source)
            .await
            .map_err(|e| InstallError::install_io(target_dir, format!("cannot open {}", source.display()), e))?;
        let mut output = tokio::fs::File::create(staging)
            .await
            .map_err(|e| InstallError::install_io(target_dir, format!("cannot create {}", staging.display()), e))?;

        tokio::io::copy(&mut input, &mut output)
            .await
            .map_err(|e| InstallError::install_io(target_dir, format!("copy of {} failed", source.display()), e))?;
        output
            .flush()
            .await
            .map_err(|e| InstallError::install_io(target_dir, "flush failed", e))?;
        output
            .sync_all()
            .await
            .map_err(|e| InstallError::install_io(target_dir, "fsync failed", e))?;
        drop(output);

        self.policy
            .make_executable(staging)
            .map_err(|e| InstallError::install_io(target_dir, "cannot set executable permission", e))?;

        Ok(())
    }

    /// Probe the parent directory listing for `source`, up to the retry budget
    async fn wait_until_listed(&self, source: &Path) -> bool {
        let attempts = self.retry.attempts();

        for attempt in 1..=attempts {
            if is_listed(source).await {
                if attempt > 1 {
                    tracing::debug!("{} visible on attempt {}", source.display(), attempt);
                }
                return true;
            }

            if attempt < attempts {
                tracing::info!("Retrying file detection ({}/{})...", attempt, attempts);
                tokio::time::sleep(self.retry.backoff()).await;
            }
        }

        false
    }

    /// Remove a canonical file left behind by an earlier install
    async fn remove_stale(&self, kind: ExecutableKind, target_dir: &Path) -> Result<()> {
        let stale = target_dir.join(self.policy.canonical_name(kind));
        match tokio::fs::remove_file(&stale).await {
            Ok(()) => {
                tracing::debug!("Removed stale {}", stale.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(InstallError::install_io(
                target_dir,
                format!("cannot remove stale {}", stale.display()),
                e,
            )),
        }
    }
}

/// Copy each entry of `source_dir` not named in `skip` into `target_dir`
///
/// Returns the number of top-level entries copied.
fn copy_siblings(source_dir: &Path, target_dir: &Path, skip: &[OsString]) -> Result<usize> {
    let io_err = |reason: String, e: std::io::Error| InstallError::install_io(target_dir, reason, e);

    let entries = std::fs::read_dir(source_dir)
        .map_err(|e| io_err(format!("cannot list {}", source_dir.display()), e))?;

    let mut copied = 0;
    for entry in entries {
        let entry = entry.map_err(|e| io_err(format!("cannot list {}", source_dir.display()), e))?;
        let name = entry.file_name();
        if skip.contains(&name) {
            continue;
        }

        let destination = target_dir.join(&name);
        remove_existing(&destination).map_err(|e| io_err(format!("cannot replace {}", destination.display()), e))?;
        copy_tree(&entry.path(), &destination, target_dir)?;
        tracing::debug!("Copied {} -> {}", entry.path().display(), destination.display());
        copied += 1;
    }

    Ok(copied)
}

fn remove_existing(path: &Path) -> std::io::Result<()> {
    match std::fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => std::fs::remove_dir_all(path),
        Ok(_) => std::fs::remove_file(path),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Recursively copy `source` (file or directory) to `destination`
fn copy_tree(source: &Path, destination: &Path, target_dir: &Path) -> Result<()> {
    for entry in WalkDir::new(source).follow_links(false) {
        let entry = entry.map_err(|e| InstallError::InstallFailed {
            target: target_dir.to_path_buf(),
            reason: format!("cannot walk {}: {e}", source.display()),
            source: e.into_io_error(),
        })?;

        let out_path = match entry.path().strip_prefix(source) {
            Ok(relative) if !relative.as_os_str().is_empty() => destination.join(relative),
            _ => destination.to_path_buf(),
        };

        let result = if entry.file_type().is_dir() {
            std::fs::create_dir_all(&out_path)
        } else {
            std::fs::copy(entry.path(), &out_path).map(|_| ())
        };
        result.map_err(|e| InstallError::install_io(target_dir, format!("cannot copy {}", entry.path().display()), e))?;
    }

    Ok(())
}

/// Whether `path` appears in its parent's directory listing
async fn is_listed(path: &Path) -> bool {
    let (Some(parent), Some(name)) = (path.parent(), path.file_name()) else {
        return false;
    };

    let Ok(mut entries) = tokio::fs::read_dir(parent).await else {
        return false;
    };

    while let Ok(Some(entry)) = entries.next_entry().await {
        if entry.file_name().as_os_str() == name {
            return true;
        }
    }

    false
}

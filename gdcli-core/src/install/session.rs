//! End-to-end install of one resolved version
//!
//! Stages run strictly in order:
//!
//! ```text
//! Resolved → Downloading → Extracting → Locating → Installing → Cleaning → Done
//!     └──────────┴─────────────┴────────────┴────────────┴──► Cleaning → Failed
//! ```
//!
//! Cleanup runs before `install_version` returns, whichever stage failed.

use std::fmt;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

use super::cleanup::cleanup;
use super::extractor::extract;
use super::fetcher::Fetcher;
use super::installer::{InstallOutcome, Installer};
use super::lock::TargetLock;
use super::scanner::locate_executables;
use crate::catalog::ResolvedVersion;
use crate::config::InstallConfig;
use crate::error::{InstallError, Result};

/// Prefix of the per-install scratch directory created inside the target
const SCRATCH_PREFIX: &str = ".gdcli-extract-";

/// Prefix of the downloaded archive, so it never shadows a canonical name
const DOWNLOAD_PREFIX: &str = ".gdcli-download-";

/// Progress of one install operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Resolved,
    Downloading,
    Extracting,
    Locating,
    Installing,
    Cleaning,
    Done,
    Failed,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Resolved => "resolved",
            Stage::Downloading => "downloading",
            Stage::Extracting => "extracting",
            Stage::Locating => "locating",
            Stage::Installing => "installing",
            Stage::Cleaning => "cleaning",
            Stage::Done => "done",
            Stage::Failed => "failed",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runs installs with one configuration
pub struct InstallSession {
    config: InstallConfig,
    fetcher: Fetcher,
    cancel: CancellationToken,
}

impl InstallSession {
    pub fn new(config: InstallConfig) -> Result<Self> {
        let fetcher = Fetcher::new(&config.download)?;
        Ok(Self {
            config,
            fetcher,
            cancel: CancellationToken::new(),
        })
    }

    /// Use an externally owned token to cancel between stages
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Download, extract and install `version` into `target_dir`
    ///
    /// Concurrent installs into the same directory are rejected with
    /// `TargetBusy`. Scratch state and the archive are always removed.
    pub async fn install_version(&self, version: &ResolvedVersion, target_dir: &Path) -> Result<InstallOutcome> {
        tracing::info!(
            stage = %Stage::Resolved,
            "Installing {} for {}",
            version.display_name,
            version.platform
        );

        std::fs::create_dir_all(target_dir)
            .map_err(|e| InstallError::install_io(target_dir, "cannot create target directory", e))?;
        let _lock = TargetLock::acquire(target_dir)?;

        let archive_path = download_path(target_dir, version);
        let scratch_root = tempfile::Builder::new()
            .prefix(SCRATCH_PREFIX)
            .tempdir_in(target_dir)
            .map_err(|e| InstallError::install_io(target_dir, "cannot create scratch directory", e))?
            .keep();

        let result = self
            .run_stages(version, &archive_path, &scratch_root, target_dir)
            .await;

        tracing::debug!(stage = %Stage::Cleaning, "Removing scratch state");
        cleanup(&scratch_root, &archive_path);

        match &result {
            Ok(outcome) => tracing::info!(
                stage = %Stage::Done,
                "Installed {} to {}",
                version.display_name,
                outcome.primary.display()
            ),
            Err(e) => tracing::error!(stage = %Stage::Failed, "Installation failed: {}", e),
        }

        result
    }

    async fn run_stages(
        &self,
        version: &ResolvedVersion,
        archive_path: &Path,
        scratch_root: &Path,
        target_dir: &Path,
    ) -> Result<InstallOutcome> {
        self.checkpoint(Stage::Downloading)?;
        self.fetcher.fetch(&version.url, archive_path).await?;

        self.checkpoint(Stage::Extracting)?;
        let (archive, scratch): (PathBuf, PathBuf) = (archive_path.to_path_buf(), scratch_root.to_path_buf());
        let files = tokio::task::spawn_blocking(move || extract(&archive, &scratch))
            .await
            .map_err(|e| InstallError::extract_source(archive_path, "extraction task failed", e))??;
        tracing::debug!("Extracted {} files", files);

        self.checkpoint(Stage::Locating)?;
        let policy = version.platform.policy();
        let executables = locate_executables(scratch_root, policy)?;

        self.checkpoint(Stage::Installing)?;
        Installer::new(policy, self.config.retry.clone())
            .install(&executables, target_dir)
            .await
    }

    /// Log the transition into `stage`, failing if cancellation was requested
    fn checkpoint(&self, stage: Stage) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(InstallError::Cancelled {
                stage: stage.as_str(),
            });
        }
        tracing::info!(stage = %stage, "Entering {} stage", stage);
        Ok(())
    }
}

/// Where the archive for `version` is saved inside `target_dir`
fn download_path(target_dir: &Path, version: &ResolvedVersion) -> PathBuf {
    target_dir.join(format!("{DOWNLOAD_PREFIX}{}", version.archive_name()))
}

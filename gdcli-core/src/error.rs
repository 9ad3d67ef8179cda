//! Install error types with clear, actionable messages

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while resolving or installing an engine version.
///
/// Every variant is terminal for the operation that raised it. The only
/// retrying happens inside the installer's visibility probe, and that
/// surfaces as [`InstallError::InstallFailed`] once exhausted.
#[derive(Error, Debug)]
pub enum InstallError {
    /// The identifier matched nothing in the catalog
    #[error("No versions found matching '{identifier}'")]
    NotFound { identifier: String },

    /// The identifier matched several entries only by substring
    #[error("Multiple versions match '{identifier}':\n  {}", candidates.join("\n  "))]
    Ambiguous {
        identifier: String,
        candidates: Vec<String>,
    },

    /// Transport failure or non-success HTTP status
    #[error("Download failed for {url}: {reason}")]
    DownloadFailed {
        url: String,
        status: Option<u16>,
        reason: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Corrupt, unreadable or unsafe archive
    #[error("Failed to extract {archive}: {reason}")]
    ExtractFailed {
        archive: PathBuf,
        reason: String,
        #[source]
        source: Option<BoxError>,
    },

    /// The layout scan found no directory holding a primary executable
    #[error("No engine executable found anywhere under {root}")]
    ExecutableNotFound { root: PathBuf },

    /// Copy, swap or permission failure in the target directory
    #[error("Installation into {target} failed: {reason}")]
    InstallFailed {
        target: PathBuf,
        reason: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Another install currently holds the target directory
    #[error("Another install is already running in {target}")]
    TargetBusy { target: PathBuf },

    /// The operation was cancelled between stages
    #[error("Installation cancelled during {stage}")]
    Cancelled { stage: &'static str },

    /// Configuration or catalog file could not be loaded
    #[error("Invalid configuration in {origin}: {reason}")]
    Config {
        origin: String,
        reason: String,
        #[source]
        source: Option<BoxError>,
    },
}

/// Underlying library error kept as the `source` of an [`InstallError`]
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

impl InstallError {
    pub(crate) fn download(url: &str, reason: impl ToString) -> Self {
        InstallError::DownloadFailed {
            url: url.to_string(),
            status: None,
            reason: reason.to_string(),
            source: None,
        }
    }

    pub(crate) fn download_source(url: &str, reason: impl ToString, source: impl Into<BoxError>) -> Self {
        InstallError::DownloadFailed {
            url: url.to_string(),
            status: None,
            reason: reason.to_string(),
            source: Some(source.into()),
        }
    }

    pub(crate) fn extract(archive: &std::path::Path, reason: impl ToString) -> Self {
        InstallError::ExtractFailed {
            archive: archive.to_path_buf(),
            reason: reason.to_string(),
            source: None,
        }
    }

    pub(crate) fn extract_source(
        archive: &std::path::Path,
        reason: impl ToString,
        source: impl Into<BoxError>,
    ) -> Self {
        InstallError::ExtractFailed {
            archive: archive.to_path_buf(),
            reason: reason.to_string(),
            source: Some(source.into()),
        }
    }

    pub(crate) fn config(origin: impl ToString, reason: impl ToString) -> Self {
        InstallError::Config {
            origin: origin.to_string(),
            reason: reason.to_string(),
            source: None,
        }
    }

    pub(crate) fn config_source(origin: impl ToString, reason: impl ToString, source: impl Into<BoxError>) -> Self {
        InstallError::Config {
            origin: origin.to_string(),
            reason: reason.to_string(),
            source: Some(source.into()),
        }
    }

    pub(crate) fn install_io(target: &std::path::Path, reason: impl ToString, source: std::io::Error) -> Self {
        InstallError::InstallFailed {
            target: target.to_path_buf(),
            reason: reason.to_string(),
            source: Some(source),
        }
    }

    /// HTTP status carried by a download failure, if any
    pub fn http_status(&self) -> Option<u16> {
        match self {
            InstallError::DownloadFailed { status, .. } => *status,
            _ => None,
        }
    }
}

pub type Result<T, E = InstallError> = std::result::Result<T, E>;

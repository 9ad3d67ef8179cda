//! Installer configuration
//!
//! ## Configuration Sources (in precedence order)
//!
//! 1. An explicit path (`gdcli --config <path>`)
//! 2. `<config dir>/gdcli/config.yaml`
//! 3. Built-in defaults
//!
//! ```yaml
//! retry:
//!   settleDelayMs: 1000
//!   attempts: 3
//!   backoffMs: 1000
//! download:
//!   connectTimeoutSecs: 30
//!   inactivityTimeoutSecs: 300
//! catalogPath: /etc/gdcli/catalog.yaml
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::catalog::Catalog;
use crate::error::{InstallError, Result};

const CONFIG_FILE: &str = "config.yaml";

/// Top-level installer configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallConfig {
    #[serde(default)]
    pub retry: RetryPolicy,

    #[serde(default)]
    pub download: DownloadConfig,

    /// Catalog file replacing the built-in catalog
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,
}

/// Bounded wait for extracted files to become visible in directory listings
///
/// Some filesystems (network shares, VM mounts) briefly omit freshly written
/// files from listings. The installer sleeps `settle_delay` once, then probes
/// each source up to `attempts` times, `backoff` apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryPolicy {
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    #[serde(default = "default_attempts")]
    pub attempts: u32,

    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            settle_delay_ms: default_settle_delay_ms(),
            attempts: default_attempts(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

impl RetryPolicy {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }

    /// At least one probe is always made
    pub fn attempts(&self) -> u32 {
        self.attempts.max(1)
    }
}

fn default_settle_delay_ms() -> u64 {
    1000
}

fn default_attempts() -> u32 {
    3
}

fn default_backoff_ms() -> u64 {
    1000
}

/// HTTP client settings for the archive fetcher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadConfig {
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Maximum silence between body chunks before the download is abandoned
    #[serde(default = "default_inactivity_timeout")]
    pub inactivity_timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout(),
            inactivity_timeout_secs: default_inactivity_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl DownloadConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn inactivity_timeout(&self) -> Duration {
        Duration::from_secs(self.inactivity_timeout_secs)
    }
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_inactivity_timeout() -> u64 {
    300
}

fn default_user_agent() -> String {
    concat!("gdcli/", env!("CARGO_PKG_VERSION")).to_string()
}

impl InstallConfig {
    /// Load from the default location, falling back to defaults
    pub fn load() -> Result<Self> {
        match Self::default_config_path() {
            Some(path) => Self::load_from_path(&path),
            None => {
                tracing::debug!("No config directory available, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load a config file; a missing file yields the defaults
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("Config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| InstallError::config_source(path.display(), "cannot read file", e))?;

        let mut config: InstallConfig = serde_yaml_ng::from_str(&content)
            .map_err(|e| InstallError::config_source(path.display(), "invalid YAML", e))?;

        // Relative catalog paths are relative to the config file
        if let (Some(catalog), Some(parent)) = (&config.catalog_path, path.parent()) {
            if catalog.is_relative() {
                config.catalog_path = Some(parent.join(catalog));
            }
        }

        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Default config file path, if a config directory can be determined
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("org", "gdcli", "gdcli")
            .map(|dirs| dirs.config_dir().to_path_buf())
            .or_else(|| dirs::config_dir().map(|d| d.join("gdcli")))
            .map(|dir| dir.join(CONFIG_FILE))
    }

    /// The configured catalog, or the built-in one
    pub fn catalog(&self) -> Result<Catalog> {
        match &self.catalog_path {
            Some(path) => Catalog::load_from_path(path),
            None => Ok(Catalog::builtin()),
        }
    }
}

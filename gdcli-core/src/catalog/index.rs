//! Catalog entries and catalog file parsing
//!
//! A catalog file lists every installable build with its download URL:
//!
//! ```yaml
//! apiVersion: gdcli.dev/v1
//! kind: Catalog
//! entries:
//!   - displayName: 4.3.0 (Standard)
//!     version: 4.3.0
//!     variant: standard
//!     platform: linux
//!     url: https://example.com/Godot_v4.3-stable_linux.x86_64.zip
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use crate::error::{InstallError, Result};
use crate::platform::Platform;

/// API version written to and expected in catalog files
pub const CATALOG_API_VERSION: &str = "gdcli.dev/v1";

const CATALOG_KIND: &str = "Catalog";

/// Build flavour of an engine release
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Standard,
    /// The .NET-enabled runtime variant
    #[serde(alias = "dotnet")]
    Mono,
}

impl Variant {
    pub fn from_dotnet(dotnet: bool) -> Self {
        if dotnet {
            Variant::Mono
        } else {
            Variant::Standard
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Standard => "Standard",
            Variant::Mono => "Mono",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One installable build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    /// User-facing name, unique per platform
    pub display_name: String,

    /// Engine version, shared by the variants of one release
    pub version: String,

    pub variant: Variant,

    pub platform: Platform,

    /// Archive download location
    pub url: String,
}

impl CatalogEntry {
    /// File name of the archive, taken from the last URL path segment
    pub fn archive_name(&self) -> &str {
        let path = self.url.split(['?', '#']).next().unwrap_or_default();
        match path.rsplit('/').next() {
            Some(name) if !name.is_empty() => name,
            _ => "archive.zip",
        }
    }
}

/// On-disk catalog document
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogFile {
    api_version: String,
    kind: String,
    entries: Vec<CatalogEntry>,
}

/// Immutable set of known builds
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// Build a catalog, enforcing per-platform display name uniqueness
    pub fn new(entries: Vec<CatalogEntry>) -> Result<Self> {
        let mut seen = HashSet::new();
        for entry in &entries {
            let key = (entry.platform, entry.display_name.to_lowercase());
            if !seen.insert(key) {
                return Err(InstallError::config(
                    "catalog",
                    format!(
                        "duplicate display name '{}' for platform {}",
                        entry.display_name, entry.platform
                    ),
                ));
            }
            if entry.url.trim().is_empty() {
                return Err(InstallError::config(
                    "catalog",
                    format!("entry '{}' has no download URL", entry.display_name),
                ));
            }
        }

        Ok(Self { entries })
    }

    /// The catalog of published upstream builds
    pub fn builtin() -> Self {
        Self {
            entries: super::builtin::entries(),
        }
    }

    /// Parse a catalog from YAML
    pub fn from_yaml(content: &str) -> Result<Self> {
        let file: CatalogFile = serde_yaml_ng::from_str(content)
            .map_err(|e| InstallError::config_source("catalog", "invalid YAML", e))?;

        if file.kind != CATALOG_KIND {
            return Err(InstallError::config(
                "catalog",
                format!("expected kind '{CATALOG_KIND}', found '{}'", file.kind),
            ));
        }
        if file.api_version != CATALOG_API_VERSION {
            tracing::warn!(
                "Catalog declares apiVersion '{}', expected '{}'",
                file.api_version,
                CATALOG_API_VERSION
            );
        }

        Self::new(file.entries)
    }

    /// Load a catalog file
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| InstallError::config_source(path.display(), "cannot read file", e))?;

        Self::from_yaml(&content).map_err(|e| match e {
            InstallError::Config { reason, source, .. } => InstallError::Config {
                origin: path.display().to_string(),
                reason,
                source,
            },
            other => other,
        })
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Entries published for one platform, in catalog order
    pub fn entries_for(&self, platform: Platform) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter().filter(move |e| e.platform == platform)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

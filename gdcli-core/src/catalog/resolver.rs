//! Identifier resolution against the catalog
//!
//! Pure lookups: no network or filesystem access happens here.

use std::ops::Deref;

use super::{Catalog, CatalogEntry, Variant};
use crate::error::{InstallError, Result};
use crate::platform::Platform;

/// A catalog entry known to match the platform it was resolved for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVersion {
    entry: CatalogEntry,
}

impl Deref for ResolvedVersion {
    type Target = CatalogEntry;

    fn deref(&self) -> &CatalogEntry {
        &self.entry
    }
}

impl Catalog {
    /// Resolve a free-form identifier to exactly one entry for `platform`
    ///
    /// Precedence:
    /// 1. Case-insensitive exact display name
    /// 2. Exact version (first entry in catalog order)
    /// 3. Case-insensitive display name substring, which must be unique
    ///
    /// Surrounding whitespace is ignored for matching; errors carry the
    /// identifier exactly as given.
    pub fn resolve(&self, identifier: &str, platform: Platform) -> Result<ResolvedVersion> {
        let not_found = || InstallError::NotFound {
            identifier: identifier.to_string(),
        };

        let trimmed = identifier.trim();
        if trimmed.is_empty() {
            return Err(not_found());
        }

        let needle = trimmed.to_lowercase();

        if let Some(entry) = self
            .entries_for(platform)
            .find(|e| e.display_name.to_lowercase() == needle)
        {
            return Ok(resolved(entry));
        }

        if let Some(entry) = self.entries_for(platform).find(|e| e.version == trimmed) {
            return Ok(resolved(entry));
        }

        let matches: Vec<&CatalogEntry> = self
            .entries_for(platform)
            .filter(|e| e.display_name.to_lowercase().contains(&needle))
            .collect();

        match matches.as_slice() {
            [] => Err(not_found()),
            [single] => Ok(resolved(single)),
            many => Err(InstallError::Ambiguous {
                identifier: identifier.to_string(),
                candidates: many.iter().map(|e| e.display_name.clone()).collect(),
            }),
        }
    }

    /// Look up the exact build a project pins, without fuzzy matching
    pub fn find(&self, version: &str, variant: Variant, platform: Platform) -> Option<ResolvedVersion> {
        self.entries_for(platform)
            .find(|e| e.version == version && e.variant == variant)
            .map(resolved)
    }
}

fn resolved(entry: &CatalogEntry) -> ResolvedVersion {
    ResolvedVersion {
        entry: entry.clone(),
    }
}

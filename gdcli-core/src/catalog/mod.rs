//! Engine version catalog and identifier resolution
//!
//! The catalog is the fixed set of installable (version, variant, platform)
//! combinations and the archive each one downloads from.
//!
//! # Overview
//!
//! - The built-in catalog mirrors the published upstream builds
//! - A YAML catalog file can replace it (see `catalogPath` in the config)
//! - Once built, a catalog is never mutated
//!
//! # Resolution
//!
//! ```text
//! "4.3"  ──► exact display name? ──► exact version? ──► substring scan
//!                   │                      │                 │
//!                   ▼                      ▼                 ├── 1 hit  ► ResolvedVersion
//!            ResolvedVersion        ResolvedVersion          ├── 0 hits ► NotFound
//!                                                            └── 2+     ► Ambiguous
//! ```

mod builtin;
mod index;
mod resolver;

pub use index::{Catalog, CatalogEntry, Variant, CATALOG_API_VERSION};
pub use resolver::ResolvedVersion;

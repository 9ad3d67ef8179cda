//! gdcli core library: resolve, download and install Godot engine builds

pub mod catalog;
pub mod config;
pub mod error;
pub mod install;
pub mod platform;

pub use catalog::{Catalog, CatalogEntry, ResolvedVersion, Variant};
pub use config::{DownloadConfig, InstallConfig, RetryPolicy};
pub use error::InstallError;
pub use install::{InstallOutcome, InstallSession};
pub use platform::Platform;

/// Re-exported so callers can cancel an install without depending on tokio-util
pub use tokio_util::sync::CancellationToken;

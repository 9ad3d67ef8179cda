//! Download, extraction and installation of engine builds
//!
//! ## Module Organization
//!
//! - `fetcher` - Streaming HTTP download of the archive
//! - `extractor` - Zip / tar.gz unpacking into a scratch directory
//! - `scanner` - Locating the executables inside the unpacked tree
//! - `installer` - Staged copy under canonical names, with visibility retry
//! - `cleanup` - Removal of scratch state
//! - `lock` - Exclusive ownership of the target directory
//! - `session` - Orchestration of one install, end to end

mod cleanup;
mod extractor;
mod fetcher;
mod installer;
mod lock;
mod scanner;
mod session;

pub use cleanup::cleanup;
pub use extractor::{extract, ArchiveFormat};
pub use fetcher::Fetcher;
pub use installer::{InstallOutcome, Installer};
pub use lock::{TargetLock, LOCK_FILE};
pub use scanner::{classify_dir, locate_executables, ExecutableSet};
pub use session::{InstallSession, Stage};

//! Project-side files: the `godot.json` pin and the install directory marker

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use gdcli_core::Variant;

/// Project file read when `install` is run without an identifier
pub const PROJECT_FILE: &str = "godot.json";

/// Engine editor cache removed by `clean`
pub const EDITOR_CACHE_DIR: &str = ".godot";

/// Marker that keeps the engine editor from importing the install directory
const GDIGNORE: &str = ".gdignore";

/// Contents of `godot.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectFile {
    pub engine_version: String,

    #[serde(default)]
    pub project_name: Option<String>,

    #[serde(default)]
    pub is_dotnet: bool,
}

impl ProjectFile {
    pub fn load(project_root: &Path) -> Result<Self> {
        let path = project_root.join(PROJECT_FILE);
        let content = fs::read_to_string(&path)
            .with_context(|| format!("No identifier given and could not read {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("Invalid {}", path.display()))
    }

    pub fn variant(&self) -> Variant {
        Variant::from_dotnet(self.is_dotnet)
    }
}

/// Create `.gdignore` in the install directory if it is missing
pub fn ensure_gdignore(target_dir: &Path) -> Result<()> {
    let marker = target_dir.join(GDIGNORE);
    if marker.exists() {
        return Ok(());
    }
    fs::create_dir_all(target_dir)
        .with_context(|| format!("Failed to create {}", target_dir.display()))?;
    fs::write(&marker, "").with_context(|| format!("Failed to create {}", marker.display()))?;
    tracing::debug!("Created {}", marker.display());
    Ok(())
}

/// Remove the install directory and the editor cache, returning what was removed
pub fn clean(project_root: &Path, install_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut removed = Vec::new();
    for dir in [project_root.join(install_dir), project_root.join(EDITOR_CACHE_DIR)] {
        if !dir.exists() {
            tracing::debug!("Nothing to remove at {}", dir.display());
            continue;
        }
        fs::remove_dir_all(&dir).with_context(|| format!("Failed to remove {}", dir.display()))?;
        removed.push(dir);
    }
    Ok(removed)
}

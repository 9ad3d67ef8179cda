//! Platform detection and per-platform executable policy
//!
//! Naming rules and permission handling differ between platforms. Rather than
//! branching on the platform throughout the scanner and installer, each
//! platform gets one [`PlatformPolicy`] row that is selected once per install.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Operating systems with published engine builds (x86_64 / universal)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Windows,
    Linux,
    #[serde(alias = "darwin")]
    MacOs,
}

impl Platform {
    /// Detect the host platform, if it is one we ship builds for
    pub fn current() -> Option<Self> {
        match std::env::consts::OS {
            "windows" => Some(Platform::Windows),
            "linux" => Some(Platform::Linux),
            "macos" => Some(Platform::MacOs),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Windows => "windows",
            Platform::Linux => "linux",
            Platform::MacOs => "macos",
        }
    }

    /// Policy row for this platform
    pub fn policy(&self) -> &'static PlatformPolicy {
        PlatformPolicy::for_platform(*self)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "windows" | "win" | "win64" => Ok(Platform::Windows),
            "linux" => Ok(Platform::Linux),
            "macos" | "darwin" | "osx" => Ok(Platform::MacOs),
            other => Err(format!("Unknown platform: {other}")),
        }
    }
}

/// Role of an executable inside a distribution archive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutableKind {
    /// The main interactive binary
    Primary,
    /// The console/debug-output companion
    Secondary,
}

/// Naming predicate, canonical names and permission rule for one platform
#[derive(Debug)]
pub struct PlatformPolicy {
    pub platform: Platform,
    classify: fn(&str) -> Option<ExecutableKind>,
    primary_name: &'static str,
    secondary_name: &'static str,
    needs_exec_bit: bool,
}

/// Architecture suffixes the Linux builds are published with
const LINUX_BINARY_EXTENSIONS: &[&str] = &["x86_64", "x86_32", "arm64", "arm32"];

/// Product prefix every upstream binary name starts with
const PRODUCT_PREFIX: &str = "Godot";

static POLICIES: [PlatformPolicy; 3] = [
    PlatformPolicy {
        platform: Platform::Windows,
        classify: classify_windows,
        primary_name: "godot.exe",
        secondary_name: "godot_console.exe",
        needs_exec_bit: false,
    },
    PlatformPolicy {
        platform: Platform::Linux,
        classify: classify_linux,
        primary_name: "godot",
        secondary_name: "godot_console",
        needs_exec_bit: true,
    },
    PlatformPolicy {
        platform: Platform::MacOs,
        classify: classify_macos,
        primary_name: "godot",
        secondary_name: "godot_console",
        needs_exec_bit: true,
    },
];

impl PlatformPolicy {
    pub fn for_platform(platform: Platform) -> &'static PlatformPolicy {
        match platform {
            Platform::Windows => &POLICIES[0],
            Platform::Linux => &POLICIES[1],
            Platform::MacOs => &POLICIES[2],
        }
    }

    /// Classify a bare file name found in an extracted archive
    pub fn classify(&self, file_name: &str) -> Option<ExecutableKind> {
        (self.classify)(file_name)
    }

    /// Version-independent file name an executable is installed under
    pub fn canonical_name(&self, kind: ExecutableKind) -> &'static str {
        match kind {
            ExecutableKind::Primary => self.primary_name,
            ExecutableKind::Secondary => self.secondary_name,
        }
    }

    /// Mark an installed file executable where the platform requires it
    pub fn make_executable(&self, path: &Path) -> std::io::Result<()> {
        if !self.needs_exec_bit {
            return Ok(());
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;

            let mut perms = std::fs::metadata(path)?.permissions();
            perms.set_mode(perms.mode() | 0o755);
            std::fs::set_permissions(path, perms)?;
        }

        #[cfg(not(unix))]
        let _ = path;

        Ok(())
    }
}

fn classify_windows(name: &str) -> Option<ExecutableKind> {
    let lower = name.to_ascii_lowercase();
    if !lower.ends_with(".exe") {
        return None;
    }
    if lower.contains("_console") {
        Some(ExecutableKind::Secondary)
    } else {
        Some(ExecutableKind::Primary)
    }
}

fn classify_linux(name: &str) -> Option<ExecutableKind> {
    if !name.starts_with(&format!("{PRODUCT_PREFIX}_")) {
        return None;
    }
    match Path::new(name).extension().and_then(|e| e.to_str()) {
        None => Some(ExecutableKind::Primary),
        Some(ext)
            if LINUX_BINARY_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext)) =>
        {
            Some(ExecutableKind::Primary)
        }
        Some(_) => None,
    }
}

fn classify_macos(name: &str) -> Option<ExecutableKind> {
    if name.starts_with(PRODUCT_PREFIX) && Path::new(name).extension().is_none() {
        Some(ExecutableKind::Primary)
    } else {
        None
    }
}

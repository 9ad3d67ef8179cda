//! Published upstream builds

use super::{CatalogEntry, Variant};
use crate::platform::Platform;

const RELEASES_URL: &str = "https://github.com/godotengine/godot-builds/releases/download";

/// (version, release tag, variant, platform, archive file name)
const BUILDS: &[(&str, &str, Variant, Platform, &str)] = &[
    ("4.3.0", "4.3-stable", Variant::Standard, Platform::Windows, "Godot_v4.3-stable_win64.exe.zip"),
    ("4.3.0", "4.3-stable", Variant::Mono, Platform::Windows, "Godot_v4.3-stable_mono_win64.zip"),
    ("4.3.0", "4.3-stable", Variant::Standard, Platform::Linux, "Godot_v4.3-stable_linux.x86_64.zip"),
    ("4.3.0", "4.3-stable", Variant::Mono, Platform::Linux, "Godot_v4.3-stable_mono_linux_x86_64.zip"),
    ("4.3.0", "4.3-stable", Variant::Standard, Platform::MacOs, "Godot_v4.3-stable_macos.universal.zip"),
    ("4.3.0", "4.3-stable", Variant::Mono, Platform::MacOs, "Godot_v4.3-stable_mono_macos.universal.zip"),
    ("4.4.0", "4.4-stable", Variant::Standard, Platform::Windows, "Godot_v4.4-stable_win64.exe.zip"),
    ("4.4.0", "4.4-stable", Variant::Mono, Platform::Windows, "Godot_v4.4-stable_mono_win64.zip"),
    ("4.4.0", "4.4-stable", Variant::Standard, Platform::Linux, "Godot_v4.4-stable_linux.x86_64.zip"),
    ("4.4.0", "4.4-stable", Variant::Mono, Platform::Linux, "Godot_v4.4-stable_mono_linux_x86_64.zip"),
    ("4.4.0", "4.4-stable", Variant::Standard, Platform::MacOs, "Godot_v4.4-stable_macos.universal.zip"),
    ("4.4.0", "4.4-stable", Variant::Mono, Platform::MacOs, "Godot_v4.4-stable_mono_macos.universal.zip"),
];

pub(super) fn entries() -> Vec<CatalogEntry> {
    BUILDS
        .iter()
        .map(|&(version, tag, variant, platform, archive)| CatalogEntry {
            display_name: format!("{version} ({variant})"),
            version: version.to_string(),
            variant,
            platform,
            url: format!("{RELEASES_URL}/{tag}/{archive}"),
        })
        .collect()
}

//! Archive extraction into a scratch directory
//!
//! Supports `.zip` (the format upstream publishes) and `.tar.gz`/`.tgz`.
//! Relative paths and Unix modes are preserved; directory entries are
//! skipped since parents are created from file paths.

use flate2::read::GzDecoder;
use std::fs::File;
use std::path::{Component, Path, PathBuf};

use crate::error::{InstallError, Result};

/// Archive container formats we can unpack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    TarGz,
}

impl ArchiveFormat {
    /// Pick the format from the archive file name
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?.to_ascii_lowercase();
        if name.ends_with(".zip") {
            Some(ArchiveFormat::Zip)
        } else if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Some(ArchiveFormat::TarGz)
        } else {
            None
        }
    }
}

/// Unpack `archive` into `destination`, returning the number of files written
///
/// Any error aborts the remaining entries; the caller discards the whole
/// destination tree.
pub fn extract(archive: &Path, destination: &Path) -> Result<usize> {
    let format = ArchiveFormat::from_path(archive)
        .ok_or_else(|| InstallError::extract(archive, "unrecognised archive format"))?;

    std::fs::create_dir_all(destination)
        .map_err(|e| InstallError::extract_source(archive, format!("cannot create {}", destination.display()), e))?;

    let count = match format {
        ArchiveFormat::Zip => extract_zip(archive, destination)?,
        ArchiveFormat::TarGz => extract_tar_gz(archive, destination)?,
    };

    tracing::debug!("Extracted {} files from {}", count, archive.display());
    Ok(count)
}

fn extract_zip(archive: &Path, destination: &Path) -> Result<usize> {
    let file = File::open(archive).map_err(|e| InstallError::extract_source(archive, "cannot open archive", e))?;
    let mut zip =
        zip::ZipArchive::new(file).map_err(|e| InstallError::extract_source(archive, "not a readable zip archive", e))?;

    let mut count = 0;
    for i in 0..zip.len() {
        let mut entry = zip
            .by_index(i)
            .map_err(|e| InstallError::extract_source(archive, format!("cannot read entry {i}"), e))?;

        if entry.is_dir() {
            continue;
        }

        let relative = safe_relative_path(Path::new(entry.name()))
            .ok_or_else(|| InstallError::extract(archive, format!("unsafe entry path '{}'", entry.name())))?;
        let out_path = destination.join(relative);
        create_parent(archive, &out_path)?;

        let mut out = File::create(&out_path)
            .map_err(|e| InstallError::extract_source(archive, format!("cannot write {}", out_path.display()), e))?;
        std::io::copy(&mut entry, &mut out)
            .map_err(|e| InstallError::extract_source(archive, format!("cannot write {}", out_path.display()), e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = entry.unix_mode() {
                std::fs::set_permissions(&out_path, std::fs::Permissions::from_mode(mode & 0o7777))
                    .map_err(|e| InstallError::extract_source(archive, format!("cannot write {}", out_path.display()), e))?;
            }
        }

        count += 1;
    }

    Ok(count)
}

fn extract_tar_gz(archive: &Path, destination: &Path) -> Result<usize> {
    let file = File::open(archive).map_err(|e| InstallError::extract_source(archive, "cannot open archive", e))?;
    let mut tar = tar::Archive::new(GzDecoder::new(file));
    tar.set_preserve_permissions(true);

    let entries = tar
        .entries()
        .map_err(|e| InstallError::extract_source(archive, "not a readable tar.gz archive", e))?;

    let mut count = 0;
    for entry in entries {
        let mut entry = entry.map_err(|e| InstallError::extract_source(archive, "cannot read entry", e))?;
        let entry_type = entry.header().entry_type();

        if entry_type.is_dir() {
            continue;
        }
        if !entry_type.is_file() {
            tracing::debug!("Skipping non-file tar entry {:?}", entry.path().ok());
            continue;
        }

        let name = entry
            .path()
            .map_err(|e| InstallError::extract_source(archive, "invalid entry path", e))?
            .into_owned();
        let relative = safe_relative_path(&name)
            .ok_or_else(|| InstallError::extract(archive, format!("unsafe entry path '{}'", name.display())))?;
        let out_path = destination.join(relative);
        create_parent(archive, &out_path)?;

        entry
            .unpack(&out_path)
            .map_err(|e| InstallError::extract_source(archive, format!("cannot write {}", out_path.display()), e))?;

        count += 1;
    }

    Ok(count)
}

fn create_parent(archive: &Path, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| InstallError::extract_source(archive, format!("cannot create {}", parent.display()), e))?;
    }
    Ok(())
}

/// Normalise an entry name, rejecting anything that could leave the destination
fn safe_relative_path(path: &Path) -> Option<PathBuf> {
    let mut clean = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    if clean.as_os_str().is_empty() {
        None
    } else {
        Some(clean)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;

    fn write_zip(path: &Path, files: &[(&str, &[u8], u32)]) {
        let file = File::create(path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        for (name, contents, mode) in files {
            let options = SimpleFileOptions::default().unix_permissions(*mode);
            writer.start_file(*name, options).unwrap();
            writer.write_all(contents).unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(
            ArchiveFormat::from_path(Path::new("Godot_v4.3-stable_win64.exe.zip")),
            Some(ArchiveFormat::Zip)
        );
        assert_eq!(
            ArchiveFormat::from_path(Path::new("build.TAR.GZ")),
            Some(ArchiveFormat::TarGz)
        );
        assert_eq!(ArchiveFormat::from_path(Path::new("build.tgz")), Some(ArchiveFormat::TarGz));
        assert_eq!(ArchiveFormat::from_path(Path::new("build.7z")), None);
    }

    #[test]
    fn test_safe_relative_path() {
        assert_eq!(
            safe_relative_path(Path::new("./a/b/c")),
            Some(PathBuf::from("a/b/c"))
        );
        assert_eq!(safe_relative_path(Path::new("../escape")), None);
        assert_eq!(safe_relative_path(Path::new("a/../../escape")), None);
        assert_eq!(safe_relative_path(Path::new("/etc/passwd")), None);
        assert_eq!(safe_relative_path(Path::new(".")), None);
    }

    #[test]
    fn test_zip_preserves_nesting() {
        let temp_dir = TempDir::new().unwrap();
        let archive = temp_dir.path().join("nested.zip");
        write_zip(
            &archive,
            &[
                ("Foo-1.2/bin/Godot_v4.3-stable_linux.x86_64", &b"ELF"[..], 0o755),
                ("Foo-1.2/README.md", &b"readme"[..], 0o644),
            ],
        );

        let dest = temp_dir.path().join("out");
        let count = extract(&archive, &dest).unwrap();

        assert_eq!(count, 2);
        let binary = dest.join("Foo-1.2/bin/Godot_v4.3-stable_linux.x86_64");
        assert_eq!(std::fs::read(&binary).unwrap(), b"ELF");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&binary).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o755);
        }
    }

    #[test]
    fn test_zip_rejects_path_traversal() {
        let temp_dir = TempDir::new().unwrap();
        let archive = temp_dir.path().join("evil.zip");
        write_zip(&archive, &[("../evil.sh", &b"boom"[..], 0o755)]);

        let dest = temp_dir.path().join("out");
        let result = extract(&archive, &dest);

        assert!(matches!(result, Err(InstallError::ExtractFailed { .. })));
        assert!(!temp_dir.path().join("evil.sh").exists());
    }

    #[test]
    fn test_corrupt_zip_fails() {
        let temp_dir = TempDir::new().unwrap();
        let archive = temp_dir.path().join("broken.zip");
        std::fs::write(&archive, b"this is not a zip archive").unwrap();

        match extract(&archive, &temp_dir.path().join("out")) {
            Err(InstallError::ExtractFailed { source, .. }) => {
                assert!(source.is_some(), "zip error should be kept as the source");
            }
            other => panic!("expected ExtractFailed, got {other:?}"),
        }
    }

    #[test]
    fn test_tar_gz_extraction() {
        use flate2::write::GzEncoder;
        use flate2::Compression;

        let temp_dir = TempDir::new().unwrap();
        let archive = temp_dir.path().join("build.tar.gz");

        {
            let file = File::create(&archive).unwrap();
            let encoder = GzEncoder::new(file, Compression::default());
            let mut builder = tar::Builder::new(encoder);

            let contents = b"#!/bin/sh\n";
            let mut header = tar::Header::new_gnu();
            header.set_entry_type(tar::EntryType::Regular);
            header.set_size(contents.len() as u64);
            header.set_mode(0o755);
            header.set_cksum();
            builder
                .append_data(&mut header, "release/Godot_v4.4-stable_linux.x86_64", &contents[..])
                .unwrap();
            builder.into_inner().unwrap().finish().unwrap();
        }

        let dest = temp_dir.path().join("out");
        assert_eq!(extract(&archive, &dest).unwrap(), 1);
        assert!(dest.join("release/Godot_v4.4-stable_linux.x86_64").is_file());
    }
}

//! Integration tests driving the `gdcli` binary
//!
//! Every run passes `--config` pointing into a temp directory so the
//! user's own configuration never leaks into the results.

use pretty_assertions::assert_eq;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn gdcli(project: &Path, config: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_gdcli"))
        .args(args)
        .arg("--config")
        .arg(config)
        .current_dir(project)
        .output()
        .unwrap()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_list_json_only_shows_requested_platform() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("missing-config.yaml");

    let output = gdcli(temp_dir.path(), &config, &["list", "--json", "--platform", "linux"]);
    assert!(output.status.success(), "{}", stderr(&output));

    let entries: Vec<serde_json::Value> = serde_json::from_slice(&output.stdout).unwrap();
    assert!(!entries.is_empty());
    assert!(entries.iter().all(|e| e["platform"] == "linux"));
}

#[test]
fn test_list_table_has_headers() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("missing-config.yaml");

    let output = gdcli(temp_dir.path(), &config, &["list", "--platform", "windows"]);
    assert!(output.status.success(), "{}", stderr(&output));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Name"));
    assert!(stdout.contains("4.3.0 (Standard)"));
}

#[test]
fn test_resolve_ambiguous_lists_candidates() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("missing-config.yaml");

    let output = gdcli(temp_dir.path(), &config, &["resolve", "4.3", "--platform", "linux"]);
    assert!(!output.status.success());

    let err = stderr(&output);
    assert!(err.contains("4.3.0 (Standard)"), "{err}");
    assert!(err.contains("4.3.0 (Mono)"), "{err}");
}

#[test]
fn test_resolve_unknown_shows_available_versions() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("missing-config.yaml");

    let output = gdcli(temp_dir.path(), &config, &["resolve", "9.9-nope", "--platform", "linux"]);
    assert!(!output.status.success());

    let err = stderr(&output);
    assert!(err.contains("Available versions for linux"), "{err}");
    assert!(err.contains("9.9-nope"), "{err}");
}

#[test]
fn test_install_without_identifier_needs_project_file() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("missing-config.yaml");

    let output = gdcli(temp_dir.path(), &config, &["install", "--platform", "linux"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("godot.json"));
    assert!(!temp_dir.path().join("dependencies").exists());
}

#[test]
fn test_clean_removes_install_and_editor_cache() {
    let temp_dir = TempDir::new().unwrap();
    let project = temp_dir.path();
    std::fs::create_dir_all(project.join("dependencies")).unwrap();
    std::fs::write(project.join("dependencies/godot"), b"bin").unwrap();
    std::fs::create_dir_all(project.join(".godot")).unwrap();

    let output = gdcli(project, &project.join("missing-config.yaml"), &["clean"]);
    assert!(output.status.success(), "{}", stderr(&output));

    assert!(!project.join("dependencies").exists());
    assert!(!project.join(".godot").exists());
}

/// Answer a single GET with `body` from a background thread
fn serve_once(body: Vec<u8>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    std::thread::spawn(move || {
        if let Ok((mut socket, _)) = listener.accept() {
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                match socket.read(&mut buf) {
                    Ok(0) | Err(_) => return,
                    Ok(n) => request.extend_from_slice(&buf[..n]),
                }
            }
            let header = format!("HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n", body.len());
            let _ = socket.write_all(header.as_bytes());
            let _ = socket.write_all(&body);
        }
    });

    format!("http://{addr}")
}

fn linux_build() -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default().unix_permissions(0o644);
    writer
        .start_file("Godot_v4.3-stable_linux.x86_64", options)
        .unwrap();
    writer.write_all(b"\x7fELF").unwrap();
    writer.finish().unwrap().into_inner()
}

#[test]
fn test_install_pinned_version_from_project_file() {
    let base = serve_once(linux_build());

    let temp_dir = TempDir::new().unwrap();
    let project = temp_dir.path().to_path_buf();
    std::fs::write(
        project.join("godot.json"),
        r#"{"engine_version": "4.3.0", "project_name": "demo", "is_dotnet": false}"#,
    )
    .unwrap();
    std::fs::write(
        project.join("catalog.yaml"),
        format!(
            r#"apiVersion: gdcli.dev/v1
kind: Catalog
entries:
  - displayName: 4.3.0 (Standard)
    version: 4.3.0
    variant: standard
    platform: linux
    url: {base}/Godot_v4.3-stable_linux.x86_64.zip
"#
        ),
    )
    .unwrap();
    let config = project.join("config.yaml");
    std::fs::write(
        &config,
        "retry:\n  settleDelayMs: 0\n  attempts: 2\n  backoffMs: 10\ncatalogPath: catalog.yaml\n",
    )
    .unwrap();

    let output = gdcli(&project, &config, &["install", "--platform", "linux"]);
    assert!(output.status.success(), "{}", stderr(&output));

    let mut installed: Vec<String> = std::fs::read_dir(project.join("dependencies"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    installed.sort();
    assert_eq!(installed, vec![".gdignore", "godot"]);
    assert_eq!(std::fs::read(project.join("dependencies/godot")).unwrap(), b"\x7fELF");
}

//! Test helper functions for integration tests
//!
//! Shared across test files using the tests/common/ pattern.

#![allow(dead_code)]

use gdcli_core::{Catalog, CatalogEntry, InstallConfig, Platform, RetryPolicy, Variant};
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::sync::Once;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

static INIT: Once = Once::new();

/// Initialize logging for tests (only once per test run)
pub fn init_test_logging() {
    INIT.call_once(|| {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let _ = tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_test_writer()
                    .with_target(true)
                    .with_level(true),
            )
            .with(tracing_subscriber::filter::EnvFilter::from_default_env())
            .try_init();
    });
}

/// Config with no settle delay and a short back-off
pub fn fast_config() -> InstallConfig {
    InstallConfig {
        retry: RetryPolicy {
            settle_delay_ms: 0,
            attempts: 2,
            backoff_ms: 20,
        },
        ..InstallConfig::default()
    }
}

/// Build a zip archive in memory from `(path, contents, unix mode)` triples
pub fn zip_bytes(files: &[(&str, &[u8], u32)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    for (name, contents, mode) in files {
        let options = zip::write::SimpleFileOptions::default().unix_permissions(*mode);
        writer.start_file(*name, options).unwrap();
        writer.write_all(contents).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// A catalog holding one entry whose URL points at `url`
pub fn single_entry_catalog(display_name: &str, platform: Platform, url: String) -> Catalog {
    Catalog::new(vec![CatalogEntry {
        display_name: display_name.to_string(),
        version: "4.3.0".to_string(),
        variant: Variant::Standard,
        platform,
        url,
    }])
    .unwrap()
}

/// Canned HTTP response for one request path
#[derive(Clone)]
pub struct Route {
    pub status: u16,
    pub body: Vec<u8>,
    /// Advertised `Content-Length`; defaults to the body length
    pub content_length: Option<usize>,
    /// Keep the connection open this long after writing the body
    pub stall: Option<Duration>,
}

impl Route {
    pub fn ok(body: Vec<u8>) -> Self {
        Self {
            status: 200,
            body,
            content_length: None,
            stall: None,
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            ..Self::ok(Vec::new())
        }
    }

    /// Advertise `declared` bytes but close after sending `body`
    pub fn truncated(body: Vec<u8>, declared: usize) -> Self {
        Self {
            content_length: Some(declared),
            ..Self::ok(body)
        }
    }

    /// Advertise `declared` bytes, send `body`, then go silent for `stall`
    pub fn stalled(body: Vec<u8>, declared: usize, stall: Duration) -> Self {
        Self {
            content_length: Some(declared),
            stall: Some(stall),
            ..Self::ok(body)
        }
    }
}

/// Serve `routes` over plain HTTP/1.1 on a loopback port, returning the base URL
///
/// Unknown paths answer 404. The server runs until the test runtime shuts down.
pub async fn serve(routes: HashMap<String, Route>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            let routes = routes.clone();

            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }

                let head = String::from_utf8_lossy(&request);
                let path = head.split_whitespace().nth(1).unwrap_or("/").to_string();
                let route = routes.get(&path).cloned().unwrap_or_else(|| Route::status(404));

                let header = format!(
                    "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    route.status,
                    reason_phrase(route.status),
                    route.content_length.unwrap_or(route.body.len())
                );
                let _ = socket.write_all(header.as_bytes()).await;
                let _ = socket.write_all(&route.body).await;
                let _ = socket.flush().await;
                if let Some(stall) = route.stall {
                    tokio::time::sleep(stall).await;
                }
                let _ = socket.shutdown().await;
            });
        }
    });

    format!("http://{addr}")
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}

/// Names of the entries directly inside `dir`, sorted
pub fn list_dir(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

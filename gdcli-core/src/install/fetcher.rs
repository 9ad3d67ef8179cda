//! Streaming archive download

use futures::StreamExt;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::time::timeout;

use crate::config::DownloadConfig;
use crate::error::{InstallError, Result};

/// Downloads archives straight to disk
pub struct Fetcher {
    client: reqwest::Client,
    inactivity_timeout: Duration,
}

impl Fetcher {
    pub fn new(config: &DownloadConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| InstallError::download_source("<client>", "failed to create HTTP client", e))?;

        Ok(Self {
            client,
            inactivity_timeout: config.inactivity_timeout(),
        })
    }

    /// GET `url` and stream the body into `destination`, returning bytes written
    ///
    /// A partially written file is left in place on failure; removing it is
    /// the caller's cleanup step.
    pub async fn fetch(&self, url: &str, destination: &Path) -> Result<u64> {
        tracing::info!("Downloading {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| InstallError::download_source(url, "request failed", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(InstallError::DownloadFailed {
                url: url.to_string(),
                status: Some(status.as_u16()),
                reason: format!("HTTP {status}"),
                source: None,
            });
        }

        let total = response.content_length();
        let mut file = tokio::fs::File::create(destination)
            .await
            .map_err(|e| InstallError::download_source(url, format!("cannot create {}", destination.display()), e))?;

        let mut stream = response.bytes_stream();
        let mut downloaded: u64 = 0;

        loop {
            let chunk = match timeout(self.inactivity_timeout, stream.next()).await {
                Ok(Some(Ok(chunk))) => chunk,
                Ok(Some(Err(e))) => return Err(InstallError::download_source(url, "connection lost mid-body", e)),
                Ok(None) => break,
                Err(_) => {
                    return Err(InstallError::download(
                        url,
                        format!(
                            "no data received for {} seconds ({} bytes downloaded)",
                            self.inactivity_timeout.as_secs(),
                            downloaded
                        ),
                    ));
                }
            };

            file.write_all(&chunk)
                .await
                .map_err(|e| InstallError::download_source(url, "write failed", e))?;
            downloaded += chunk.len() as u64;
        }

        file.flush()
            .await
            .map_err(|e| InstallError::download_source(url, "write failed", e))?;

        if let Some(expected) = total {
            if downloaded != expected {
                return Err(InstallError::download(
                    url,
                    format!("body ended after {downloaded} of {expected} bytes"),
                ));
            }
        }

        tracing::debug!("Downloaded {} bytes to {}", downloaded, destination.display());
        Ok(downloaded)
    }
}

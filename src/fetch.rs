//! Document fetching and resource download collaborators.
//!
//! The scrape pipeline talks to the network through the [`Fetcher`] trait
//! so tests can substitute an in-memory implementation. Timeouts live in
//! the reqwest client; the pipeline itself never retries.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

/// User agent presented to scraped sites.
pub const USER_AGENT: &str = "Mozilla/5.0 (compatible; brandscrape/0.3)";

/// Request timeout for page fetches and downloads.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Failure while fetching a page or downloading a resource.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected status {status} for {url}")]
    Status { url: String, status: StatusCode },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Retrieval collaborator: pages as text, resources as files on disk.
#[async_trait]
pub trait Fetcher {
    /// Fetch a page body as text.
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError>;

    /// Download a resource to `dest`. The destination directory must exist.
    async fn download(&self, url: &str, dest: &Path) -> Result<(), FetchError>;
}

/// HTTP fetcher backed by reqwest.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(DEFAULT_TIMEOUT)
            .gzip(true)
            .brotli(true)
            .build()
            .expect("failed to create HTTP client");
        Self { client }
    }

    async fn get_success(&self, url: &str) -> Result<reqwest::Response, FetchError> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: response.status(),
            });
        }
        Ok(response)
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        Ok(self.get_success(url).await?.text().await?)
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<(), FetchError> {
        let bytes = self.get_success(url).await?.bytes().await?;
        tokio::fs::write(dest, &bytes)
            .await
            .map_err(|source| FetchError::Write {
                path: dest.to_path_buf(),
                source,
            })
    }
}

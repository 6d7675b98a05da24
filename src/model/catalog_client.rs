//! HTTP client for the remote catalog and track payloads

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};

use super::types::Song;

/// Where the catalog lives when `TUNELIST_CATALOG_URL` is not set.
const DEFAULT_CATALOG_URL: &str =
    "https://raw.githubusercontent.com/hakodev2k/Music-Player/main/songs.json";

/// Local catalog used when the remote source is unreachable.
const FALLBACK_CATALOG_FILE: &str = "songs.json";

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches the song catalog and track bodies over HTTP. Plain paths are
/// read from disk so a fallback catalog can point at local files.
#[derive(Clone)]
pub struct CatalogClient {
    http: reqwest::Client,
    catalog_url: String,
}

impl CatalogClient {
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .context("building http client")?;
        let catalog_url = std::env::var("TUNELIST_CATALOG_URL")
            .unwrap_or_else(|_| DEFAULT_CATALOG_URL.to_string());
        Ok(Self { http, catalog_url })
    }

    /// Fetch the song catalog, falling back to the local file when the
    /// remote source fails. Both failing leaves the app in the
    /// empty-catalog state; the caller surfaces the error.
    pub async fn fetch_catalog(&self) -> Result<Vec<Song>> {
        match self.fetch_remote_catalog().await {
            Ok(songs) => {
                tracing::info!(count = songs.len(), url = %self.catalog_url, "Catalog loaded from remote source");
                Ok(songs)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Remote catalog fetch failed, trying local fallback");
                let songs = self.read_fallback_catalog().await?;
                tracing::info!(count = songs.len(), "Catalog loaded from local fallback");
                Ok(songs)
            }
        }
    }

    async fn fetch_remote_catalog(&self) -> Result<Vec<Song>> {
        let response = self
            .http
            .get(&self.catalog_url)
            .send()
            .await
            .context("requesting catalog")?
            .error_for_status()
            .context("catalog request rejected")?;
        response.json().await.context("decoding catalog JSON")
    }

    async fn read_fallback_catalog(&self) -> Result<Vec<Song>> {
        let content = tokio::fs::read_to_string(FALLBACK_CATALOG_FILE)
            .await
            .with_context(|| format!("reading {}", FALLBACK_CATALOG_FILE))?;
        serde_json::from_str(&content).context("decoding fallback catalog JSON")
    }

    /// Download a track body for the audio output or the duration prober.
    pub async fn fetch_track_bytes(&self, url: &str) -> Result<Vec<u8>> {
        if url.starts_with("http://") || url.starts_with("https://") {
            let response = self
                .http
                .get(url)
                .send()
                .await
                .with_context(|| format!("requesting track {url}"))?
                .error_for_status()
                .with_context(|| format!("requesting track {url}"))?;
            let body = response.bytes().await.context("reading track body")?;
            Ok(body.to_vec())
        } else if Path::new(url).exists() {
            tokio::fs::read(url)
                .await
                .with_context(|| format!("reading track file {url}"))
        } else {
            anyhow::bail!("unsupported track url: {url}")
        }
    }
}

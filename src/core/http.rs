use crate::config::settings::HttpSettings;
use crate::utils::error::{DisasterDataError, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;

/// Shared HTTP client for the scrapers.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new(settings: &HttpSettings) -> Result<Self> {
        let client = Client::builder()
            .user_agent(settings.user_agent.clone())
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()?;
        Ok(Self { client })
    }

    pub fn inner(&self) -> &Client {
        &self.client
    }

    pub async fn get_text(&self, url: &str) -> Result<String> {
        tracing::debug!("GET {}", url);
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }

    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        tracing::debug!("GET {}", url);
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.json().await?)
    }

    /// Streams `url` into `dir`, named after the last path segment.
    pub async fn download(&self, url: &str, dir: &Path) -> Result<PathBuf> {
        let name = url
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| DisasterDataError::scrape(url, "URL has no file name"))?;
        let target = dir.join(name);

        tracing::info!("Downloading remote archive: {}", url);
        let mut response = self.client.get(url).send().await?.error_for_status()?;

        tokio::fs::create_dir_all(dir).await?;
        let mut file = tokio::fs::File::create(&target).await?;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        tracing::info!("Finished downloading remote archive: {}", url);
        Ok(target)
    }
}

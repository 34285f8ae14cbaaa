//! Retrieval of the published index.

use std::time::Duration;

use depsreg_common::config::RegistryConfig;
use depsreg_common::constants::INDEX_PATH;
use depsreg_common::error::{RegistryError, Result};
use depsreg_common::index::Index;

/// Source of fresh index documents.
pub trait IndexFetcher: Send + Sync {
    /// Fetches and parses the current index.
    ///
    /// # Errors
    ///
    /// Returns an error if the index cannot be retrieved or parsed.
    fn fetch(&self) -> Result<Index>;
}

fn network(message: String) -> RegistryError {
    RegistryError::Network { message }
}

/// Fetches `<cdn>/index.json` over HTTP with a fixed timeout.
#[derive(Debug, Clone)]
pub struct HttpIndexFetcher {
    client: reqwest::blocking::Client,
    url: String,
}

impl HttpIndexFetcher {
    /// Creates a fetcher for the index under `cdn_url`.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::Network` if the HTTP client cannot be built.
    pub fn new(cdn_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: format!("{}{INDEX_PATH}", cdn_url.trim_end_matches('/')),
        })
    }

    /// Creates a fetcher from the configured CDN URL and timeout.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::Network` if the HTTP client cannot be built.
    pub fn from_config(config: &RegistryConfig) -> Result<Self> {
        Self::new(&config.cdn_url, config.fetch_timeout)
    }

    /// Full URL of the index document.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl IndexFetcher for HttpIndexFetcher {
    fn fetch(&self) -> Result<Index> {
        tracing::debug!(url = %self.url, "fetching index");
        let response = self
            .client
            .get(&self.url)
            .send()
            .map_err(|e| network(format!("failed to fetch {}: {e}", self.url)))?;
        if !response.status().is_success() {
            return Err(network(format!(
                "unexpected status {} fetching {}",
                response.status(),
                self.url
            )));
        }
        let body = response
            .text()
            .map_err(|e| network(format!("failed to read response from {}: {e}", self.url)))?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_url_joins_cdn_and_path() {
        let fetcher = HttpIndexFetcher::new("https://cdn.example/", Duration::from_secs(1))
            .expect("client");
        assert_eq!(fetcher.url(), "https://cdn.example/index.json");
    }
}

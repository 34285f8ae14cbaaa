//! Global configuration model for the registry toolchain.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants;

/// Root configuration shared by the packager, indexer, and registry client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Registry root holding the `deps/` and `scripts/` trees.
    pub root: PathBuf,
    /// Distribution directory receiving archives and `index.json`.
    pub dist_dir: PathBuf,
    /// Base URL of the CDN serving the distribution directory.
    pub cdn_url: String,
    /// Freshness window of the client-side index cache.
    pub cache_ttl: Duration,
    /// Timeout applied to index fetches.
    pub fetch_timeout: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            dist_dir: PathBuf::from(constants::DEFAULT_DIST_DIR),
            cdn_url: constants::DEFAULT_CDN_URL.to_string(),
            cache_ttl: constants::CACHE_TTL,
            fetch_timeout: constants::FETCH_TIMEOUT,
        }
    }
}

impl RegistryConfig {
    /// Opens the registry source tree rooted at `root`.
    #[must_use]
    pub fn tree(&self) -> crate::storage::RegistryTree {
        crate::storage::RegistryTree::open(&self.root)
    }
}

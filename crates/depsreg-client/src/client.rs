//! Cached queries over the published index.
//!
//! The index is held behind an [`RwLock`] with a freshness window. Fetches
//! happen outside that lock, serialized by a separate refresh mutex so at
//! most one refresh is in flight; callers queued behind it reuse its result.
//! The write lock is only taken to swap in a new copy. When a refresh fails
//! and a previous copy exists, that stale copy is served instead of the
//! error.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use depsreg_common::config::RegistryConfig;
use depsreg_common::constants::{CACHE_TTL, UNKNOWN_VERSION};
use depsreg_common::error::{RegistryError, Result};
use depsreg_common::index::{Index, PackageEntry};
use depsreg_common::types::ItemType;
use depsreg_graph::version;

use crate::fetch::{HttpIndexFetcher, IndexFetcher};

/// What the index already holds for an id about to be published.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DuplicateInfo {
    /// The id is already published.
    pub exists: bool,
    /// The exact version is already published.
    pub exact_match: bool,
    /// Latest published version, when the id exists.
    pub existing_version: Option<String>,
    /// Every published version in semver order.
    pub all_versions: Vec<String>,
    /// Download URL of the exact match.
    pub package_url: Option<String>,
}

#[derive(Debug, Default)]
struct Cache {
    index: Option<Arc<Index>>,
    fetched_at: Option<Instant>,
}

/// Read client for the published index.
#[derive(Debug)]
pub struct RegistryClient<F = HttpIndexFetcher> {
    fetcher: F,
    ttl: Duration,
    cache: RwLock<Cache>,
    refresh: Mutex<()>,
}

impl RegistryClient<HttpIndexFetcher> {
    /// Creates an HTTP-backed client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &RegistryConfig) -> Result<Self> {
        Ok(Self::with_ttl(
            HttpIndexFetcher::from_config(config)?,
            config.cache_ttl,
        ))
    }
}

impl<F: IndexFetcher> RegistryClient<F> {
    /// Creates a client with the default freshness window.
    pub fn new(fetcher: F) -> Self {
        Self::with_ttl(fetcher, CACHE_TTL)
    }

    /// Creates a client whose cached index expires after `ttl`.
    pub fn with_ttl(fetcher: F, ttl: Duration) -> Self {
        Self {
            fetcher,
            ttl,
            cache: RwLock::new(Cache::default()),
            refresh: Mutex::new(()),
        }
    }

    fn read_cache(&self) -> RwLockReadGuard<'_, Cache> {
        self.cache.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_cache(&self) -> RwLockWriteGuard<'_, Cache> {
        self.cache.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn fresh(&self) -> Option<Arc<Index>> {
        self.fresh_since(None)
    }

    /// Cached index if still fresh, or if stored after `since`.
    fn fresh_since(&self, since: Option<Instant>) -> Option<Arc<Index>> {
        let cache = self.read_cache();
        match (&cache.index, cache.fetched_at) {
            (Some(index), Some(at))
                if at.elapsed() < self.ttl || since.is_some_and(|s| at > s) =>
            {
                Some(Arc::clone(index))
            }
            _ => None,
        }
    }

    /// Returns the cached index, refreshing it when expired.
    ///
    /// # Errors
    ///
    /// Returns the fetch error when the refresh fails and nothing is cached.
    pub fn index(&self) -> Result<Arc<Index>> {
        if let Some(index) = self.fresh() {
            return Ok(index);
        }
        let waiting_since = Instant::now();
        let _guard = self.refresh.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(index) = self.fresh_since(Some(waiting_since)) {
            return Ok(index);
        }
        match self.fetcher.fetch() {
            Ok(index) => {
                let index = Arc::new(index);
                let mut cache = self.write_cache();
                cache.index = Some(Arc::clone(&index));
                cache.fetched_at = Some(Instant::now());
                tracing::debug!("index cache refreshed");
                Ok(index)
            }
            Err(e) => match &self.read_cache().index {
                Some(stale) => {
                    tracing::warn!(error = %e, "index refresh failed, serving stale copy");
                    Ok(Arc::clone(stale))
                }
                None => Err(e),
            },
        }
    }

    fn lookup<T>(
        &self,
        item_type: ItemType,
        id: &str,
        f: impl FnOnce(Option<&PackageEntry>) -> T,
    ) -> Result<T> {
        let index = self.index()?;
        Ok(f(index.package(item_type, id)))
    }

    /// Latest published version of `id`.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::NotFound` if the id is not published, or the
    /// fetch error if no index is available.
    pub fn latest_version(&self, item_type: ItemType, id: &str) -> Result<String> {
        self.lookup(item_type, id, |entry| entry.map(|e| e.latest.clone()))?
            .ok_or_else(|| RegistryError::NotFound {
                kind: "package",
                id: id.to_string(),
            })
    }

    /// Like [`Self::latest_version`], but yields `*` on any failure.
    pub fn latest_version_or_unknown(&self, item_type: ItemType, id: &str) -> String {
        self.latest_version(item_type, id).unwrap_or_else(|e| {
            tracing::debug!(id = %id, error = %e, "latest version unknown");
            UNKNOWN_VERSION.to_string()
        })
    }

    /// Whether an index can currently be obtained, cached or fetched.
    pub fn is_available(&self) -> bool {
        self.index().is_ok()
    }

    /// Every published id of `item_type`, sorted.
    ///
    /// # Errors
    ///
    /// Returns the fetch error if no index is available.
    pub fn all_ids(&self, item_type: ItemType) -> Result<Vec<String>> {
        Ok(self.index()?.packages(item_type).keys().cloned().collect())
    }

    /// Reports what is already published for `id` and `version`.
    ///
    /// # Errors
    ///
    /// Returns the fetch error if no index is available.
    pub fn check_duplicate(&self, item_type: ItemType, id: &str, version: &str) -> Result<DuplicateInfo> {
        self.lookup(item_type, id, |entry| {
            let Some(entry) = entry else {
                return DuplicateInfo::default();
            };
            let exact = entry.versions.get(version);
            let keys: Vec<&String> = entry.versions.keys().collect();
            let all_versions = version::sort_versions(&keys);
            DuplicateInfo {
                exists: true,
                exact_match: exact.is_some(),
                existing_version: Some(entry.latest.clone()),
                all_versions,
                package_url: exact.map(|v| v.url.clone()),
            }
        })
    }

    /// Maps each dependency id to its latest published version, or `*`
    /// when the index is unreachable or the id is unknown.
    pub fn resolve_versions<'a, I>(&self, ids: I) -> BTreeMap<String, String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let available = self.is_available();
        if !available {
            tracing::warn!("registry unavailable, dependency versions left unknown");
        }
        ids.into_iter()
            .map(|id| {
                let v = if available {
                    self.latest_version_or_unknown(ItemType::Deps, id)
                } else {
                    UNKNOWN_VERSION.to_string()
                };
                (id.to_string(), v)
            })
            .collect()
    }
}

//! Resolver Cache Implementation
//!
//! Read-through cache from a parameter path to everything stored under it.
//! Concurrent misses on the same path share a single fetch, failures are
//! never cached, and an optional TTL forces a full re-fetch of stale paths.

use std::ffi::OsStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use moka::future::Cache;
use tracing::{debug, trace};

use crate::config::ResolverConfig;
use crate::error::ResolveError;
use crate::parameters::{EmptyValues, Parameters};
use crate::path::{normalize, CanonicalPath};
use crate::source::{FetchError, ParameterSource};

/// Cache entry for one resolved path
#[derive(Clone, Debug)]
pub(crate) struct CacheEntry {
    /// Everything found under the path, names stripped
    parameters: Parameters,
    /// When this entry was fetched
    cached_at: Instant,
}

/// Snapshot of cache counters
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Calls made to the parameter source
    pub fetches: u64,
    /// Approximate number of cached paths
    pub entries: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total > 0 {
            (self.hits as f64 / total as f64) * 100.0
        } else {
            0.0
        }
    }
}

/// Parameter cache keyed by canonical path
///
/// Construct one per source and share it by reference (or `Arc`) between
/// the tasks that need parameters.
pub struct ResolverCache {
    /// Where cache misses are fetched from
    source: Arc<dyn ParameterSource>,
    /// Resolved paths
    entries: Cache<CanonicalPath, CacheEntry>,
    /// Path used when a call does not name one
    default_path: Option<String>,
    /// Freshness window, None keeps entries forever
    ttl: Option<Duration>,
    /// Strict lookup policy handed to every resolved set
    empty_values: EmptyValues,
    /// Cache hit counter
    hits: AtomicU64,
    /// Cache miss counter
    misses: AtomicU64,
    /// Source invocation counter
    fetches: AtomicU64,
}

impl ResolverCache {
    /// Create a cache in front of `source`
    pub fn new<S>(source: S, config: ResolverConfig) -> Self
    where
        S: ParameterSource + 'static,
    {
        let ttl = config.effective_ttl();

        let mut builder = Cache::builder().name("parameter_path_cache");
        if let Some(ttl) = ttl {
            builder = builder.time_to_live(ttl);
        }

        Self {
            source: Arc::new(source),
            entries: builder.build(),
            default_path: config.default_path,
            ttl,
            empty_values: config.empty_values,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            fetches: AtomicU64::new(0),
        }
    }

    /// Create a cache backed by SSM, configured from the environment
    #[cfg(feature = "ssm")]
    pub async fn from_env() -> Result<Self, crate::config::ConfigError> {
        let config = ResolverConfig::from_env()?;
        let ssm = crate::config::SsmConfig::from_env()?;
        let source = crate::source::SsmSource::connect(&ssm).await;
        Ok(Self::new(source, config))
    }

    /// Resolve every parameter under the default path
    pub async fn resolve(&self) -> Result<Parameters, ResolveError> {
        self.resolve_arg(None).await
    }

    /// Resolve every parameter under `path`
    ///
    /// `/a` and `/a/` address the same entry. An empty path falls back to
    /// the default path.
    pub async fn resolve_path(&self, path: impl AsRef<OsStr>) -> Result<Parameters, ResolveError> {
        self.resolve_arg(Some(path.as_ref())).await
    }

    /// Resolve a single value by short name under the default path
    pub async fn resolve_one(&self, name: impl AsRef<OsStr>) -> Result<String, ResolveError> {
        let name = name_str(name.as_ref())?;
        let parameters = self.resolve_arg(None).await?;
        parameters.get(name).map(str::to_string)
    }

    /// Resolve a single value by short name under `path`
    pub async fn resolve_one_at(
        &self,
        name: impl AsRef<OsStr>,
        path: impl AsRef<OsStr>,
    ) -> Result<String, ResolveError> {
        let name = name_str(name.as_ref())?;
        let parameters = self.resolve_arg(Some(path.as_ref())).await?;
        parameters.get(name).map(str::to_string)
    }

    async fn resolve_arg(&self, path: Option<&OsStr>) -> Result<Parameters, ResolveError> {
        let path = normalize(path, self.default_path.as_deref())?;

        if let Some(cached) = self.entries.get(&path).await {
            self.hits.fetch_add(1, Ordering::Relaxed);
            trace!(
                path = %path,
                age_ms = cached.cached_at.elapsed().as_millis() as u64,
                "Cache HIT for parameter path"
            );
            return Ok(cached.parameters);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        trace!(path = %path, "Cache MISS for parameter path");

        // Concurrent misses for the same path wait on the first caller's
        // fetch. An Err is handed to all of them and nothing is inserted.
        let source = Arc::clone(&self.source);
        let fetches = &self.fetches;
        let empty_values = self.empty_values;
        let key = path.clone();
        let cached = self
            .entries
            .try_get_with(path, async move {
                fetches.fetch_add(1, Ordering::Relaxed);
                debug!(path = %key, "Fetching parameters");

                let fetched = match source.fetch_by_path(key.as_str()).await {
                    Ok(fetched) => fetched,
                    Err(e) => {
                        debug!(path = %key, error = %e, "Parameter fetch failed");
                        return Err(e);
                    }
                };

                let parameters = Parameters::from_fetched(key, fetched, empty_values);
                debug!(
                    path = %parameters.path(),
                    count = parameters.len(),
                    "Resolved parameters"
                );
                Ok::<_, FetchError>(CacheEntry {
                    parameters,
                    cached_at: Instant::now(),
                })
            })
            .await
            .map_err(|e| ResolveError::Fetch((*e).clone()))?;

        Ok(cached.parameters)
    }

    /// Whether a fresh entry exists for `path`
    pub fn is_cached(&self, path: impl AsRef<OsStr>) -> Result<bool, ResolveError> {
        let path = normalize(Some(path.as_ref()), self.default_path.as_deref())?;
        Ok(self.entries.contains_key(&path))
    }

    /// Age of the cached entry for `path`, if one is fresh
    pub async fn entry_age(&self, path: impl AsRef<OsStr>) -> Result<Option<Duration>, ResolveError> {
        let path = normalize(Some(path.as_ref()), self.default_path.as_deref())?;
        Ok(self
            .entries
            .get(&path)
            .await
            .map(|cached| cached.cached_at.elapsed()))
    }

    /// Drop the cached entry for `path` so the next call re-fetches it
    pub async fn invalidate(&self, path: impl AsRef<OsStr>) -> Result<(), ResolveError> {
        let path = normalize(Some(path.as_ref()), self.default_path.as_deref())?;
        self.entries.invalidate(&path).await;
        debug!(path = %path, "Invalidated parameter path");
        Ok(())
    }

    /// Drop every cached entry and reset the counters
    ///
    /// Entries are gone for lookups right away, but `stats().entries` is
    /// Moka's approximate count and may report the old value until the
    /// cache's pending maintenance has run.
    pub fn clear(&self) {
        self.entries.invalidate_all();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.fetches.store(0, Ordering::Relaxed);
        debug!("Cleared parameter cache");
    }

    pub fn default_path(&self) -> Option<&str> {
        self.default_path.as_deref()
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            fetches: self.fetches.load(Ordering::Relaxed),
            entries: self.entries.entry_count(),
        }
    }

    /// Log current cache metrics
    pub fn log_metrics(&self) {
        let stats = self.stats();

        debug!(
            hits = stats.hits,
            misses = stats.misses,
            fetches = stats.fetches,
            hit_rate = format!("{:.1}%", stats.hit_rate()),
            entries = stats.entries,
            "Parameter cache metrics"
        );
    }
}

fn name_str(name: &OsStr) -> Result<&str, ResolveError> {
    name.to_str()
        .ok_or_else(|| ResolveError::InvalidName(name.to_os_string()))
}

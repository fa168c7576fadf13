//! Public client surface + builder.
//! Internals are split into `retry` (policy + cache mode) and `constants` (UA + defaults).

pub mod constants;
mod retry;

pub use retry::{CacheMode, RetryConfig};

use crate::core::cache::CacheStore;
use crate::core::transport::{HttpTransport, Transport};
use crate::core::{NpiError, Provider};
use constants::{DEFAULT_BASE_URL, DEFAULT_CACHE_TTL, DEFAULT_CONCURRENCY, DEFAULT_TIMEOUT, USER_AGENT};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// NPI Registry client: transport, base URL, retry policy and provider cache.
///
/// Cheap to clone; clones share the transport and the cache.
#[derive(Debug, Clone)]
pub struct NpiClient {
    transport: Arc<dyn Transport>,
    base_url: Url,
    retry: RetryConfig,
    cache: Arc<CacheStore<Provider>>,
    cache_ttl: Duration,
    concurrency: usize,
}

impl Default for NpiClient {
    fn default() -> Self {
        Self::builder().build().expect("default client")
    }
}

impl NpiClient {
    /// Create a new builder.
    pub fn builder() -> NpiClientBuilder {
        NpiClientBuilder::default()
    }

    /* -------- internal getters used by other modules -------- */

    pub(crate) fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }
    pub(crate) fn base_url(&self) -> &Url {
        &self.base_url
    }
    pub(crate) fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }
    pub(crate) const fn cache_ttl(&self) -> Duration {
        self.cache_ttl
    }
    pub(crate) const fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// The provider cache shared by all clones of this client.
    pub fn cache(&self) -> &Arc<CacheStore<Provider>> {
        &self.cache
    }

    pub fn cache_enabled(&self) -> bool {
        self.cache.is_enabled()
    }

    /// Stop the background cache sweeper, if one was configured.
    pub async fn stop_cache_sweeper(&self) {
        self.cache.stop_sweeper().await;
    }
}

/* ----------------------- Builder ----------------------- */

#[derive(Default)]
pub struct NpiClientBuilder {
    user_agent: Option<String>,
    base_url: Option<Url>,
    transport: Option<Arc<dyn Transport>>,
    retry: Option<RetryConfig>,

    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    cache_ttl: Option<Duration>,
    cache_sweep_interval: Option<Duration>,
    concurrency: Option<usize>,
}

impl NpiClientBuilder {
    /// Override the User-Agent.
    #[must_use]
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Override the API base (e.g., `https://npiregistry.cms.hhs.gov/api/`).
    #[must_use]
    pub fn base_url(mut self, url: Url) -> Self {
        self.base_url = Some(url);
        self
    }

    /// Replace the HTTP transport. `timeout`, `connect_timeout` and `user_agent` only apply
    /// to the built-in one.
    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Set the retry policy used by every request. Validated by [`build`](Self::build).
    #[must_use]
    pub fn retry_config(mut self, cfg: RetryConfig) -> Self {
        self.retry = Some(cfg);
        self
    }

    /// Shortcut: `false` makes every request a single attempt.
    #[must_use]
    pub fn retry_enabled(mut self, enabled: bool) -> Self {
        let mut cfg = self.retry.take().unwrap_or_default();
        if !enabled {
            cfg.max_retries = 0;
        }
        self.retry = Some(cfg);
        self
    }

    /// Set a global request timeout (overall). Default: 30s.
    #[must_use]
    pub fn timeout(mut self, dur: Duration) -> Self {
        self.timeout = Some(dur);
        self
    }

    /// Set a connect timeout. Default: none.
    #[must_use]
    pub fn connect_timeout(mut self, dur: Duration) -> Self {
        self.connect_timeout = Some(dur);
        self
    }

    /// Enable in-memory caching of provider lookups, each entry living for `dur`.
    /// If neither this nor [`cache_sweep_interval`](Self::cache_sweep_interval) is set,
    /// caching is disabled.
    #[must_use]
    pub fn cache_ttl(mut self, dur: Duration) -> Self {
        self.cache_ttl = Some(dur);
        self
    }

    /// Enable caching and sweep expired entries every `every` in the background.
    /// Entries keep their own TTL (5 minutes unless [`cache_ttl`](Self::cache_ttl) is set).
    ///
    /// The sweeper is spawned by [`build`](Self::build), which then has to run inside a
    /// tokio runtime.
    #[must_use]
    pub fn cache_sweep_interval(mut self, every: Duration) -> Self {
        self.cache_sweep_interval = Some(every);
        self
    }

    /// Maximum lookups in flight during a batch. Default: 5.
    #[must_use]
    pub fn concurrency(mut self, n: usize) -> Self {
        self.concurrency = Some(n);
        self
    }

    /// Validate the configuration and build the client.
    ///
    /// # Errors
    ///
    /// Returns `NpiError::Config` for an invalid retry policy, a zero cache TTL, sweep
    /// interval or concurrency, or a sweep interval without a running tokio runtime.
    /// Returns `NpiError::Http` if the HTTP client cannot be constructed.
    pub fn build(self) -> Result<NpiClient, NpiError> {
        let base_url = match self.base_url {
            Some(u) => u,
            None => Url::parse(DEFAULT_BASE_URL)?,
        };

        let retry = self.retry.unwrap_or_default();
        retry.validate()?;

        let concurrency = self.concurrency.unwrap_or(DEFAULT_CONCURRENCY);
        if concurrency == 0 {
            return Err(NpiError::Config("concurrency must be at least 1".into()));
        }

        let cache_enabled = self.cache_ttl.is_some() || self.cache_sweep_interval.is_some();
        let cache_ttl = self.cache_ttl.unwrap_or(DEFAULT_CACHE_TTL);
        if cache_ttl.is_zero() {
            return Err(NpiError::Config("cache TTL must be non-zero".into()));
        }

        let transport: Arc<dyn Transport> = match self.transport {
            Some(t) => t,
            None => {
                let mut httpb = reqwest::Client::builder()
                    .user_agent(self.user_agent.as_deref().unwrap_or(USER_AGENT))
                    .timeout(self.timeout.unwrap_or(DEFAULT_TIMEOUT));
                if let Some(ct) = self.connect_timeout {
                    httpb = httpb.connect_timeout(ct);
                }
                Arc::new(HttpTransport::new(httpb.build()?))
            }
        };

        let cache = Arc::new(CacheStore::new(cache_enabled));
        if let Some(every) = self.cache_sweep_interval {
            cache.start_sweeper(every)?;
        }

        Ok(NpiClient {
            transport,
            base_url,
            retry,
            cache,
            cache_ttl,
            concurrency,
        })
    }
}

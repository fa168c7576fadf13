//! Single-provider lookup: cache, then the retry engine, then the cache again.

use tokio_util::sync::CancellationToken;

use crate::core::client::{CacheMode, RetryConfig};
use crate::core::{NpiClient, NpiError, Provider};
use crate::search::{SearchOptions, run_query};

/// A builder for looking up one provider by NPI number.
#[derive(Debug, Clone)]
pub struct ProviderBuilder {
    client: NpiClient,
    npi: String,
    cache_mode: CacheMode,
    retry_override: Option<RetryConfig>,
    cancel: CancellationToken,
}

impl ProviderBuilder {
    /// Creates a new `ProviderBuilder` for `npi`.
    #[must_use]
    pub fn new(client: &NpiClient, npi: impl Into<String>) -> Self {
        Self {
            client: client.clone(),
            npi: npi.into(),
            cache_mode: CacheMode::Use,
            retry_override: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Sets the cache mode for this specific lookup.
    #[must_use]
    pub const fn cache_mode(mut self, mode: CacheMode) -> Self {
        self.cache_mode = mode;
        self
    }

    /// Overrides the default retry policy for this specific lookup.
    #[must_use]
    pub fn retry_policy(mut self, cfg: Option<RetryConfig>) -> Self {
        self.retry_override = cfg;
        self
    }

    /// Cancels the lookup (including pending retries) when `token` fires.
    #[must_use]
    pub fn cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Fetches the provider.
    ///
    /// A cache hit returns without touching the network. On a miss the lookup goes through
    /// the retry engine and a successful result is cached for the client's entry TTL.
    /// Failures are never cached.
    ///
    /// # Errors
    ///
    /// - `NpiError::InvalidParams` if the NPI is empty (checked before any cache or network use).
    /// - `NpiError::NotFound` if the registry has no record for it.
    /// - `NpiError::Status`, `NpiError::RetriesExhausted` or `NpiError::Cancelled` from the
    ///   retry engine.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err, fields(npi = %self.npi)))]
    pub async fn fetch(self) -> Result<Provider, NpiError> {
        fetch_provider(
            &self.client,
            &self.npi,
            self.cache_mode,
            self.retry_override.as_ref(),
            &self.cancel,
        )
        .await
    }
}

pub(crate) async fn fetch_provider(
    client: &NpiClient,
    npi: &str,
    cache_mode: CacheMode,
    retry_override: Option<&RetryConfig>,
    cancel: &CancellationToken,
) -> Result<Provider, NpiError> {
    let npi = npi.trim();
    if npi.is_empty() {
        return Err(NpiError::InvalidParams("npi cannot be empty".into()));
    }

    let cache = client.cache();
    if cache_mode == CacheMode::Use
        && let Some(p) = cache.get(npi).await
    {
        #[cfg(feature = "tracing")]
        tracing::debug!(npi, "cache hit");
        return Ok(p);
    }

    let policy = match retry_override {
        Some(cfg) => {
            cfg.validate()?;
            cfg
        }
        None => client.retry_config(),
    };

    let opts = SearchOptions {
        number: npi.to_string(),
        limit: 1,
        ..SearchOptions::default()
    };
    let env = run_query(client, &opts, policy, cancel)
        .await
        .map_err(|e| e.with_npi(npi))?;

    let provider = env
        .results
        .into_iter()
        .next()
        .ok_or_else(|| NpiError::NotFound {
            npi: npi.to_string(),
        })?;

    if cache_mode != CacheMode::Bypass {
        cache.put(npi, provider.clone(), client.cache_ttl()).await;
    }

    Ok(provider)
}

impl NpiClient {
    /// Fetches a single provider by NPI number. See [`ProviderBuilder`].
    ///
    /// # Errors
    ///
    /// See [`ProviderBuilder::fetch`].
    pub async fn get_provider(&self, npi: &str) -> Result<Provider, NpiError> {
        ProviderBuilder::new(self, npi).fetch().await
    }
}

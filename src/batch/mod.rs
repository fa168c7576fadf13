//! Bounded-concurrency batch lookups with partial-failure reporting.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::core::client::{CacheMode, RetryConfig};
use crate::core::{NpiClient, NpiError, Provider};
use crate::provider::fetch_provider;

/// The outcome of a batch lookup: every success keyed by NPI, plus every failure.
///
/// Results land in completion order, so look them up by key, never by position.
#[derive(Debug)]
pub struct BatchResult {
    succeeded: HashMap<String, Provider>,
    failures: Vec<(String, NpiError)>,
    total: usize,
}

impl BatchResult {
    /// Providers that were fetched successfully, keyed by NPI.
    #[must_use]
    pub const fn succeeded(&self) -> &HashMap<String, Provider> {
        &self.succeeded
    }

    /// Every failed NPI with its error, in the order the failures were recorded.
    #[must_use]
    pub fn failures(&self) -> &[(String, NpiError)] {
        &self.failures
    }

    /// Number of distinct NPIs in the batch.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.total
    }

    /// `true` when every NPI was fetched.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    #[must_use]
    pub fn get(&self, npi: &str) -> Option<&Provider> {
        self.succeeded.get(npi)
    }

    /// Splits the result into the success map and, if anything failed, an aggregate
    /// `NpiError::PartialBatch` carrying the failure count and the first failure.
    #[must_use]
    pub fn into_parts(self) -> (HashMap<String, Provider>, Option<NpiError>) {
        let failed = self.failures.len();
        let err = self
            .failures
            .into_iter()
            .next()
            .map(|(key, source)| NpiError::PartialBatch {
                failed,
                total: self.total,
                key,
                source: Box::new(source),
            });
        (self.succeeded, err)
    }
}

/// A builder for fetching many providers concurrently.
///
/// Each NPI goes through the same path as [`ProviderBuilder`](crate::ProviderBuilder),
/// including the cache. At most `concurrency` lookups are in flight at once; the rest
/// wait for a free slot. Every lookup runs to completion even if others fail.
#[derive(Debug, Clone)]
pub struct BatchBuilder {
    client: NpiClient,
    npis: Vec<String>,
    concurrency: Option<usize>,
    cache_mode: CacheMode,
    retry_override: Option<RetryConfig>,
    cancel: CancellationToken,
}

impl BatchBuilder {
    /// Creates a new `BatchBuilder`. NPIs are trimmed, and duplicates are fetched once.
    pub fn new<I, S>(client: &NpiClient, npis: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            client: client.clone(),
            npis: npis.into_iter().map(Into::into).collect(),
            concurrency: None,
            cache_mode: CacheMode::Use,
            retry_override: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Overrides the client's concurrency ceiling for this batch.
    #[must_use]
    pub const fn concurrency(mut self, n: usize) -> Self {
        self.concurrency = Some(n);
        self
    }

    #[must_use]
    pub const fn cache_mode(mut self, mode: CacheMode) -> Self {
        self.cache_mode = mode;
        self
    }

    #[must_use]
    pub fn retry_policy(mut self, cfg: Option<RetryConfig>) -> Self {
        self.retry_override = cfg;
        self
    }

    /// Cancels every lookup in the batch when `token` fires. Lookups that have not
    /// started yet fail with `NpiError::Cancelled` without touching the network.
    #[must_use]
    pub fn cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Runs the batch.
    ///
    /// Per-key failures do not make this return `Err`; inspect
    /// [`BatchResult::failures`] or use [`BatchResult::into_parts`].
    ///
    /// Dropping the returned future aborts every lookup it has started.
    ///
    /// # Errors
    ///
    /// Returns `NpiError::InvalidParams` for an empty NPI list and `NpiError::Config` for a
    /// zero concurrency or an invalid retry override, before any network interaction.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err, fields(npi_count = self.npis.len())))]
    pub async fn fetch(self) -> Result<BatchResult, NpiError> {
        let mut seen = HashSet::new();
        let keys: Vec<String> = self
            .npis
            .iter()
            .map(|k| k.trim().to_string())
            .filter(|k| seen.insert(k.clone()))
            .collect();
        if keys.is_empty() {
            return Err(NpiError::InvalidParams("npi list cannot be empty".into()));
        }

        let concurrency = self.concurrency.unwrap_or_else(|| self.client.concurrency());
        if concurrency == 0 {
            return Err(NpiError::Config("concurrency must be at least 1".into()));
        }
        if let Some(cfg) = &self.retry_override {
            cfg.validate()?;
        }

        let total = keys.len();
        let semaphore = Arc::new(Semaphore::new(concurrency));
        let succeeded = Arc::new(Mutex::new(HashMap::with_capacity(total)));
        let failures: Arc<Mutex<Vec<(String, NpiError)>>> = Arc::new(Mutex::new(Vec::new()));

        let mut handles = TaskGuard(Vec::with_capacity(total));
        for npi in keys {
            let permit = match Arc::clone(&semaphore).acquire_owned().await {
                Ok(p) => p,
                Err(e) => {
                    failures
                        .lock()
                        .await
                        .push((npi, NpiError::Task(format!("semaphore error: {e}"))));
                    continue;
                }
            };

            let client = self.client.clone();
            let cache_mode = self.cache_mode;
            let retry_override = self.retry_override.clone();
            let cancel = self.cancel.clone();
            let succeeded = Arc::clone(&succeeded);
            let failures = Arc::clone(&failures);
            let key = npi.clone();

            let handle = tokio::spawn(async move {
                let _permit = permit;
                match fetch_provider(&client, &npi, cache_mode, retry_override.as_ref(), &cancel)
                    .await
                {
                    Ok(p) => {
                        succeeded.lock().await.insert(npi, p);
                    }
                    Err(e) => {
                        failures.lock().await.push((npi, e));
                    }
                }
            });
            handles.0.push((key, handle));
        }

        let joined = join_all(
            handles
                .0
                .iter_mut()
                .map(|(key, h)| async move { (key.clone(), h.await) }),
        )
        .await;
        for (key, res) in joined {
            if let Err(e) = res {
                failures
                    .lock()
                    .await
                    .push((key, NpiError::Task(e.to_string())));
            }
        }

        let succeeded = std::mem::take(&mut *succeeded.lock().await);
        let failures = std::mem::take(&mut *failures.lock().await);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            successful_fetches = succeeded.len(),
            failed_fetches = failures.len(),
            "batch fetch finished"
        );

        Ok(BatchResult {
            succeeded,
            failures,
            total,
        })
    }
}

/// Per-key tasks of a running batch, aborted if the batch future is dropped early.
struct TaskGuard(Vec<(String, JoinHandle<()>)>);

impl Drop for TaskGuard {
    fn drop(&mut self) {
        for (_, h) in &self.0 {
            h.abort();
        }
    }
}

impl NpiClient {
    /// Fetches several providers concurrently. See [`BatchBuilder`].
    ///
    /// # Errors
    ///
    /// See [`BatchBuilder::fetch`].
    pub async fn get_providers<I, S>(&self, npis: I) -> Result<BatchResult, NpiError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        BatchBuilder::new(self, npis).fetch().await
    }
}

//! In-memory TTL cache with an owned background sweeper.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use tokio::{
    runtime::Handle,
    select,
    sync::{RwLock, oneshot},
    task::JoinHandle,
    time::{Instant, MissedTickBehavior, interval},
};

use crate::core::NpiError;

#[derive(Debug)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

/// A handle for a running sweep task.
#[derive(Debug)]
struct SweeperHandle {
    join: JoinHandle<()>,
    stop_tx: Option<oneshot::Sender<()>>,
}

impl SweeperHandle {
    /// Politely ask the sweeper to stop and wait for it to finish.
    async fn stop(mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        let _ = self.join.await;
    }

    fn abort(&self) {
        self.join.abort();
    }
}

/// Key-value store mapping a lookup key to a value with an absolute expiry.
///
/// Expiry is passive on reads: an expired entry is a miss and is never extended.
/// Expired entries are physically removed by [`CacheStore::sweep`], either on demand or
/// periodically by a sweeper started with [`CacheStore::start_sweeper`].
///
/// A disabled store never creates or reads entries, and never touches its lock.
#[derive(Debug)]
pub struct CacheStore<V> {
    enabled: AtomicBool,
    map: RwLock<HashMap<String, CacheEntry<V>>>,
    sweeper: Mutex<Option<SweeperHandle>>,
}

impl<V> Default for CacheStore<V> {
    fn default() -> Self {
        Self::new(false)
    }
}

impl<V> CacheStore<V> {
    /// Create a store, enabled or not.
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
            map: RwLock::new(HashMap::new()),
            sweeper: Mutex::new(None),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Enable or disable the store. Existing entries are kept but become unreachable
    /// until the store is enabled again.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }

    /// Insert or replace the entry for `key`, expiring `ttl` from now.
    pub async fn put(&self, key: impl Into<String>, value: V, ttl: Duration) {
        if !self.is_enabled() {
            return;
        }
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.map.write().await.insert(key.into(), entry);
    }

    /// Remove every expired entry, returning how many were removed.
    pub async fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut guard = self.map.write().await;
        let before = guard.len();
        guard.retain(|_, e| now <= e.expires_at);
        before - guard.len()
    }

    /// Number of entries physically present, expired or not.
    pub async fn len(&self) -> usize {
        self.map.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.map.read().await.is_empty()
    }

    pub async fn clear(&self) {
        self.map.write().await.clear();
    }

    /// Returns `true` while a sweeper task is attached to this store.
    pub fn is_sweeping(&self) -> bool {
        self.sweeper
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|h| !h.join.is_finished())
    }

    /// Stop the sweeper, if one is running, and wait for it to exit.
    pub async fn stop_sweeper(&self) {
        let handle = self
            .sweeper
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(h) = handle {
            h.stop().await;
        }
    }
}

impl<V: Clone> CacheStore<V> {
    /// Returns the cached value if it exists and has not expired.
    pub async fn get(&self, key: &str) -> Option<V> {
        if !self.is_enabled() {
            return None;
        }
        let guard = self.map.read().await;
        guard
            .get(key)
            .filter(|e| Instant::now() <= e.expires_at)
            .map(|e| e.value.clone())
    }
}

impl<V: Send + Sync + 'static> CacheStore<V> {
    /// Start sweeping expired entries every `every`. Replaces (and aborts) a sweeper that
    /// is already running.
    ///
    /// The task only holds a weak reference, so it exits on its own once the store is
    /// dropped.
    ///
    /// # Errors
    ///
    /// Returns `NpiError::Config` if `every` is zero or no tokio runtime is running. A
    /// sweeper that was already running is left untouched in that case.
    pub fn start_sweeper(self: &Arc<Self>, every: Duration) -> Result<(), NpiError> {
        if every.is_zero() {
            return Err(NpiError::Config("cache sweep interval must be non-zero".into()));
        }
        let runtime = Handle::try_current().map_err(|_| {
            NpiError::Config("cache sweeper requires a running tokio runtime".into())
        })?;

        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let store: Weak<Self> = Arc::downgrade(self);

        let join = runtime.spawn(async move {
            let mut ticker = interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // the first tick completes immediately
            ticker.tick().await;

            loop {
                select! {
                    _ = ticker.tick() => {
                        let Some(strong) = store.upgrade() else { break };
                        let _removed = strong.sweep().await;
                        #[cfg(feature = "tracing")]
                        {
                            tracing::trace!(removed = _removed, "cache sweep");
                        }
                    }
                    _ = &mut stop_rx => {
                        break;
                    }
                }
            }
        });

        let previous = self
            .sweeper
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(SweeperHandle {
                join,
                stop_tx: Some(stop_tx),
            });
        if let Some(old) = previous {
            old.abort();
        }
        Ok(())
    }
}

impl<V> Drop for CacheStore<V> {
    fn drop(&mut self) {
        let handle = self
            .sweeper
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(h) = handle {
            h.abort();
        }
    }
}

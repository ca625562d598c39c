//! Keyed query cache with staleness TTL, in-flight de-duplication, and a
//! per-lane retry budget.
//!
//! One `QueryCache` instance backs one lane (user search, repositories).
//! A fresh entry short-circuits without touching the fetcher; concurrent
//! requests for the same key await a single shared fetch; an expired
//! entry blocks on its refetch. Entries are never proactively evicted.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::time::Instant;

use crate::errors::{AppError, AppResult};

/// Explicit per-lane tuning, so tests can exercise retry exhaustion and
/// expiry deterministically.
#[derive(Debug, Clone, Copy)]
pub struct LaneConfig {
    /// Entries older than this are refetched on next access
    pub stale_ttl: Duration,
    /// Automatic retries after a failed fetch before the error surfaces
    pub retry_budget: u32,
}

type Fetcher<T> = Arc<dyn Fn(String) -> BoxFuture<'static, AppResult<T>> + Send + Sync>;
type SharedFetch<T> = Shared<BoxFuture<'static, AppResult<T>>>;

struct Slot<T> {
    value: Option<(T, Instant)>,
    in_flight: Option<SharedFetch<T>>,
    last_error: Option<AppError>,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self {
            value: None,
            in_flight: None,
            last_error: None,
        }
    }
}

/// One cached, de-duplicated fetch pipeline.
pub struct QueryCache<T: Clone + Send + Sync + 'static> {
    name: &'static str,
    config: LaneConfig,
    fetcher: Fetcher<T>,
    slots: Arc<Mutex<HashMap<String, Slot<T>>>>,
}

impl<T: Clone + Send + Sync + 'static> QueryCache<T> {
    pub fn new<F, Fut>(name: &'static str, config: LaneConfig, fetch: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AppResult<T>> + Send + 'static,
    {
        Self {
            name,
            config,
            fetcher: Arc::new(move |key| fetch(key).boxed()),
            slots: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Get the value for `key`, fetching (or joining an in-flight fetch)
    /// when the cache has no fresh entry.
    pub async fn get(&self, key: &str) -> AppResult<T> {
        let fetch = {
            let mut slots = lock(&self.slots);
            let slot = slots.entry(key.to_string()).or_default();

            if let Some((value, fetched_at)) = &slot.value {
                if fetched_at.elapsed() < self.config.stale_ttl {
                    tracing::debug!(lane = self.name, key, "cache hit");
                    return Ok(value.clone());
                }
                tracing::debug!(lane = self.name, key, "cache entry stale, refetching");
            }

            match slot.in_flight.clone() {
                Some(fetch) => fetch,
                None => self.begin_fetch(&mut slots, key),
            }
        };

        fetch.await
    }

    /// Force a fetch for `key` even when the entry is fresh, still joining
    /// any fetch already in flight. This is the manual retry hook.
    pub async fn refetch(&self, key: &str) -> AppResult<T> {
        let fetch = {
            let mut slots = lock(&self.slots);
            let existing = slots.get(key).and_then(|slot| slot.in_flight.clone());
            match existing {
                Some(fetch) => fetch,
                None => self.begin_fetch(&mut slots, key),
            }
        };

        fetch.await
    }

    /// Drop the entry for `key`; the next access fetches from scratch.
    pub fn invalidate(&self, key: &str) {
        let mut slots = lock(&self.slots);
        if let Some(slot) = slots.get_mut(key) {
            slot.value = None;
            slot.last_error = None;
        }
    }

    /// Latest failure recorded for `key`, cleared by a successful fetch.
    pub fn last_error(&self, key: &str) -> Option<AppError> {
        let slots = lock(&self.slots);
        slots.get(key).and_then(|slot| slot.last_error.clone())
    }

    /// Start a fetch with retries and register it as the single in-flight
    /// request for the key. The shared future writes the outcome back
    /// into the slot before resolving.
    fn begin_fetch(
        &self,
        slots: &mut MutexGuard<'_, HashMap<String, Slot<T>>>,
        key: &str,
    ) -> SharedFetch<T> {
        let fetcher = Arc::clone(&self.fetcher);
        let slots_handle = Arc::clone(&self.slots);
        let retry_budget = self.config.retry_budget;
        let name = self.name;
        let key = key.to_string();
        let key_for_slot = key.clone();

        let fetch = async move {
            let mut attempt = 0u32;
            let result = loop {
                match fetcher(key.clone()).await {
                    Ok(value) => break Ok(value),
                    Err(e) if attempt < retry_budget => {
                        attempt += 1;
                        tracing::warn!(
                            lane = name,
                            key = %key,
                            attempt,
                            error = %e,
                            "fetch failed, retrying"
                        );
                    }
                    Err(e) => {
                        tracing::warn!(lane = name, key = %key, error = %e, "fetch failed");
                        break Err(e);
                    }
                }
            };

            let mut slots = lock(&slots_handle);
            let slot = slots.entry(key.clone()).or_default();
            slot.in_flight = None;
            match &result {
                Ok(value) => {
                    slot.value = Some((value.clone(), Instant::now()));
                    slot.last_error = None;
                }
                Err(e) => {
                    slot.last_error = Some(e.clone());
                }
            }

            result
        }
        .boxed()
        .shared();

        let slot = slots.entry(key_for_slot).or_default();
        slot.in_flight = Some(fetch.clone());
        fetch
    }
}

/// Lock the slot map, recovering from poisoning (a panicked fetch
/// write-back must not wedge every later query).
fn lock<T>(slots: &Mutex<HashMap<String, Slot<T>>>) -> MutexGuard<'_, HashMap<String, Slot<T>>> {
    slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

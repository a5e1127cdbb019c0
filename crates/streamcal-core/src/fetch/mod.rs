//! Cached fetchers for everything the calendar reads.
//!
//! `DataService` wraps each remote read with a look at the `CacheStore`:
//! a fresh entry is returned without touching the network, a cold or
//! expired key is fetched once (concurrent callers wait on the same
//! in-flight lock), and a failed fetch falls back to whatever the cache
//! still holds. YouTube videos additionally serve stale entries while a
//! background task revalidates them.

mod media;
mod store;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::api::{ApiError, MediaApi, MediaClient, StoreApi, StoreClient};
use crate::cache::{CacheStore, CachedData, Clock, InFlight};
use crate::config::{Config, FreshnessPolicy};
use crate::error::{Error, Result};

pub use media::{channel_owners, media_key, merge_channel_items};
pub use store::{DDAYS_KEY, MEMBERS_KEY, NOTICES_KEY};

/// Where a fetcher's answer came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchSource {
    /// Served from a fresh cache entry.
    Fresh,
    /// Fetched from the network just now.
    Network,
    /// A stale entry, served while a background refresh runs.
    Revalidating,
    /// The fetch failed and an older cache entry was substituted.
    StaleFallback,
    /// No member had a channel id for this source; nothing was requested.
    NoChannels,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Fetched<T> {
    pub data: T,
    pub fetched_at: DateTime<Utc>,
    pub source: FetchSource,
}

impl<T> Fetched<T> {
    fn from_cache(cached: CachedData<T>, source: FetchSource) -> Self {
        Self {
            data: cached.data,
            fetched_at: cached.cached_at,
            source,
        }
    }
}

/// Clone is cheap - every field is shared.
#[derive(Clone)]
pub struct DataService {
    cache: Arc<CacheStore>,
    flight: Arc<InFlight>,
    store: Arc<dyn StoreApi>,
    media: Arc<dyn MediaApi>,
    policy: FreshnessPolicy,
    timeout: StdDuration,
}

impl DataService {
    pub fn new(
        cache: Arc<CacheStore>,
        store: Arc<dyn StoreApi>,
        media: Arc<dyn MediaApi>,
        policy: FreshnessPolicy,
        timeout: StdDuration,
    ) -> Self {
        Self {
            cache,
            flight: Arc::new(InFlight::new()),
            store,
            media,
            policy,
            timeout,
        }
    }

    /// Build the HTTP-backed service described by `config`.
    pub fn from_config(config: &Config, clock: Arc<dyn Clock>) -> anyhow::Result<Self> {
        let (store_url, store_key) = config.store_endpoint()?;
        let store = StoreClient::new(store_url, store_key, config.request_timeout())?;
        let media = MediaClient::new(config.media_endpoint()?, config.request_timeout())?;
        Ok(Self::new(
            Arc::new(CacheStore::new(clock)),
            Arc::new(store),
            Arc::new(media),
            config.cache.clone(),
            config.request_timeout(),
        ))
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    pub fn store(&self) -> Arc<dyn StoreApi> {
        Arc::clone(&self.store)
    }

    pub fn policy(&self) -> &FreshnessPolicy {
        &self.policy
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.cache.now()
    }

    pub fn is_revalidating(&self, key: &str) -> bool {
        self.flight.is_revalidating(key)
    }

    /// Run a remote call under the configured timeout.
    pub async fn with_timeout<T, Fut>(&self, call: Fut) -> Result<T>
    where
        Fut: Future<Output = std::result::Result<T, ApiError>>,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result.map_err(Error::from),
            Err(_) => Err(Error::Timeout(self.timeout)),
        }
    }

    /// Read and decode a cache entry, treating undecodable entries as absent.
    fn lookup<T: DeserializeOwned>(&self, key: &str) -> Option<CachedData<T>> {
        match self.cache.get_as(key) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(cache = key, error = %e, "Discarding undecodable cache entry");
                None
            }
        }
    }

    fn fresh_hit<T: DeserializeOwned>(&self, key: &str, fresh: Duration) -> Option<Fetched<T>> {
        let entry = self.lookup::<T>(key)?;
        if self.cache.is_fresh(&entry, fresh) {
            debug!(cache = key, "Cache hit");
            Some(Fetched::from_cache(entry, FetchSource::Fresh))
        } else {
            None
        }
    }

    /// The blocking path shared by every fetcher.
    ///
    /// Unless `force` is set, a fresh entry short-circuits. Otherwise the
    /// key's in-flight lock is taken and the cache re-checked, so callers
    /// queued behind a running fetch reuse its result.
    async fn cached<T, F, Fut>(&self, key: &str, fresh: Duration, force: bool, fetch: F) -> Result<Fetched<T>>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, ApiError>>,
    {
        if !force {
            if let Some(hit) = self.fresh_hit(key, fresh) {
                return Ok(hit);
            }
        }

        let _in_flight = self.flight.lock(key).await;
        if !force {
            if let Some(hit) = self.fresh_hit(key, fresh) {
                return Ok(hit);
            }
        }

        debug!(cache = key, force, "Cache miss, fetching");
        self.fetch_and_store(key, fetch()).await
    }

    async fn fetch_and_store<T, Fut>(&self, key: &str, call: Fut) -> Result<Fetched<T>>
    where
        T: Serialize + DeserializeOwned,
        Fut: Future<Output = std::result::Result<T, ApiError>>,
    {
        let started = self.now();
        match self.with_timeout(call).await {
            Ok(data) => {
                self.cache.set_fetched(key, &data, started)?;
                Ok(Fetched {
                    data,
                    fetched_at: started,
                    source: FetchSource::Network,
                })
            }
            Err(err) => match self.lookup::<T>(key) {
                Some(stale) => {
                    warn!(cache = key, error = %err, age = %stale.age_display(self.now()), "Fetch failed, serving stale data");
                    Ok(Fetched::from_cache(stale, FetchSource::StaleFallback))
                }
                None => Err(err),
            },
        }
    }

    /// Refresh `key` in a detached task. At most one runs per key; failures
    /// are logged and dropped.
    fn spawn_revalidation<T, Fut>(&self, key: String, call: Fut)
    where
        T: Serialize + Send + 'static,
        Fut: Future<Output = std::result::Result<T, ApiError>> + Send + 'static,
    {
        let Some(slot) = self.flight.begin_revalidation(&key) else {
            debug!(cache = %key, "Revalidation already running");
            return;
        };
        let service = self.clone();
        tokio::spawn(async move {
            let _slot = slot;
            let started = service.now();
            match service.with_timeout(call).await {
                Ok(data) => match service.cache.set_fetched(&key, &data, started) {
                    Ok(Some(_)) => debug!(cache = %key, "Revalidated"),
                    Ok(None) => debug!(cache = %key, "Revalidation superseded by a newer fetch"),
                    Err(e) => warn!(cache = %key, error = %e, "Could not store revalidated data"),
                },
                Err(e) => warn!(cache = %key, error = %e, "Background revalidation failed"),
            }
        });
    }
}

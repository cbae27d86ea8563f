//! Per-user query cache for the client data-fetching layer.
//!
//! Entries are keyed by resource and user id, expire after a TTL, and are
//! dropped explicitly on logout and after a settings save. Concurrent lookups
//! of the same key share a single fetch.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Resource {
    Settings,
    Spreadsheets,
    Worksheets(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    resource: Resource,
    user_id: Uuid,
}

struct Entry {
    value: Value,
    fetched_at: Instant,
}

pub struct QueryCache {
    entries: DashMap<CacheKey, Entry>,
    in_flight: DashMap<CacheKey, Arc<Mutex<()>>>,
    // Bumped by every invalidation so a fetch that started before it is not stored.
    epoch: AtomicU64,
    ttl: Duration,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl QueryCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            in_flight: DashMap::new(),
            epoch: AtomicU64::new(0),
            ttl,
        }
    }

    /// The cached value, if present and younger than the TTL.
    pub fn get<T: DeserializeOwned>(&self, resource: &Resource, user_id: Uuid) -> Option<T> {
        let key = CacheKey {
            resource: resource.clone(),
            user_id,
        };
        let entry = self.entries.get(&key)?;

        if entry.fetched_at.elapsed() >= self.ttl {
            drop(entry);
            self.entries.remove(&key);
            return None;
        }

        match serde_json::from_value(entry.value.clone()) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(?resource, "Discarding cache entry of unexpected shape: {}", e);
                drop(entry);
                self.entries.remove(&key);
                None
            }
        }
    }

    pub fn insert<T: Serialize>(&self, resource: Resource, user_id: Uuid, value: &T) {
        match serde_json::to_value(value) {
            Ok(value) => {
                self.entries.insert(
                    CacheKey { resource, user_id },
                    Entry {
                        value,
                        fetched_at: Instant::now(),
                    },
                );
            }
            Err(e) => warn!(?resource, "Value not cacheable: {}", e),
        }
    }

    /// Returns the cached value or runs `fetch` once, even if several callers
    /// ask for the same key at the same time.
    pub async fn get_or_fetch<T, E, F, Fut>(
        &self,
        resource: Resource,
        user_id: Uuid,
        fetch: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.get(&resource, user_id) {
            return Ok(value);
        }

        let key = CacheKey {
            resource: resource.clone(),
            user_id,
        };
        let gate = self.in_flight.entry(key.clone()).or_default().value().clone();

        let outcome = {
            let _guard = gate.lock().await;

            match self.get(&resource, user_id) {
                Some(value) => {
                    debug!(?resource, "Served by a concurrent fetch");
                    Ok(value)
                }
                None => {
                    let epoch = self.epoch.load(Ordering::Acquire);
                    let fetched = fetch().await;

                    if let Ok(value) = &fetched {
                        if self.epoch.load(Ordering::Acquire) == epoch {
                            self.insert(resource, user_id, value);
                        }
                    }
                    fetched
                }
            }
        };

        // The map holds the last reference once no caller is waiting on the gate.
        drop(gate);
        self.in_flight
            .remove_if(&key, |_, gate| Arc::strong_count(gate) == 1);

        outcome
    }

    /// Drops every entry belonging to `user_id`.
    pub fn invalidate(&self, user_id: Uuid) {
        self.epoch.fetch_add(1, Ordering::AcqRel);
        self.entries.retain(|key, _| key.user_id != user_id);
        debug!(%user_id, "Cache invalidated for user");
    }

    pub fn invalidate_resource(&self, resource: &Resource, user_id: Uuid) {
        self.epoch.fetch_add(1, Ordering::AcqRel);
        self.entries.remove(&CacheKey {
            resource: resource.clone(),
            user_id,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

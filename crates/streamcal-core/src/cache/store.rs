use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use super::Clock;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedData<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
}

/// What the store keeps per key.
pub type CacheEntry = CachedData<serde_json::Value>;

impl<T> CachedData<T> {
    pub fn new(data: T, cached_at: DateTime<Utc>) -> Self {
        Self { data, cached_at }
    }

    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.cached_at
    }

    pub fn age_display(&self, now: DateTime<Utc>) -> String {
        let minutes = self.age(now).num_minutes();
        if minutes < 1 {
            // Includes clock skew
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            let hours = minutes / 60;
            if minutes % 60 >= 30 {
                format!("{}h ago", hours + 1)
            } else {
                format!("{}h ago", hours)
            }
        } else {
            let days = minutes / 1440;
            if (minutes % 1440) / 60 >= 12 {
                format!("{}d ago", days + 1)
            } else {
                format!("{}d ago", days)
            }
        }
    }
}

impl CacheEntry {
    pub fn decode<T: DeserializeOwned>(&self) -> Result<CachedData<T>> {
        Ok(CachedData {
            data: serde_json::from_value(self.data.clone())?,
            cached_at: self.cached_at,
        })
    }
}

pub struct CacheStore {
    entries: Mutex<HashMap<String, CacheEntry>>,
    clock: Arc<dyn Clock>,
}

impl CacheStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn get(&self, key: &str) -> Option<CacheEntry> {
        self.entries().get(key).cloned()
    }

    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<CachedData<T>>> {
        self.get(key).map(|entry| entry.decode()).transpose()
    }

    /// Store `value` stamped with the current time.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<CacheEntry> {
        let entry = CachedData::new(serde_json::to_value(value)?, self.now());
        self.entries().insert(key.to_string(), entry.clone());
        Ok(entry)
    }

    /// Store the result of a fetch that was issued at `fetched_at`.
    ///
    /// Returns `None` without writing when the key already holds data from a
    /// fetch that started later.
    pub fn set_fetched<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        fetched_at: DateTime<Utc>,
    ) -> Result<Option<CacheEntry>> {
        let data = serde_json::to_value(value)?;
        let mut entries = self.entries();
        if let Some(existing) = entries.get(key) {
            if existing.cached_at > fetched_at {
                debug!(cache = key, "Ignoring result of an older fetch");
                return Ok(None);
            }
        }
        let entry = CachedData::new(data, fetched_at);
        entries.insert(key.to_string(), entry.clone());
        Ok(Some(entry))
    }

    pub fn is_fresh<T>(&self, entry: &CachedData<T>, fresh: Duration) -> bool {
        entry.age(self.now()) < fresh
    }

    pub fn is_stale<T>(&self, entry: &CachedData<T>, stale: Duration) -> bool {
        entry.age(self.now()) >= stale
    }

    /// `(key, age)` pairs sorted by key, for status output.
    pub fn ages(&self) -> Vec<(String, String)> {
        let now = self.now();
        let mut ages: Vec<(String, String)> = self
            .entries()
            .iter()
            .map(|(key, entry)| (key.clone(), entry.age_display(now)))
            .collect();
        ages.sort();
        ages
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    pub fn clear(&self) {
        self.entries().clear();
    }
}

// ============================================================================
// Tests
// ============================================================================

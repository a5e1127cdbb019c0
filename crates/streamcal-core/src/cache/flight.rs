use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use tokio::sync::OwnedMutexGuard;

type KeyLock = Arc<tokio::sync::Mutex<()>>;

/// Tracks fetches in progress per cache key.
///
/// Blocking refreshes serialize on [`InFlight::lock`]; whoever gets the lock
/// second should re-read the cache before going to the network. Background
/// revalidations register through [`InFlight::begin_revalidation`], which
/// admits one per key at a time.
#[derive(Default)]
pub struct InFlight {
    locks: Mutex<HashMap<String, KeyLock>>,
    revalidating: Arc<Mutex<HashSet<String>>>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, key: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            Arc::clone(locks.entry(key.to_string()).or_default())
        };
        lock.lock_owned().await
    }

    /// Claim the background revalidation slot for `key`.
    ///
    /// Returns `None` when a revalidation for the key is already running. The
    /// slot is released when the returned guard drops.
    pub fn begin_revalidation(&self, key: &str) -> Option<RevalidationGuard> {
        let mut running = self.revalidating.lock().unwrap_or_else(|e| e.into_inner());
        if !running.insert(key.to_string()) {
            return None;
        }
        Some(RevalidationGuard {
            key: key.to_string(),
            running: Arc::clone(&self.revalidating),
        })
    }

    pub fn is_revalidating(&self, key: &str) -> bool {
        self.revalidating
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(key)
    }
}

pub struct RevalidationGuard {
    key: String,
    running: Arc<Mutex<HashSet<String>>>,
}

impl Drop for RevalidationGuard {
    fn drop(&mut self) {
        self.running
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.key);
    }
}

//! Per-key async mutual exclusion.
//!
//! Each key gets its own `tokio::sync::Mutex`, created on first use and
//! dropped from the map once the last holder or waiter releases it.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug, Default)]
pub struct KeyedLocks {
    slots: DashMap<String, Arc<Mutex<()>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `key`.
    pub async fn lock(&self, key: String) -> KeyGuard<'_> {
        let slot = self.slots.entry(key.clone()).or_default().clone();
        let guard = slot.lock_owned().await;
        KeyGuard {
            owner: self,
            key,
            guard: Some(guard),
        }
    }

    /// Number of keys currently tracked.
    pub fn tracked(&self) -> usize {
        self.slots.len()
    }
}

/// Releases the key on drop.
#[derive(Debug)]
pub struct KeyGuard<'a> {
    owner: &'a KeyedLocks,
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for KeyGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.owner
            .slots
            .remove_if(&self.key, |_, slot| Arc::strong_count(slot) == 1);
    }
}

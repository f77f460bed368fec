//! Single-slot, time-expiring memo of the last flag read

use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use types::FlagValue;

#[derive(Debug, Clone)]
struct CacheEntry {
    key: String,
    value: FlagValue,
    expires_at: Instant,
}

/// Capacity-one flag cache.
///
/// Storing a second key evicts the first. Entries stop being returned once
/// their lifetime has elapsed. Concurrent misses may both write the slot;
/// the last writer wins.
#[derive(Debug)]
pub struct FlagCache {
    ttl: Duration,
    slot: RwLock<Option<CacheEntry>>,
}

impl FlagCache {
    /// Create an empty cache whose entries live for `ttl`
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: RwLock::new(None),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Live value cached under `key`
    pub async fn get(&self, key: &str) -> Option<FlagValue> {
        let slot = self.slot.read().await;
        match slot.as_ref() {
            Some(entry) if entry.key == key && Instant::now() < entry.expires_at => Some(entry.value),
            _ => None,
        }
    }

    pub async fn has(&self, key: &str) -> bool {
        self.get(key).await.is_some()
    }

    /// Store `value` under `key`, replacing whatever the slot held
    pub async fn set(&self, key: impl Into<String>, value: FlagValue) {
        let entry = CacheEntry {
            key: key.into(),
            value,
            expires_at: Instant::now() + self.ttl,
        };
        *self.slot.write().await = Some(entry);
    }

    pub async fn clear(&self) {
        *self.slot.write().await = None;
    }
}

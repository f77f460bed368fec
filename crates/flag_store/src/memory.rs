//! In-process flag store for tests and local development

use crate::store::FlagStore;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;
use types::{FlagValue, MaintenanceError, Provider, Result};

/// Flag store backed by a map, counting every read and write
#[derive(Debug)]
pub struct MemoryFlagStore {
    provider: Provider,
    values: RwLock<HashMap<String, bool>>,
    failure: RwLock<Option<String>>,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl MemoryFlagStore {
    /// Empty store reporting itself as `provider`
    pub fn new(provider: Provider) -> Self {
        Self {
            provider,
            values: RwLock::new(HashMap::new()),
            failure: RwLock::new(None),
            reads: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
        }
    }

    pub fn with_flag(mut self, key: impl Into<String>, value: bool) -> Self {
        self.values.get_mut().insert(key.into(), value);
        self
    }

    /// Make every following call fail with a fetch error
    pub async fn fail_with(&self, message: impl Into<String>) {
        *self.failure.write().await = Some(message.into());
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    async fn check_failure(&self) -> Result<()> {
        match self.failure.read().await.as_ref() {
            Some(message) => Err(MaintenanceError::Fetch(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl FlagStore for MemoryFlagStore {
    async fn get_flag(&self, key: &str) -> Result<FlagValue> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.check_failure().await?;
        Ok(self.values.read().await.get(key).copied().into())
    }

    async fn set_flag(&self, key: &str, value: bool) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.check_failure().await?;
        self.values.write().await.insert(key.to_string(), value);
        Ok(())
    }

    fn provider(&self) -> Provider {
        self.provider
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reads_and_writes_are_counted() {
        let store = MemoryFlagStore::new(Provider::Upstash).with_flag("flag", false);

        assert_eq!(store.get_flag("flag").await.unwrap(), FlagValue::Set(false));
        assert_eq!(store.get_flag("other").await.unwrap(), FlagValue::Absent);
        store.set_flag("flag", true).await.unwrap();
        assert_eq!(store.get_flag("flag").await.unwrap(), FlagValue::Set(true));

        assert_eq!(store.reads(), 3);
        assert_eq!(store.writes(), 1);
    }

    #[tokio::test]
    async fn test_failure_mode() {
        let store = MemoryFlagStore::new(Provider::EdgeConfig);
        store.fail_with("connection reset").await;
        assert_eq!(
            store.get_flag("flag").await.unwrap_err(),
            MaintenanceError::Fetch("connection reset".to_string())
        );
    }
}

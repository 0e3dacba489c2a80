//! In-memory [`KvStore`] for tests and `backend = "memory"`.
//!
//! Uses a `BTreeMap` behind `std::sync::RwLock`, so `list` comes back sorted
//! without extra work.

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;

use super::KvStore;
use crate::error::KvError;

pub struct InMemoryKv {
    entries: RwLock<BTreeMap<String, String>>,
}

impl InMemoryKv {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
        }
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryKv {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned() -> KvError {
    KvError::Backend(anyhow::anyhow!("in-memory store lock poisoned"))
}

#[async_trait]
impl KvStore for InMemoryKv {
    fn backend_name(&self) -> &str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        Ok(entries.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), KvError> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), KvError> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries.remove(key);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<String>, KvError> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        Ok(entries.keys().cloned().collect())
    }
}

//! Key-value storage abstraction.
//!
//! The [`KvStore`] trait is the only persistence contract the record store
//! relies on: string keys mapped to JSON text blobs, with no transactions.
//! Backends:
//!
//! | Backend | Type | Use |
//! |---------|------|-----|
//! | `sqlite` | [`SqliteKv`] | durable single-file store |
//! | `memory` | [`InMemoryKv`] | tests, throwaway servers |
//! | `disabled` | [`DisabledKv`] | every call fails with [`KvError::Unavailable`] |
//!
//! Implementations must be `Send + Sync` to be shared across request handlers.

pub mod memory;
pub mod sqlite;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::config::StoreConfig;
use crate::error::KvError;

pub use memory::InMemoryKv;
pub use sqlite::SqliteKv;

#[async_trait]
pub trait KvStore: Send + Sync {
    /// Short backend label reported by the health endpoint.
    fn backend_name(&self) -> &str;

    async fn get(&self, key: &str) -> Result<Option<String>, KvError>;

    /// Insert or overwrite `key`.
    async fn put(&self, key: &str, value: &str) -> Result<(), KvError>;

    /// Remove `key`. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), KvError>;

    /// All keys, sorted ascending.
    async fn list(&self) -> Result<Vec<String>, KvError>;
}

/// Store used when `store.backend = "disabled"`.
pub struct DisabledKv;

const DISABLED_MESSAGE: &str = "KV storage is not configured";

#[async_trait]
impl KvStore for DisabledKv {
    fn backend_name(&self) -> &str {
        "disabled"
    }

    async fn get(&self, _key: &str) -> Result<Option<String>, KvError> {
        Err(KvError::Unavailable(DISABLED_MESSAGE.to_string()))
    }

    async fn put(&self, _key: &str, _value: &str) -> Result<(), KvError> {
        Err(KvError::Unavailable(DISABLED_MESSAGE.to_string()))
    }

    async fn delete(&self, _key: &str) -> Result<(), KvError> {
        Err(KvError::Unavailable(DISABLED_MESSAGE.to_string()))
    }

    async fn list(&self) -> Result<Vec<String>, KvError> {
        Err(KvError::Unavailable(DISABLED_MESSAGE.to_string()))
    }
}

/// Open the backend named in the configuration.
pub async fn open_store(config: &StoreConfig) -> Result<Arc<dyn KvStore>> {
    match config.backend.as_str() {
        "sqlite" => {
            let path = config
                .path
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("store.path required for sqlite backend"))?;
            Ok(Arc::new(SqliteKv::connect(path).await?))
        }
        "memory" => Ok(Arc::new(InMemoryKv::new())),
        "disabled" => Ok(Arc::new(DisabledKv)),
        other => anyhow::bail!("Unknown store backend: {}", other),
    }
}

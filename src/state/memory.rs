//! In-process state store.

use super::StateStore;
use crate::error::BotError;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Keeps records in a map for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemoryStore<T> {
    records: RwLock<HashMap<String, T>>,
}

impl<T> MemoryStore<T> {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored keys.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl<T> StateStore<T> for MemoryStore<T>
where
    T: Clone + Default + Send + Sync,
{
    async fn load(&self, key: &str) -> Result<T, BotError> {
        Ok(self
            .records
            .read()
            .await
            .get(key)
            .cloned()
            .unwrap_or_default())
    }

    async fn save(&self, key: &str, value: &T) -> Result<(), BotError> {
        self.records
            .write()
            .await
            .insert(key.to_string(), value.clone());
        Ok(())
    }
}

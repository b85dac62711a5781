//! In-memory [`KvStore`].
//!
//! Backs tests and ephemeral sessions. The update closure runs while the
//! map lock is held, which makes every update atomic.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::errors::Result;
use crate::kv::{KvStore, UpdateFn};

/// Process-local key-value store.
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryKvStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the store holds no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        let _ = self.entries.lock().insert(key.to_string(), value);
        Ok(())
    }

    async fn update(&self, key: &str, f: UpdateFn) -> Result<Option<Value>> {
        let mut entries = self.entries.lock();
        let previous = entries.get(key).cloned();
        match f(previous.clone())? {
            Some(next) => {
                let _ = entries.insert(key.to_string(), next);
            }
            None => {
                let _ = entries.remove(key);
            }
        }
        Ok(previous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::StoreError;
    use crate::kv::{get_json, update_json};
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn get_missing_is_none() {
        let store = MemoryKvStore::new();
        assert!(store.get("nope").await.unwrap().is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn set_then_get() {
        let store = MemoryKvStore::new();
        store.set("k", json!({"a": 1})).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(json!({"a": 1})));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn update_returns_previous_and_writes_next() {
        let store = MemoryKvStore::new();
        store.set("k", json!(1)).await.unwrap();
        let bump: UpdateFn = Box::new(|v| Ok(Some(json!(v.unwrap().as_i64().unwrap() + 1))));
        let prev = store.update("k", bump).await.unwrap();
        assert_eq!(prev, Some(json!(1)));
        assert_eq!(store.get("k").await.unwrap(), Some(json!(2)));
    }

    #[tokio::test]
    async fn update_none_deletes() {
        let store = MemoryKvStore::new();
        store.set("k", json!(1)).await.unwrap();
        let _ = store.update("k", Box::new(|_: Option<Value>| Ok(None))).await.unwrap();
        assert!(store.get("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn failed_update_writes_nothing() {
        let store = MemoryKvStore::new();
        store.set("k", json!(1)).await.unwrap();
        let err = store
            .update(
                "k",
                Box::new(|_: Option<Value>| Err(StoreError::InvalidData("nope".into()))),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidData(_)));
        assert_eq!(store.get("k").await.unwrap(), Some(json!(1)));
    }

    #[tokio::test]
    async fn typed_helpers_default_and_roundtrip() {
        let store = MemoryKvStore::new();
        let empty: Vec<u32> = get_json(&store, "list").await.unwrap();
        assert!(empty.is_empty());

        let len = update_json(&store, "list", |list: &mut Vec<u32>| {
            list.push(7);
            Ok(list.len())
        })
        .await
        .unwrap();
        assert_eq!(len, 1);

        let list: Vec<u32> = get_json(&store, "list").await.unwrap();
        assert_eq!(list, vec![7]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_updates_are_not_lost() {
        let store = Arc::new(MemoryKvStore::new());
        let mut handles = Vec::new();
        for i in 0..50_u32 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                update_json(store.as_ref(), "set", move |v: &mut Vec<u32>| {
                    v.push(i);
                    Ok(())
                })
                .await
                .unwrap();
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
        let all: Vec<u32> = get_json(store.as_ref(), "set").await.unwrap();
        assert_eq!(all.len(), 50);
    }
}

//! Key-value store seam.

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::oneshot;

use crate::errors::{Result, StoreError};

/// Read-modify-write step applied by [`KvStore::update`].
///
/// Receives the current value (`None` if absent) and returns the value to
/// store (`None` deletes the key). Returning an error aborts the update and
/// nothing is written.
pub type UpdateFn = Box<dyn FnOnce(Option<Value>) -> Result<Option<Value>> + Send + 'static>;

/// Asynchronous durable key-value store.
///
/// Implementations must run [`update`](Self::update) atomically with respect
/// to every other write of the same key: two concurrent updates of one key
/// observe each other's result rather than racing on a stale read.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Read a value.
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Overwrite a value.
    async fn set(&self, key: &str, value: Value) -> Result<()>;

    /// Atomically transform a value. Returns the value before the update.
    async fn update(&self, key: &str, f: UpdateFn) -> Result<Option<Value>>;
}

/// Read a typed value, falling back to `T::default()` when absent.
pub async fn get_json<T>(store: &dyn KvStore, key: &str) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    match store.get(key).await? {
        Some(value) => Ok(serde_json::from_value(value)?),
        None => Ok(T::default()),
    }
}

/// Typed atomic read-modify-write.
///
/// Decodes the stored value as `T` (default when absent), lets `f` mutate it
/// in place and writes it back, all inside one [`KvStore::update`]. The value
/// returned by `f` is passed back to the caller. If `f` fails, nothing is
/// written.
pub async fn update_json<T, R, F>(store: &dyn KvStore, key: &str, f: F) -> Result<R>
where
    T: DeserializeOwned + Serialize + Default + Send + 'static,
    R: Send + 'static,
    F: FnOnce(&mut T) -> Result<R> + Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    let _ = store
        .update(
            key,
            Box::new(move |current: Option<Value>| {
                let mut value: T = match current {
                    Some(v) => serde_json::from_value(v)?,
                    None => T::default(),
                };
                let out = f(&mut value)?;
                let encoded = serde_json::to_value(&value)?;
                let _ = tx.send(out);
                Ok(Some(encoded))
            }),
        )
        .await?;
    rx.await
        .map_err(|_| StoreError::Internal(format!("update of {key} produced no result")))
}

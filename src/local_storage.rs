//! String key/value store used as a client-side backup of orders, carts,
//! the admin session and language preferences.
//!
//! Values live in memory and, when a path is configured, every write is
//! flushed to a single JSON file (written to a temp file, then renamed).

use std::{collections::HashMap, io, path::PathBuf, sync::Arc};

use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;
use tokio::sync::Mutex;

pub mod keys {
    pub const ORDERS: &str = "mero-gamala-orders";
    pub const ADMIN_SESSION: &str = "mero-gamala-admin-session";
    pub const LANGUAGE: &str = "language";
    pub const HAS_VISITED: &str = "hasVisited";
    pub const LAST_LOGIN_ATTEMPT: &str = "last-login-attempt";

    const CART_PREFIX: &str = "mero-gamala-cart";

    pub fn cart(session: &uuid::Uuid) -> String {
        format!("{CART_PREFIX}:{session}")
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("local storage io error: {0}")]
    Io(#[from] io::Error),

    #[error("corrupted value under `{key}`: {source}")]
    Corrupted {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize value: {0}")]
    Serialize(#[source] serde_json::Error),
}

#[derive(Debug, Clone, Default)]
pub struct LocalStore {
    items: Arc<Mutex<HashMap<String, String>>>,
    path: Option<PathBuf>,
}

impl LocalStore {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Loads the store from `path`. A missing file starts empty; an
    /// unreadable one is logged and replaced on the next write.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let items = match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice::<HashMap<String, String>>(&bytes) {
                Ok(items) => items,
                Err(err) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %err,
                        "local storage file is corrupted, starting empty"
                    );
                    HashMap::new()
                }
            },
            Err(err) if err.kind() == io::ErrorKind::NotFound => HashMap::new(),
            Err(err) => return Err(err.into()),
        };

        tracing::debug!(path = %path.display(), keys = items.len(), "local storage loaded");
        Ok(Self {
            items: Arc::new(Mutex::new(items)),
            path: Some(path),
        })
    }

    pub async fn get_item(&self, key: &str) -> Option<String> {
        self.items.lock().await.get(key).cloned()
    }

    pub async fn set_item(&self, key: &str, value: impl Into<String>) -> Result<(), StorageError> {
        let mut items = self.items.lock().await;
        items.insert(key.to_string(), value.into());
        self.flush(&items).await
    }

    pub async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let mut items = self.items.lock().await;
        if items.remove(key).is_some() {
            self.flush(&items).await?;
        }
        Ok(())
    }

    /// Reads and rewrites `key` under a single lock. `update` sees the
    /// current value and returns the replacement, or `None` to leave it as
    /// is. Returns whether a value was written.
    pub async fn update_item<F>(&self, key: &str, update: F) -> Result<bool, StorageError>
    where
        F: FnOnce(Option<&str>) -> Option<String>,
    {
        let mut items = self.items.lock().await;
        let Some(value) = update(items.get(key).map(String::as_str)) else {
            return Ok(false);
        };
        items.insert(key.to_string(), value);
        self.flush(&items).await?;
        Ok(true)
    }

    /// Decodes the JSON stored under `key`. Absent keys are `Ok(None)`.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        let Some(raw) = self.get_item(key).await else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| StorageError::Corrupted {
                key: key.to_string(),
                source,
            })
    }

    pub async fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value).map_err(StorageError::Serialize)?;
        self.set_item(key, raw).await
    }

    async fn flush(&self, items: &HashMap<String, String>) -> Result<(), StorageError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let bytes = serde_json::to_vec_pretty(items).map_err(StorageError::Serialize)?;
        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }
}

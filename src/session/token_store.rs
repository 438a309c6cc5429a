//! Key-value persistence for the session token.
//!
//! # Responsibilities
//! - Async get/set/remove of string values by key
//! - Distinguish "store unavailable" (an error) from "value absent" (`Ok(None)`)
//!
//! # Implementations
//! - `MemoryTokenStore`: process-local, for tests and embedding
//! - `FileTokenStore`: JSON object on disk, used by the CLI
//! - `UnavailableTokenStore`: a host with no persistence at all

use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::Mutex;

/// Errors that can occur while talking to a token store.
#[derive(Debug, Error)]
pub enum TokenStoreError {
    /// The host has no usable persistence.
    #[error("token store unavailable: {0}")]
    Unavailable(String),

    #[error("token store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("token store data is corrupt: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Async string key-value store.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, TokenStoreError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), TokenStoreError>;
    async fn remove(&self, key: &str) -> Result<(), TokenStoreError>;
}

/// In-memory store.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    inner: DashMap<String, String>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn get(&self, key: &str) -> Result<Option<String>, TokenStoreError> {
        Ok(self.inner.get(key).map(|r| r.value().clone()))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), TokenStoreError> {
        self.inner.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), TokenStoreError> {
        self.inner.remove(key);
        Ok(())
    }
}

/// Store backed by a JSON object file. A missing file is an empty store.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<HashMap<String, String>, TokenStoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) if content.trim().is_empty() => Ok(HashMap::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, map: &HashMap<String, String>) -> Result<(), TokenStoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        // Write then rename so a crash never leaves a half-written file.
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(map)?).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn get(&self, key: &str) -> Result<Option<String>, TokenStoreError> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), TokenStoreError> {
        let _guard = self.lock.lock().await;
        let mut map = self.load().await?;
        map.insert(key.to_string(), value.to_string());
        self.save(&map).await
    }

    async fn remove(&self, key: &str) -> Result<(), TokenStoreError> {
        let _guard = self.lock.lock().await;
        let mut map = self.load().await?;
        if map.remove(key).is_some() {
            self.save(&map).await?;
        }
        Ok(())
    }
}

/// Store for hosts without persistence. Every call fails with `Unavailable`.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableTokenStore;

#[async_trait]
impl TokenStore for UnavailableTokenStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, TokenStoreError> {
        Err(TokenStoreError::Unavailable("no persistence".into()))
    }

    async fn set(&self, _key: &str, _value: &str) -> Result<(), TokenStoreError> {
        Err(TokenStoreError::Unavailable("no persistence".into()))
    }

    async fn remove(&self, _key: &str) -> Result<(), TokenStoreError> {
        Err(TokenStoreError::Unavailable("no persistence".into()))
    }
}

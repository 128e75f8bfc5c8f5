// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Credential persistence: one versioned JSON record per account.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::credential::TokenPair;
use crate::error::{Result, XoltaError};

/// Current on-disk record version.
pub const STORE_VERSION: u32 = 1;

/// Durable key-value storage for token pairs.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Load the pair stored under `key`. A missing record is an empty pair.
    async fn load(&self, key: &str) -> Result<TokenPair>;

    /// Replace the pair stored under `key`.
    async fn save(&self, key: &str, tokens: &TokenPair) -> Result<()>;
}

/// Persisted record wrapping the token pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredRecord {
    pub version: u32,
    pub key: String,
    pub data: TokenPair,
}

/// Stores each account as `<dir>/<key>.json`, written atomically.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

#[async_trait]
impl CredentialStore for FileStore {
    async fn load(&self, key: &str) -> Result<TokenPair> {
        let path = self.path_for(key);
        let contents = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no persisted credentials");
                return Ok(TokenPair::default());
            }
            Err(e) => return Err(XoltaError::Storage(format!("read {}: {e}", path.display()))),
        };
        let record: StoredRecord = serde_json::from_str(&contents)
            .map_err(|e| XoltaError::Storage(format!("parse {}: {e}", path.display())))?;
        if record.version != STORE_VERSION {
            return Err(XoltaError::Storage(format!(
                "unsupported record version {} in {}",
                record.version,
                path.display()
            )));
        }
        Ok(record.data)
    }

    async fn save(&self, key: &str, tokens: &TokenPair) -> Result<()> {
        let record =
            StoredRecord { version: STORE_VERSION, key: key.to_owned(), data: tokens.clone() };
        write_atomic(&self.path_for(key), &record)
            .map_err(|e| XoltaError::Storage(format!("{e:#}")))?;
        tracing::debug!(key, "persisted credentials");
        Ok(())
    }
}

/// Write a record to a JSON file atomically (write tmp + rename).
///
/// Uses a unique temp filename (PID + counter) so concurrent saves never share
/// a `.tmp` file.
fn write_atomic(path: &Path, record: &StoredRecord) -> anyhow::Result<()> {
    use std::sync::atomic::{AtomicU32, Ordering};
    static COUNTER: AtomicU32 = AtomicU32::new(0);

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(record)?;
    let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
    let tmp_name = format!(
        "{}.{}.{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy(),
        std::process::id(),
        seq,
    );
    let tmp_path = path.with_file_name(tmp_name);
    std::fs::write(&tmp_path, json)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

/// In-process store, for tests and for runs that must not touch disk.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, TokenPair>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate a record.
    pub async fn insert(&self, key: &str, tokens: TokenPair) {
        self.records.write().await.insert(key.to_owned(), tokens);
    }

    /// Current record, if any was saved.
    pub async fn get(&self, key: &str) -> Option<TokenPair> {
        self.records.read().await.get(key).cloned()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn load(&self, key: &str) -> Result<TokenPair> {
        Ok(self.records.read().await.get(key).cloned().unwrap_or_default())
    }

    async fn save(&self, key: &str, tokens: &TokenPair) -> Result<()> {
        self.records.write().await.insert(key.to_owned(), tokens.clone());
        Ok(())
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;

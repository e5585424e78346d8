use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::error::AppError;

/// A pending reset code. At most one exists per (normalised) email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetEntry {
    pub email: String,
    pub code: String,
    pub issued_at: DateTime<Utc>,
}

/// Keyed storage for reset entries. The registry is the only caller.
///
/// Implementations need no notion of expiry beyond [`purge_issued_before`]; the
/// registry decides whether an entry is still live.
///
/// [`purge_issued_before`]: ResetCodeStore::purge_issued_before
#[async_trait]
pub trait ResetCodeStore: Send + Sync {
    async fn get(&self, email: &str) -> Result<Option<ResetEntry>, AppError>;

    /// Inserts or overwrites the entry for `entry.email`.
    async fn set(&self, entry: ResetEntry) -> Result<(), AppError>;

    async fn delete(&self, email: &str) -> Result<(), AppError>;

    /// Deletes the entry only if it still holds `code`. Returns whether it deleted.
    async fn delete_if_code(&self, email: &str, code: &str) -> Result<bool, AppError>;

    /// Deletes every entry issued at or before `cutoff`. Returns how many were removed.
    async fn purge_issued_before(&self, cutoff: DateTime<Utc>) -> Result<usize, AppError>;
}

/// Process-memory store. Outstanding codes do not survive a restart.
#[derive(Default)]
pub struct InMemoryResetCodeStore {
    entries: RwLock<HashMap<String, ResetEntry>>,
}

impl InMemoryResetCodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl ResetCodeStore for InMemoryResetCodeStore {
    async fn get(&self, email: &str) -> Result<Option<ResetEntry>, AppError> {
        Ok(self.entries.read().await.get(email).cloned())
    }

    async fn set(&self, entry: ResetEntry) -> Result<(), AppError> {
        self.entries.write().await.insert(entry.email.clone(), entry);
        Ok(())
    }

    async fn delete(&self, email: &str) -> Result<(), AppError> {
        self.entries.write().await.remove(email);
        Ok(())
    }

    async fn delete_if_code(&self, email: &str, code: &str) -> Result<bool, AppError> {
        let mut entries = self.entries.write().await;
        match entries.get(email) {
            Some(entry) if entry.code == code => {
                entries.remove(email);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn purge_issued_before(&self, cutoff: DateTime<Utc>) -> Result<usize, AppError> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.issued_at > cutoff);
        Ok(before - entries.len())
    }
}

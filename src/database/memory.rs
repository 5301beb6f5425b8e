use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

use super::manager::DatabaseError;
use super::models::{Key, KeyWithWorkspace, Workspace};
use super::store::{KeyStore, KeyTransaction};

#[derive(Default)]
struct Tables {
    workspaces: HashMap<String, Workspace>,
    keys: HashMap<String, Key>,
}

/// In-process key store for tests and local runs without Postgres.
///
/// Transactions stage their writes and apply them to the shared tables in one
/// step on commit.
#[derive(Clone, Default)]
pub struct MemoryKeyStore {
    tables: Arc<Mutex<Tables>>,
    fail_commits: Arc<AtomicBool>,
}

impl MemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_workspace(&self, id: &str, tenant_id: &str) {
        self.tables.lock().await.workspaces.insert(
            id.to_string(),
            Workspace {
                id: id.to_string(),
                tenant_id: tenant_id.to_string(),
            },
        );
    }

    pub async fn insert_key(&self, key: Key) {
        self.tables.lock().await.keys.insert(key.id.clone(), key);
    }

    pub async fn get_key(&self, id: &str) -> Option<Key> {
        self.tables.lock().await.keys.get(id).cloned()
    }

    /// Make every subsequent commit fail, as a lost connection would
    pub fn fail_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl KeyStore for MemoryKeyStore {
    async fn find_active_key(&self, key_id: &str) -> Result<Option<KeyWithWorkspace>, DatabaseError> {
        let tables = self.tables.lock().await;
        let Some(key) = tables.keys.get(key_id).filter(|k| k.is_active()) else {
            return Ok(None);
        };
        // Same as the inner join: a key without its workspace row is not found
        let Some(workspace) = tables.workspaces.get(&key.workspace_id).cloned() else {
            return Ok(None);
        };

        Ok(Some(KeyWithWorkspace {
            key: key.clone(),
            workspace,
        }))
    }

    async fn begin(&self) -> Result<Box<dyn KeyTransaction>, DatabaseError> {
        Ok(Box::new(MemoryKeyTransaction {
            store: self.clone(),
            staged: Vec::new(),
        }))
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}

struct StagedUpdate {
    key_id: String,
    deleted_at: DateTime<Utc>,
    enabled: bool,
}

struct MemoryKeyTransaction {
    store: MemoryKeyStore,
    staged: Vec<StagedUpdate>,
}

#[async_trait]
impl KeyTransaction for MemoryKeyTransaction {
    async fn update_deleted_at(
        &mut self,
        key_id: &str,
        deleted_at: DateTime<Utc>,
        enabled: bool,
    ) -> Result<u64, DatabaseError> {
        if !self.store.tables.lock().await.keys.contains_key(key_id) {
            return Ok(0);
        }
        self.staged.push(StagedUpdate {
            key_id: key_id.to_string(),
            deleted_at,
            enabled,
        });
        Ok(1)
    }

    async fn commit(self: Box<Self>) -> Result<(), DatabaseError> {
        let MemoryKeyTransaction { store, staged } = *self;
        if store.fail_commits.load(Ordering::SeqCst) {
            return Err(DatabaseError::QueryError("commit failed: connection reset".to_string()));
        }

        let mut tables = store.tables.lock().await;
        for update in staged {
            if let Some(key) = tables.keys.get_mut(&update.key_id) {
                key.deleted_at = Some(update.deleted_at);
                key.enabled = update.enabled;
            }
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), DatabaseError> {
        Ok(())
    }
}

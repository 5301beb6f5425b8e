use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;

use crate::audit::{AuditActor, AuditContext, AuditError, AuditLogEntry, AuditResource, AuditSink};
use crate::auth::CallerContext;
use crate::database::{DatabaseError, KeyStore, KeyTransaction};

pub const KEY_UPDATE_EVENT: &str = "key.update";

/// Body of `key.updateDeletedAt`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDeletedAtInput {
    pub key_id: String,
    pub deleted_at: DateTime<Utc>,
    pub enabled: bool,
}

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("Invalid {field}: {message}")]
    Validation { field: &'static str, message: String },

    /// Missing, already deleted, or owned by another tenant. Deliberately one case.
    #[error("Key not found")]
    NotFound,

    #[error("Key lookup failed: {0}")]
    Lookup(#[source] DatabaseError),

    #[error("Key write failed: {0}")]
    Write(#[source] DatabaseError),

    #[error(transparent)]
    Audit(#[from] AuditError),
}

pub struct KeyService {
    store: Arc<dyn KeyStore>,
    audit: Arc<dyn AuditSink>,
}

impl KeyService {
    pub fn new(store: Arc<dyn KeyStore>, audit: Arc<dyn AuditSink>) -> Self {
        Self { store, audit }
    }

    /// Set a key's deletion timestamp and enabled flag, audited.
    ///
    /// Only keys that are currently active and belong to the caller's tenant
    /// are eligible. The row update and the audit entry commit together or
    /// not at all.
    pub async fn update_deleted_at(
        &self,
        caller: &CallerContext,
        input: UpdateDeletedAtInput,
    ) -> Result<(), KeyError> {
        if input.key_id.is_empty() {
            return Err(KeyError::Validation {
                field: "keyId",
                message: "must not be empty".to_string(),
            });
        }

        let found = self
            .store
            .find_active_key(&input.key_id)
            .await
            .map_err(KeyError::Lookup)?;

        let key = match found {
            Some(key) if key.tenant_id() == caller.tenant_id => key,
            Some(_) => {
                tracing::warn!(
                    "Tenant {} attempted to update key {} owned by another tenant",
                    caller.tenant_id,
                    input.key_id
                );
                return Err(KeyError::NotFound);
            }
            None => {
                tracing::debug!("No active key {} for tenant {}", input.key_id, caller.tenant_id);
                return Err(KeyError::NotFound);
            }
        };

        let mut tx = self.store.begin().await.map_err(KeyError::Write)?;

        let updated = tx
            .update_deleted_at(&key.key.id, input.deleted_at, input.enabled)
            .await;
        match updated {
            Ok(0) => {
                abort(tx).await;
                return Err(KeyError::Write(DatabaseError::NotFound(format!("key {}", key.key.id))));
            }
            Ok(_) => {}
            Err(e) => {
                abort(tx).await;
                return Err(KeyError::Write(e));
            }
        }

        let entry = AuditLogEntry::new(
            key.workspace.id.clone(),
            AuditActor::user(caller.user_id.clone()),
            KEY_UPDATE_EVENT,
            deletion_description(&key.key.id, input.deleted_at),
            vec![AuditResource::key(key.key.id.clone())],
            AuditContext::from(&caller.audit),
        );

        if let Err(e) = self.audit.ingest(entry).await {
            abort(tx).await;
            return Err(KeyError::Audit(e));
        }

        tx.commit().await.map_err(KeyError::Write)?;

        tracing::info!(
            "Key {} deleted_at set to {} (enabled={}) by user {}",
            key.key.id,
            input.deleted_at.to_rfc3339(),
            input.enabled,
            caller.user_id
        );
        Ok(())
    }
}

/// Roll back a transaction whose result is already an error
async fn abort(tx: Box<dyn KeyTransaction>) {
    if let Err(e) = tx.rollback().await {
        tracing::error!("Rollback failed: {}", e);
    }
}

/// e.g. `Changed the deletion date of k1 to Mon, 01 Jan 2024 00:00:00 GMT`
pub fn deletion_description(key_id: &str, deleted_at: DateTime<Utc>) -> String {
    format!(
        "Changed the deletion date of {} to {}",
        key_id,
        deleted_at.format("%a, %d %b %Y %H:%M:%S GMT")
    )
}

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Row, Transaction};

use super::manager::{DatabaseError, DatabaseManager};
use super::models::{Key, KeyWithWorkspace, Workspace};
use super::store::{KeyStore, KeyTransaction};

/// Postgres-backed key store. Tables are defined in `sql/schema.sql`.
pub struct PgKeyStore {
    db: DatabaseManager,
}

impl PgKeyStore {
    pub fn new(db: DatabaseManager) -> Self {
        Self { db }
    }

    fn pool(&self) -> &PgPool {
        self.db.pool()
    }
}

#[async_trait]
impl KeyStore for PgKeyStore {
    async fn find_active_key(&self, key_id: &str) -> Result<Option<KeyWithWorkspace>, DatabaseError> {
        let query = r#"
            SELECT
                k.id, k.workspace_id, k.enabled, k.deleted_at,
                w.tenant_id
            FROM keys k
            JOIN workspaces w ON w.id = k.workspace_id
            WHERE k.id = $1
            AND k.deleted_at IS NULL
            LIMIT 1
        "#;

        let row = sqlx::query(query)
            .bind(key_id)
            .fetch_optional(self.pool())
            .await?;

        Ok(row.map(|row| {
            let workspace_id: String = row.get("workspace_id");
            KeyWithWorkspace {
                key: Key {
                    id: row.get("id"),
                    workspace_id: workspace_id.clone(),
                    enabled: row.get("enabled"),
                    deleted_at: row.get("deleted_at"),
                },
                workspace: Workspace {
                    id: workspace_id,
                    tenant_id: row.get("tenant_id"),
                },
            }
        }))
    }

    async fn begin(&self) -> Result<Box<dyn KeyTransaction>, DatabaseError> {
        let tx = self.pool().begin().await?;
        Ok(Box::new(PgKeyTransaction { tx }))
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        self.db.health_check().await
    }
}

struct PgKeyTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl KeyTransaction for PgKeyTransaction {
    async fn update_deleted_at(
        &mut self,
        key_id: &str,
        deleted_at: DateTime<Utc>,
        enabled: bool,
    ) -> Result<u64, DatabaseError> {
        let result = sqlx::query("UPDATE keys SET deleted_at = $1, enabled = $2 WHERE id = $3")
            .bind(deleted_at)
            .bind(enabled)
            .bind(key_id)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected())
    }

    async fn commit(self: Box<Self>) -> Result<(), DatabaseError> {
        let PgKeyTransaction { tx } = *self;
        tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), DatabaseError> {
        let PgKeyTransaction { tx } = *self;
        tx.rollback().await?;
        Ok(())
    }
}

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::manager::DatabaseError;
use super::models::KeyWithWorkspace;

/// Persistence seam for key records.
#[async_trait]
pub trait KeyStore: Send + Sync {
    /// Point lookup of a key that is not deleted, joined with its workspace
    async fn find_active_key(&self, key_id: &str) -> Result<Option<KeyWithWorkspace>, DatabaseError>;

    /// Open a transaction; nothing written through it is visible until commit
    async fn begin(&self) -> Result<Box<dyn KeyTransaction>, DatabaseError>;

    async fn ping(&self) -> Result<(), DatabaseError>;
}

/// Open write scope. Dropping it without commit discards its writes.
#[async_trait]
pub trait KeyTransaction: Send {
    /// Returns the number of rows matched by `key_id`
    async fn update_deleted_at(
        &mut self,
        key_id: &str,
        deleted_at: DateTime<Utc>,
        enabled: bool,
    ) -> Result<u64, DatabaseError>;

    async fn commit(self: Box<Self>) -> Result<(), DatabaseError>;

    async fn rollback(self: Box<Self>) -> Result<(), DatabaseError>;
}

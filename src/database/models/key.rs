use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::workspace::Workspace;

/// API key row. A non-null `deleted_at` marks the key as deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Key {
    pub id: String,
    pub workspace_id: String,
    pub enabled: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Key {
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

/// Key joined with the workspace that owns it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyWithWorkspace {
    pub key: Key,
    pub workspace: Workspace,
}

impl KeyWithWorkspace {
    /// A key's tenant is always its workspace's tenant
    pub fn tenant_id(&self) -> &str {
        &self.workspace.tenant_id
    }
}

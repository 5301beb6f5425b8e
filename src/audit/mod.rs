//! Audit log entries and the sinks that deliver them.
//!
//! Entries are built by the services that change state and handed to an
//! [`AuditSink`] inside the same transaction scope as the change, so a
//! failed delivery can abort the write.

pub mod http;
pub mod log;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::auth::AuditMetadata;

pub use self::http::HttpAuditSink;
pub use self::log::TracingAuditSink;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Audit sink unreachable: {0}")]
    Transport(String),

    #[error("Audit sink timed out")]
    Timeout,

    #[error("Audit sink rejected entry with status {status}")]
    Rejected { status: u16 },

    #[error("Audit sink misconfigured: {0}")]
    Config(String),
}

impl From<reqwest::Error> for AuditError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AuditError::Timeout
        } else if let Some(status) = err.status() {
            AuditError::Rejected { status: status.as_u16() }
        } else {
            AuditError::Transport(err.to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditActor {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
}

impl AuditActor {
    pub fn user(id: impl Into<String>) -> Self {
        Self {
            kind: "user".to_string(),
            id: id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditResource {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
}

impl AuditResource {
    pub fn key(id: impl Into<String>) -> Self {
        Self {
            kind: "key".to_string(),
            id: id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditContext {
    pub location: String,
    pub user_agent: Option<String>,
}

impl From<&AuditMetadata> for AuditContext {
    fn from(meta: &AuditMetadata) -> Self {
        Self {
            location: meta.location.clone(),
            user_agent: meta.user_agent.clone(),
        }
    }
}

/// One state change, as delivered to the audit sink
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
    pub audit_log_id: Uuid,
    pub workspace_id: String,
    pub actor: AuditActor,
    pub event: String,
    pub description: String,
    pub resources: Vec<AuditResource>,
    pub context: AuditContext,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub time: DateTime<Utc>,
}

impl AuditLogEntry {
    pub fn new(
        workspace_id: impl Into<String>,
        actor: AuditActor,
        event: impl Into<String>,
        description: impl Into<String>,
        resources: Vec<AuditResource>,
        context: AuditContext,
    ) -> Self {
        Self {
            audit_log_id: Uuid::new_v4(),
            workspace_id: workspace_id.into(),
            actor,
            event: event.into(),
            description: description.into(),
            resources,
            context,
            time: Utc::now(),
        }
    }
}

/// Destination for audit entries. An `Err` means the entry was not recorded.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn ingest(&self, entry: AuditLogEntry) -> Result<(), AuditError>;
}

use async_trait::async_trait;

use super::{AuditError, AuditLogEntry, AuditSink};

/// Development sink: writes entries to the tracing log and never fails
#[derive(Debug, Default)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn ingest(&self, entry: AuditLogEntry) -> Result<(), AuditError> {
        tracing::info!(
            audit_log_id = %entry.audit_log_id,
            workspace_id = %entry.workspace_id,
            actor = %entry.actor.id,
            event = %entry.event,
            location = %entry.context.location,
            "{}",
            entry.description
        );
        Ok(())
    }
}

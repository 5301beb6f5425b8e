use async_trait::async_trait;
use std::time::Duration;

use super::{AuditError, AuditLogEntry, AuditSink};

/// Posts each entry as JSON to an external ingestion endpoint
pub struct HttpAuditSink {
    client: reqwest::Client,
    endpoint: url::Url,
    token: Option<String>,
}

impl HttpAuditSink {
    pub fn new(endpoint: &str, token: Option<String>, timeout: Duration) -> Result<Self, AuditError> {
        let endpoint = url::Url::parse(endpoint).map_err(|e| AuditError::Config(e.to_string()))?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AuditError::Config(e.to_string()))?;

        Ok(Self {
            client,
            endpoint,
            token,
        })
    }
}

#[async_trait]
impl AuditSink for HttpAuditSink {
    async fn ingest(&self, entry: AuditLogEntry) -> Result<(), AuditError> {
        let mut request = self.client.post(self.endpoint.clone()).json(&entry);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            tracing::warn!(
                "Audit sink rejected {} for {}: {}",
                entry.event,
                entry.workspace_id,
                status
            );
            return Err(AuditError::Rejected { status: status.as_u16() });
        }

        tracing::debug!("Audit entry {} delivered", entry.audit_log_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_endpoint() {
        let err = HttpAuditSink::new("::not-a-url", None, Duration::from_secs(1)).err();
        assert!(matches!(err, Some(AuditError::Config(_))));
    }
}

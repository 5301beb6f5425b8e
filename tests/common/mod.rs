#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use tokio::sync::Mutex;
use tower::ServiceExt;

use keyvault_api::app::{app, AppState};
use keyvault_api::audit::{AuditError, AuditLogEntry, AuditSink};
use keyvault_api::auth::{generate_jwt, Claims, JwtAuthenticator};
use keyvault_api::database::models::Key;
use keyvault_api::database::MemoryKeyStore;

pub const SECRET: &str = "integration-test-secret";

/// Sink that keeps every entry, or refuses all of them
#[derive(Default)]
pub struct RecordingSink {
    pub entries: Mutex<Vec<AuditLogEntry>>,
    pub fail: bool,
}

impl RecordingSink {
    pub fn failing() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            fail: true,
        }
    }
}

#[async_trait]
impl AuditSink for RecordingSink {
    async fn ingest(&self, entry: AuditLogEntry) -> Result<(), AuditError> {
        if self.fail {
            return Err(AuditError::Rejected { status: 503 });
        }
        self.entries.lock().await.push(entry);
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: MemoryKeyStore,
    pub sink: Arc<RecordingSink>,
}

pub fn jan_first() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

/// Tenants t1/t2; k1 active in t1, k2 active in t2, k3 already deleted in t1
pub async fn seeded_app(sink: RecordingSink) -> TestApp {
    let store = MemoryKeyStore::new();
    store.insert_workspace("ws_1", "t1").await;
    store.insert_workspace("ws_2", "t2").await;
    for (id, ws, deleted_at) in [
        ("k1", "ws_1", None),
        ("k2", "ws_2", None),
        ("k3", "ws_1", Some(jan_first())),
    ] {
        store
            .insert_key(Key {
                id: id.to_string(),
                workspace_id: ws.to_string(),
                enabled: true,
                deleted_at,
            })
            .await;
    }

    let sink = Arc::new(sink);
    let state = AppState::new(
        Arc::new(store.clone()),
        sink.clone(),
        Arc::new(JwtAuthenticator::new(SECRET)),
    );

    TestApp {
        router: app(state),
        store,
        sink,
    }
}

pub fn token_for(tenant: &str, user: &str) -> String {
    generate_jwt(&Claims::new(tenant.to_string(), user.to_string(), 1), SECRET).unwrap()
}

pub async fn call_update(router: &Router, token: Option<&str>, body: Value) -> (StatusCode, Value) {
    let mut request = Request::builder()
        .method("POST")
        .uri("/trpc/key.updateDeletedAt")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::USER_AGENT, "keyvault-tests/1.0")
        .header("x-forwarded-for", "203.0.113.7");
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = request.body(Body::from(body.to_string())).unwrap();

    send(router, request).await
}

pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

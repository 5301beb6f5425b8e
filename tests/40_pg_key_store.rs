//! Runs `KeyService` over `PgKeyStore`. Needs a Postgres reachable through
//! `DATABASE_URL`; skipped when it is unset.

mod common;

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::Row;
use tokio::sync::OnceCell;

use common::{jan_first, RecordingSink};
use keyvault_api::auth::{AuditMetadata, CallerContext};
use keyvault_api::config::DatabaseConfig;
use keyvault_api::database::{DatabaseManager, PgKeyStore};
use keyvault_api::services::key_service::{KeyError, KeyService, UpdateDeletedAtInput};

const SCHEMA: &str = include_str!("../sql/schema.sql");

// CREATE ... IF NOT EXISTS is not safe to run concurrently
static SCHEMA_APPLIED: OnceCell<()> = OnceCell::const_new();

struct Fixture {
    db: DatabaseManager,
    run: String,
}

impl Fixture {
    fn id(&self, name: &str) -> String {
        format!("{}_{}", name, self.run)
    }

    fn caller(&self, tenant: &str) -> CallerContext {
        CallerContext {
            user_id: "user_1".to_string(),
            tenant_id: self.id(tenant),
            audit: AuditMetadata {
                location: "203.0.113.7".to_string(),
                user_agent: Some("keyvault-tests/1.0".to_string()),
            },
        }
    }

    fn input(&self, key: &str) -> UpdateDeletedAtInput {
        UpdateDeletedAtInput {
            key_id: self.id(key),
            deleted_at: jan_first(),
            enabled: false,
        }
    }

    fn service(&self, sink: RecordingSink) -> KeyService {
        KeyService::new(Arc::new(PgKeyStore::new(self.db.clone())), Arc::new(sink))
    }

    async fn row(&self, key: &str) -> Result<(Option<DateTime<Utc>>, bool)> {
        let row = sqlx::query("SELECT deleted_at, enabled FROM keys WHERE id = $1")
            .bind(self.id(key))
            .fetch_one(self.db.pool())
            .await?;
        Ok((row.get("deleted_at"), row.get("enabled")))
    }
}

/// Applies the schema and seeds rows under ids unique to this run:
/// k1 active in t1, k2 active in t2, k3 already deleted in t1
async fn fixture() -> Result<Option<Fixture>> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set; skipping Postgres key store tests");
        return Ok(None);
    };

    let db = DatabaseManager::connect(&DatabaseConfig {
        url: Some(url),
        max_connections: 2,
        connection_timeout: 5,
    })
    .await
    .context("failed to connect to DATABASE_URL")?;

    SCHEMA_APPLIED
        .get_or_try_init(|| async {
            for statement in SCHEMA.split(';').map(str::trim).filter(|s| !s.is_empty()) {
                sqlx::query(statement).execute(db.pool()).await?;
            }
            Ok::<_, sqlx::Error>(())
        })
        .await?;

    let fixture = Fixture {
        db,
        run: uuid::Uuid::new_v4().simple().to_string(),
    };

    for (ws, tenant) in [("ws_1", "t1"), ("ws_2", "t2")] {
        sqlx::query("INSERT INTO workspaces (id, tenant_id) VALUES ($1, $2)")
            .bind(fixture.id(ws))
            .bind(fixture.id(tenant))
            .execute(fixture.db.pool())
            .await?;
    }
    for (key, ws, deleted_at) in [
        ("k1", "ws_1", None),
        ("k2", "ws_2", None),
        ("k3", "ws_1", Some(jan_first())),
    ] {
        sqlx::query("INSERT INTO keys (id, workspace_id, enabled, deleted_at) VALUES ($1, $2, true, $3)")
            .bind(fixture.id(key))
            .bind(fixture.id(ws))
            .bind(deleted_at)
            .execute(fixture.db.pool())
            .await?;
    }

    Ok(Some(fixture))
}

#[tokio::test]
async fn audit_failure_rolls_back_the_row() -> Result<()> {
    let Some(fx) = fixture().await? else { return Ok(()) };

    let result = fx
        .service(RecordingSink::failing())
        .update_deleted_at(&fx.caller("t1"), fx.input("k1"))
        .await;

    assert!(matches!(result, Err(KeyError::Audit(_))));
    assert_eq!(fx.row("k1").await?, (None, true));
    Ok(())
}

#[tokio::test]
async fn foreign_and_deleted_keys_are_not_found() -> Result<()> {
    let Some(fx) = fixture().await? else { return Ok(()) };
    let service = fx.service(RecordingSink::default());

    let foreign = service.update_deleted_at(&fx.caller("t1"), fx.input("k2")).await;
    assert!(matches!(foreign, Err(KeyError::NotFound)));
    assert_eq!(fx.row("k2").await?, (None, true));

    let deleted = service.update_deleted_at(&fx.caller("t1"), fx.input("k3")).await;
    assert!(matches!(deleted, Err(KeyError::NotFound)));
    Ok(())
}

#[tokio::test]
async fn commits_row_and_second_call_is_not_found() -> Result<()> {
    let Some(fx) = fixture().await? else { return Ok(()) };
    let service = fx.service(RecordingSink::default());

    service.update_deleted_at(&fx.caller("t1"), fx.input("k1")).await?;
    assert_eq!(fx.row("k1").await?, (Some(jan_first()), false));

    let again = service.update_deleted_at(&fx.caller("t1"), fx.input("k1")).await;
    assert!(matches!(again, Err(KeyError::NotFound)));
    Ok(())
}

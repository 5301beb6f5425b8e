use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use keyvault_api::app::{app, cors_layer, AppState};
use keyvault_api::audit::{AuditSink, HttpAuditSink, TracingAuditSink};
use keyvault_api::auth::JwtAuthenticator;
use keyvault_api::config::{self, Environment};
use keyvault_api::database::{DatabaseManager, KeyStore, MemoryKeyStore, PgKeyStore};

#[derive(Parser)]
#[command(name = "keyvault-api")]
#[command(about = "Keyvault API server")]
#[command(version)]
struct Args {
    // The store starts with no keys, so every key procedure answers NOT_FOUND
    #[arg(
        long,
        help = "Serve from an empty in-memory store instead of Postgres, for checking / and /health (development only)"
    )]
    memory: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let config = config::config();
    config.validate().context("invalid configuration")?;
    tracing::info!("Starting Keyvault API in {:?} mode", config.environment);

    let mut db = None;
    let store: Arc<dyn KeyStore> = if args.memory {
        anyhow::ensure!(
            config.environment == Environment::Development,
            "--memory is only allowed in development"
        );
        tracing::warn!("Using in-memory key store; data is lost on exit");
        Arc::new(MemoryKeyStore::new())
    } else {
        let manager = DatabaseManager::connect(&config.database)
            .await
            .context("failed to connect to database")?;
        db = Some(manager.clone());
        Arc::new(PgKeyStore::new(manager))
    };

    let audit: Arc<dyn AuditSink> = match &config.audit.sink_url {
        Some(url) => Arc::new(
            HttpAuditSink::new(url, config.audit.sink_token.clone(), config.audit.timeout())
                .context("failed to build audit sink")?,
        ),
        None => {
            tracing::warn!("AUDIT_SINK_URL not set; audit entries go to the log only");
            Arc::new(TracingAuditSink)
        }
    };

    let authenticator = Arc::new(JwtAuthenticator::new(config.security.jwt_secret.clone()));

    let mut router = app(AppState::new(store, audit, authenticator));
    if config.security.enable_cors {
        router = router.layer(cors_layer(&config.security));
    }

    let bind_addr = format!("{}:{}", config.api.bind_addr, config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Keyvault API listening on http://{}", bind_addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if let Some(db) = db {
        db.close().await;
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn memory_flag_help_says_store_is_empty() {
        Args::command().debug_assert();
        let help = Args::command().render_help().to_string();
        assert!(help.contains("empty in-memory store"));
        assert!(help.contains("/health"));
    }
}

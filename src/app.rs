use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::audit::AuditSink;
use crate::auth::Authenticator;
use crate::config::SecurityConfig;
use crate::database::KeyStore;
use crate::handlers;
use crate::middleware::require_caller;
use crate::services::KeyService;

/// Shared handler dependencies, cloned into every request
#[derive(Clone)]
pub struct AppState {
    pub keys: Arc<KeyService>,
    pub store: Arc<dyn KeyStore>,
    pub authenticator: Arc<dyn Authenticator>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn KeyStore>,
        audit: Arc<dyn AuditSink>,
        authenticator: Arc<dyn Authenticator>,
    ) -> Self {
        Self {
            keys: Arc::new(KeyService::new(store.clone(), audit)),
            store,
            authenticator,
        }
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        // Public
        .route("/", get(handlers::public::root))
        .route("/health", get(handlers::public::health))
        // Protected procedures
        .merge(key_routes(state.clone()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn key_routes(state: AppState) -> Router<AppState> {
    use handlers::protected::key;

    Router::new()
        .route("/trpc/key.updateDeletedAt", post(key::update_deleted_at))
        .route_layer(middleware::from_fn_with_state(state, require_caller))
}

/// CORS policy limited to the configured origins
pub fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

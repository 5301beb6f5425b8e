use axum::response::Json;
use serde_json::{json, Value};

/// GET / - Service description
pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Keyvault API",
            "version": version,
            "description": "Multi-tenant API key management",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "key.updateDeletedAt": "POST /trpc/key.updateDeletedAt (protected)",
            }
        }
    }))
}

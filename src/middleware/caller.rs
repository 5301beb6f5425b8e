use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::app::AppState;
use crate::error::ApiError;

/// Resolves the caller through the configured authenticator and injects the
/// resulting `CallerContext` into request extensions.
pub async fn require_caller(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let caller = state.authenticator.authenticate(request.headers()).await?;

    tracing::debug!("Authenticated user {} in tenant {}", caller.user_id, caller.tenant_id);

    request.extensions_mut().insert(caller);
    Ok(next.run(request).await)
}

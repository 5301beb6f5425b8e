// handlers/protected/key/update_deleted_at.rs - POST /trpc/key.updateDeletedAt handler

use axum::{
    extract::{rejection::JsonRejection, Extension, State},
    Json,
};

use crate::app::AppState;
use crate::auth::CallerContext;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::UpdateDeletedAtInput;

/// POST /trpc/key.updateDeletedAt - Soft delete a key, or schedule its deletion
///
/// Expected Input:
/// ```json
/// { "keyId": "key_123", "deletedAt": "2024-01-01T00:00:00Z", "enabled": false }
/// ```
///
/// Expected Output:
/// ```json
/// { "success": true, "data": true }
/// ```
///
/// Keys that do not exist, are already deleted, or belong to another tenant
/// all answer `NOT_FOUND`.
pub async fn update_deleted_at(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    payload: Result<Json<UpdateDeletedAtInput>, JsonRejection>,
) -> ApiResult<bool> {
    let Json(input) = payload?;

    state.keys.update_deleted_at(&caller, input).await?;

    Ok(ApiResponse::success(true))
}

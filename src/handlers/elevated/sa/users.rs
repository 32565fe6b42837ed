// handlers/elevated/sa/users.rs - PATCH /api/sa/users handler

use axum::extract::State;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;
use validator::Validate;

use crate::api::JsonOrForm;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SetSuperAdminRequest {
    pub user_id: Uuid,
    pub is_super_admin: bool,
}

/**
 * PATCH /api/sa/users - Grant or revoke super-admin privileges
 *
 * Expected Input:
 * ```json
 * { "userId": "uuid", "isSuperAdmin": true }
 * ```
 *
 * 400 when targeting yourself, 404 for an unknown user. Every change is
 * recorded in the audit log.
 */
pub async fn sa_users_patch(
    State(state): State<AppState>,
    user: CurrentUser,
    payload: JsonOrForm<SetSuperAdminRequest>,
) -> ApiResult<Value> {
    let admin = state.admin();
    admin.require_super_admin(user.id).await?;

    let request = payload.value;
    let profile = admin
        .set_super_admin(user.id, request.user_id, request.is_super_admin)
        .await?;
    Ok(ApiResponse::success(json!({ "ok": true, "profile": profile })))
}

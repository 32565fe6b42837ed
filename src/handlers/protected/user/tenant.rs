// handlers/protected/user/tenant.rs - GET /api/user/tenant handler

use axum::extract::State;
use serde_json::{json, Value};

use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::state::AppState;

/**
 * GET /api/user/tenant - Tenant of the caller's most recent membership
 *
 * ```json
 * { "tenant": { "id": "...", "name": "...", "slug": "...", "domain": null },
 *   "membership": { "id": "...", "role": "owner" } }
 * ```
 */
pub async fn user_tenant(State(state): State<AppState>, user: CurrentUser) -> ApiResult<Value> {
    let current = state.tenants().current_for_user(user.id).await?;
    Ok(ApiResponse::success(json!({
        "tenant": current.tenant,
        "membership": {
            "id": current.membership.id,
            "role": current.membership.role
        }
    })))
}

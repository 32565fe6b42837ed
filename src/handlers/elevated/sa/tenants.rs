// handlers/elevated/sa/tenants.rs - GET /api/sa/tenants handler

use axum::extract::State;
use serde_json::{json, Value};

use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::state::AppState;

/// Every tenant on the platform, newest first
pub async fn sa_tenants(State(state): State<AppState>, user: CurrentUser) -> ApiResult<Value> {
    let admin = state.admin();
    admin.require_super_admin(user.id).await?;

    let tenants = admin.list_tenants().await?;
    Ok(ApiResponse::success(json!({ "tenants": tenants })))
}

// handlers/protected/user/memberships.rs - GET /api/user/memberships handler

use axum::extract::State;
use serde_json::{json, Value};

use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::state::AppState;

pub async fn user_memberships(State(state): State<AppState>, user: CurrentUser) -> ApiResult<Value> {
    let memberships = state.tenants().memberships(user.id).await?;
    Ok(ApiResponse::success(json!({ "memberships": memberships })))
}

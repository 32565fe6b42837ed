// handlers/protected/user/profile.rs - GET/POST /api/user/profile handlers

use axum::extract::State;
use serde_json::{json, Value};

use crate::database::models::{ProfileUpsert, UpsertMode};
use crate::middleware::{ApiResponse, ApiResult, CurrentUser, SessionUser};
use crate::state::AppState;

/// Caller's profile, or `null` if it was never created
pub async fn profile_get(State(state): State<AppState>, user: CurrentUser) -> ApiResult<Value> {
    let profile = state.repo.find_profile(user.id).await?;
    Ok(ApiResponse::success(json!({ "profile": profile })))
}

/// Create or refresh the profile from the auth provider's user record
pub async fn profile_post(
    State(state): State<AppState>,
    user: CurrentUser,
    SessionUser(session_user): SessionUser,
) -> ApiResult<Value> {
    let mut upsert = ProfileUpsert::from(&session_user);
    upsert.id = user.id;

    let profile = state.repo.upsert_profile(&upsert, UpsertMode::Overwrite).await?;
    Ok(ApiResponse::success(json!({ "profile": profile })))
}

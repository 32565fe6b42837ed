// handlers/public/auth/login.rs - POST /auth/login handler

use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use validator::Validate;

use crate::api::{JsonOrForm, PayloadKind};
use crate::auth::session::with_session;
use crate::error::ApiError;
use crate::middleware::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/**
 * POST /auth/login - Password sign-in through the auth provider
 *
 * Expected Input (JSON or form):
 * ```json
 * { "email": "ana@acme.test", "password": "secret" }
 * ```
 *
 * Sets the `sb-access-token` / `sb-refresh-token` session cookies. Forms are
 * redirected to `/dashboard`; JSON callers receive the signed-in user.
 */
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: JsonOrForm<LoginRequest>,
) -> Result<Response, ApiError> {
    let session = state
        .auth
        .sign_in(&payload.value.email, &payload.value.password)
        .await?;
    info!("User {} signed in", session.user.id);

    let jar = with_session(jar, &session, state.secure_cookies());
    Ok(match payload.kind {
        PayloadKind::Form => (jar, Redirect::to("/dashboard")).into_response(),
        PayloadKind::Json => (jar, ApiResponse::success(json!({ "user": session.user }))).into_response(),
    })
}

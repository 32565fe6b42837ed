// handlers/public/auth/magic_link.rs - POST /auth/magic-link handler

use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::api::{JsonOrForm, PayloadKind};
use crate::auth::{session::with_code_verifier, PkcePair};
use crate::error::ApiError;
use crate::middleware::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct MagicLinkRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
}

/// Sends a passwordless sign-in link that lands on `/auth/callback`
pub async fn magic_link(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: JsonOrForm<MagicLinkRequest>,
) -> Result<Response, ApiError> {
    let pkce = PkcePair::generate();
    let redirect_to = state.config.url_for("/auth/callback");

    state
        .auth
        .send_magic_link(&payload.value.email, &redirect_to, &pkce.challenge)
        .await?;

    let jar = with_code_verifier(jar, pkce.verifier, state.secure_cookies());
    Ok(match payload.kind {
        PayloadKind::Form => (jar, Redirect::to("/login?sent=1")).into_response(),
        PayloadKind::Json => (jar, ApiResponse::success(json!({ "sent": true }))).into_response(),
    })
}

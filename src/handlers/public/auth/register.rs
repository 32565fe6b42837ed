// handlers/public/auth/register.rs - POST /auth/register handler

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
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

/**
 * POST /auth/register - Create an account with the auth provider
 *
 * When the provider starts a session right away (no e-mail confirmation),
 * the session cookies are set and the user continues to `/onboarding`.
 * Otherwise the response reports that confirmation is pending.
 */
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: JsonOrForm<RegisterRequest>,
) -> Result<Response, ApiError> {
    let request = &payload.value;
    let full_name = request.full_name.as_deref().map(str::trim).filter(|n| !n.is_empty());

    let outcome = state.auth.sign_up(&request.email, &request.password, full_name).await?;
    info!("Registered user {}", outcome.user.id);

    let confirmation_required = outcome.session.is_none();
    let jar = match &outcome.session {
        Some(session) => with_session(jar, session, state.secure_cookies()),
        None => jar,
    };

    Ok(match payload.kind {
        PayloadKind::Form if confirmation_required => (jar, Redirect::to("/login")).into_response(),
        PayloadKind::Form => (jar, Redirect::to("/onboarding")).into_response(),
        PayloadKind::Json => (
            jar,
            ApiResponse::created(json!({
                "user": outcome.user,
                "confirmation_required": confirmation_required
            })),
        )
            .into_response(),
    })
}

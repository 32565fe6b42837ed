// handlers/public/auth/logout.rs - POST /auth/logout handler

use axum::{
    extract::State,
    http::{header::CONTENT_TYPE, HeaderMap},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde_json::json;
use tracing::warn;

use crate::auth::session::{session_token, without_session};
use crate::middleware::ApiResponse;
use crate::state::AppState;
use crate::tenancy::clear_tenant_cookies;

/**
 * POST /auth/logout - End the session
 *
 * Provider sign-out is best effort; the session and tenant cookies are
 * cleared regardless.
 */
pub async fn logout(State(state): State<AppState>, headers: HeaderMap, jar: CookieJar) -> Response {
    if let Some(token) = session_token(&headers, &jar) {
        if let Err(e) = state.auth.sign_out(&token).await {
            warn!("Provider sign-out failed: {}", e);
        }
    }

    let jar = clear_tenant_cookies(state.secure_cookies())
        .into_iter()
        .fold(without_session(jar), |jar, cookie| jar.add(cookie));

    let is_form = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

    if is_form {
        (jar, Redirect::to("/login")).into_response()
    } else {
        (jar, ApiResponse::success(json!({ "signed_out": true }))).into_response()
    }
}

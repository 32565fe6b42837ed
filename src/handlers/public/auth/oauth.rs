// handlers/public/auth/oauth.rs - GET /auth/oauth/:provider handler

use axum::{
    extract::{Path, Query, State},
    response::Redirect,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use crate::auth::{session::with_code_verifier, PkcePair};
use crate::error::ApiError;
use crate::handlers::public::auth::callback::sanitize_next;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct OAuthQuery {
    pub next: Option<String>,
}

/**
 * GET /auth/oauth/:provider - Start an OAuth sign-in (PKCE)
 *
 * Stores the code verifier in a short-lived HttpOnly cookie and redirects
 * the browser to the provider's authorize URL. The provider sends the user
 * back to `/auth/callback`.
 */
pub async fn oauth_start(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Query(query): Query<OAuthQuery>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), ApiError> {
    if provider.is_empty() || !provider.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
        return Err(ApiError::bad_request(format!("Unsupported provider '{}'", provider)));
    }

    let mut redirect_to = state.config.url_for("/auth/callback");
    if let Some(next) = query.next.as_deref() {
        let encoded = serde_urlencoded::to_string(&[("next", sanitize_next(Some(next)))])
            .map_err(|e| ApiError::bad_request(format!("Invalid next path: {}", e)))?;
        redirect_to = format!("{}?{}", redirect_to, encoded);
    }

    let pkce = PkcePair::generate();
    let authorize_url = state.auth.authorize_url(&provider, &redirect_to, &pkce.challenge)?;

    let jar = with_code_verifier(jar, pkce.verifier, state.secure_cookies());
    Ok((jar, Redirect::to(&authorize_url)))
}

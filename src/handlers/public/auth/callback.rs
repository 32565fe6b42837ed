// handlers/public/auth/callback.rs - GET /auth/callback handler

use axum::{
    extract::{Query, State},
    http::{header::HOST, HeaderMap},
    response::Redirect,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use tracing::{info, warn};

use crate::auth::session::{take_code_verifier, with_session};
use crate::state::AppState;

const DEFAULT_NEXT: &str = "/dashboard";

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub next: Option<String>,
}

/**
 * GET /auth/callback - Finish an OAuth or magic-link sign-in
 *
 * Exchanges `code` (plus the stored PKCE verifier) for a session, sets the
 * session cookies and redirects to `next` on the request's origin. Any
 * failure lands on `/login`.
 */
pub async fn callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
    headers: HeaderMap,
    jar: CookieJar,
) -> (CookieJar, Redirect) {
    let origin = request_origin(&headers, &state.config.server.app_url);
    let next = sanitize_next(query.next.as_deref());
    let (jar, verifier) = take_code_verifier(jar);

    let (Some(code), Some(verifier)) = (query.code.as_deref(), verifier) else {
        warn!("Auth callback without code or verifier");
        return (jar, Redirect::to(&format!("{}/login", origin)));
    };

    match state.auth.exchange_code_for_session(code, &verifier).await {
        Ok(session) => {
            info!("User {} completed sign-in callback", session.user.id);
            let jar = with_session(jar, &session, state.secure_cookies());
            (jar, Redirect::to(&format!("{}{}", origin, next)))
        }
        Err(e) => {
            warn!("Code exchange failed: {}", e);
            (jar, Redirect::to(&format!("{}/login", origin)))
        }
    }
}

/// Keep redirects on our own origin
pub fn sanitize_next(next: Option<&str>) -> &str {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.starts_with("/\\") => path,
        _ => DEFAULT_NEXT,
    }
}

/// Origin the browser used: plain host on localhost, otherwise the
/// forwarded host over https when behind a proxy
fn request_origin(headers: &HeaderMap, app_url: &str) -> String {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };
    let host = header(HOST.as_str());

    match (host, header("x-forwarded-host")) {
        (Some(host), _) if host.contains("localhost") => format!("http://{}", host),
        (_, Some(forwarded)) => format!("https://{}", forwarded),
        (Some(host), None) => format!("http://{}", host),
        (None, None) => app_url.trim_end_matches('/').to_string(),
    }
}

//! Request gate: authenticates protected routes, propagates the user id and
//! keeps the tenant cookie pair in sync with the request host.

use axum::{
    extract::{Request, State},
    http::{
        header::{HOST, SET_COOKIE},
        HeaderValue,
    },
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use tracing::{debug, warn};

use crate::auth::{session::session_token, AuthError, AuthProvider, ProviderUser};
use crate::error::ApiError;
use crate::middleware::CurrentTenant;
use crate::state::AppState;
use crate::tenancy::{classify_host, HostClass, TenantLocator, TenantResolver};

/// Header carrying the authenticated user id to handlers
pub const USER_ID_HEADER: &str = "x-user-id";

pub const LOGIN_PATH: &str = "/login";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAccess {
    Public,
    /// Rejected with 401 JSON when unauthenticated
    ProtectedApi,
    /// Redirected to the login page when unauthenticated
    ProtectedPage,
}

pub fn classify_route(path: &str) -> RouteAccess {
    if path == "/api/health" {
        RouteAccess::Public
    } else if path.starts_with("/api/") {
        RouteAccess::ProtectedApi
    } else if path == "/dashboard" || path == "/onboarding" || path == "/sa" || path.starts_with("/sa/") {
        RouteAccess::ProtectedPage
    } else {
        RouteAccess::Public
    }
}

pub async fn request_gate(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    // Only the gate may assert identity
    request.headers_mut().remove(USER_ID_HEADER);

    let access = classify_route(request.uri().path());
    let jar = CookieJar::from_headers(request.headers());
    let token = session_token(request.headers(), &jar);

    let mut user = None;
    if access != RouteAccess::Public {
        match authenticate(state.auth.as_ref(), token.as_deref()).await {
            Ok(authenticated) => user = Some(authenticated),
            Err(e) => {
                debug!("Rejected {} {}: {}", request.method(), request.uri().path(), e);
                return reject(access);
            }
        }
    }

    if let Some(user) = &user {
        if let Ok(value) = HeaderValue::from_str(&user.id.to_string()) {
            request.headers_mut().insert(USER_ID_HEADER, value);
        }
        request.extensions_mut().insert(user.clone());
    }

    let host = request_host(&request);
    let class = classify_host(&host, &state.config);
    let existing = TenantLocator::from_jar(&jar);

    let user_id = match (&user, &class, &existing, &token) {
        (Some(user), _, _, _) => Some(user.id),
        // Public page on a dev host with no tenant yet: identify the user if we can
        (None, HostClass::Development, None, Some(token)) => state.auth.get_user(token).await.ok().map(|u| u.id),
        _ => None,
    };

    let directive = TenantResolver::new(state.repo.as_ref())
        .resolve(&class, existing.as_ref(), user_id)
        .await;
    request
        .extensions_mut()
        .insert(CurrentTenant(directive.effective_locator(existing)));

    let mut response = next.run(request).await;
    let handler_cookies = cookie_names(&response);
    for cookie in directive.cookies(state.secure_cookies()) {
        // Handlers that write a tenant cookie themselves (logout) take precedence
        if handler_cookies.iter().any(|name| name == cookie.name()) {
            continue;
        }
        match HeaderValue::from_str(&cookie.to_string()) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            }
            Err(e) => warn!("Skipping tenant cookie {}: {}", cookie.name(), e),
        }
    }
    response
}

async fn authenticate(auth: &dyn AuthProvider, token: Option<&str>) -> Result<ProviderUser, AuthError> {
    let token = token.ok_or_else(|| AuthError::InvalidSession("no session".to_string()))?;
    auth.get_user(token).await
}

fn reject(access: RouteAccess) -> Response {
    match access {
        RouteAccess::ProtectedPage => Redirect::to(LOGIN_PATH).into_response(),
        _ => ApiError::unauthorized("Unauthorized").into_response(),
    }
}

fn cookie_names(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| Cookie::parse(v).ok())
        .map(|cookie| cookie.name().to_string())
        .collect()
}

fn request_host(request: &Request) -> String {
    request
        .headers()
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or_else(|| request.uri().authority().map(|a| a.to_string()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_cookie_names_written_by_handlers() {
        let mut response = Response::new(axum::body::Body::empty());
        for value in ["tenant_slug=; Path=/; Max-Age=0", "sb-access-token=abc; HttpOnly; Path=/", "garbage"] {
            response
                .headers_mut()
                .append(SET_COOKIE, HeaderValue::from_static(value));
        }
        assert_eq!(cookie_names(&response), vec!["tenant_slug", "sb-access-token"]);
    }

    #[test]
    fn classifies_routes() {
        assert_eq!(classify_route("/api/health"), RouteAccess::Public);
        assert_eq!(classify_route("/api/tenants"), RouteAccess::ProtectedApi);
        assert_eq!(classify_route("/api/sa/users"), RouteAccess::ProtectedApi);
        assert_eq!(classify_route("/dashboard"), RouteAccess::ProtectedPage);
        assert_eq!(classify_route("/onboarding"), RouteAccess::ProtectedPage);
        assert_eq!(classify_route("/sa"), RouteAccess::ProtectedPage);
        assert_eq!(classify_route("/sa/tenants"), RouteAccess::ProtectedPage);
        assert_eq!(classify_route("/sales"), RouteAccess::Public);
        assert_eq!(classify_route("/login"), RouteAccess::Public);
        assert_eq!(classify_route("/auth/callback"), RouteAccess::Public);
        assert_eq!(classify_route("/"), RouteAccess::Public);
    }
}

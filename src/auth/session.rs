//! Session cookies and token extraction.

use axum::http::HeaderMap;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use super::AuthSession;

pub const ACCESS_TOKEN_COOKIE: &str = "sb-access-token";
pub const REFRESH_TOKEN_COOKIE: &str = "sb-refresh-token";
pub const CODE_VERIFIER_COOKIE: &str = "sb-code-verifier";

/// Pull the access token from `Authorization: Bearer` or the session cookie.
///
/// The header wins so API clients can call without cookies.
pub fn session_token(headers: &HeaderMap, jar: &CookieJar) -> Option<String> {
    if let Some(token) = bearer_token(headers) {
        return Some(token);
    }

    jar.get(ACCESS_TOKEN_COOKIE)
        .map(|c| c.value().trim().to_string())
        .filter(|v| !v.is_empty())
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth_str = headers.get(axum::http::header::AUTHORIZATION)?.to_str().ok()?;
    let token = auth_str.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

fn http_only_cookie(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

pub fn with_session(jar: CookieJar, session: &AuthSession, secure: bool) -> CookieJar {
    jar.add(http_only_cookie(ACCESS_TOKEN_COOKIE, session.access_token.clone(), secure))
        .add(http_only_cookie(REFRESH_TOKEN_COOKIE, session.refresh_token.clone(), secure))
}

pub fn without_session(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(ACCESS_TOKEN_COOKIE).path("/"))
        .remove(Cookie::build(REFRESH_TOKEN_COOKIE).path("/"))
}

pub fn with_code_verifier(jar: CookieJar, verifier: String, secure: bool) -> CookieJar {
    jar.add(http_only_cookie(CODE_VERIFIER_COOKIE, verifier, secure))
}

pub fn take_code_verifier(jar: CookieJar) -> (CookieJar, Option<String>) {
    let verifier = jar
        .get(CODE_VERIFIER_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty());
    let jar = jar.remove(Cookie::build(CODE_VERIFIER_COOKIE).path("/"));
    (jar, verifier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, HeaderValue};

    fn headers_with(name: header::HeaderName, value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(name, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn bearer_header_wins_over_cookie() {
        let mut headers = headers_with(header::AUTHORIZATION, "Bearer header-token");
        headers.insert(header::COOKIE, HeaderValue::from_static("sb-access-token=cookie-token"));
        let jar = CookieJar::from_headers(&headers);
        assert_eq!(session_token(&headers, &jar).as_deref(), Some("header-token"));
    }

    #[test]
    fn falls_back_to_cookie() {
        let headers = headers_with(header::COOKIE, "tenant_slug=acme; sb-access-token=cookie-token");
        let jar = CookieJar::from_headers(&headers);
        assert_eq!(session_token(&headers, &jar).as_deref(), Some("cookie-token"));
    }

    #[test]
    fn ignores_empty_and_non_bearer_credentials() {
        let headers = headers_with(header::AUTHORIZATION, "Basic dXNlcjpwYXNz");
        let jar = CookieJar::from_headers(&headers);
        assert_eq!(session_token(&headers, &jar), None);

        let headers = headers_with(header::AUTHORIZATION, "Bearer   ");
        let jar = CookieJar::from_headers(&headers);
        assert_eq!(session_token(&headers, &jar), None);
    }

    #[test]
    fn code_verifier_is_taken_once() {
        let headers = headers_with(header::COOKIE, "sb-code-verifier=abc123");
        let jar = CookieJar::from_headers(&headers);
        let (jar, verifier) = take_code_verifier(jar);
        assert_eq!(verifier.as_deref(), Some("abc123"));
        assert!(jar.get(CODE_VERIFIER_COOKIE).is_none());
    }
}

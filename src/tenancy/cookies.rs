use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Serialize;

pub const TENANT_SLUG_COOKIE: &str = "tenant_slug";
pub const TENANT_DOMAIN_COOKIE: &str = "tenant_domain";

/// Identifies a tenant either by slug or by custom domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum TenantLocator {
    Slug(String),
    Domain(String),
}

impl TenantLocator {
    /// Read the tenant cookie pair. Domain wins if both are somehow present.
    pub fn from_jar(jar: &CookieJar) -> Option<Self> {
        let non_empty = |name: &str| {
            jar.get(name)
                .map(|c| c.value().trim().to_string())
                .filter(|v| !v.is_empty())
        };
        non_empty(TENANT_DOMAIN_COOKIE)
            .map(TenantLocator::Domain)
            .or_else(|| non_empty(TENANT_SLUG_COOKIE).map(TenantLocator::Slug))
    }

    pub fn value(&self) -> &str {
        match self {
            TenantLocator::Slug(v) | TenantLocator::Domain(v) => v,
        }
    }

    fn cookie_name(&self) -> &'static str {
        match self {
            TenantLocator::Slug(_) => TENANT_SLUG_COOKIE,
            TenantLocator::Domain(_) => TENANT_DOMAIN_COOKIE,
        }
    }

    fn other_cookie_name(&self) -> &'static str {
        match self {
            TenantLocator::Slug(_) => TENANT_DOMAIN_COOKIE,
            TenantLocator::Domain(_) => TENANT_SLUG_COOKIE,
        }
    }
}

/// What the gate writes back to the tenant cookie pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieDirective {
    /// Leave both cookies as the client sent them
    Keep,
    /// Set one cookie and clear the other
    Set(TenantLocator),
    ClearBoth,
}

impl CookieDirective {
    /// Cookies to emit as Set-Cookie headers
    pub fn cookies(&self, secure: bool) -> Vec<Cookie<'static>> {
        match self {
            CookieDirective::Keep => Vec::new(),
            CookieDirective::Set(locator) => vec![
                tenant_cookie(locator.cookie_name(), locator.value().to_string(), secure),
                removal_cookie(locator.other_cookie_name(), secure),
            ],
            CookieDirective::ClearBoth => vec![
                removal_cookie(TENANT_SLUG_COOKIE, secure),
                removal_cookie(TENANT_DOMAIN_COOKIE, secure),
            ],
        }
    }

    /// Tenant the rest of this request should see
    pub fn effective_locator(&self, existing: Option<TenantLocator>) -> Option<TenantLocator> {
        match self {
            CookieDirective::Keep => existing,
            CookieDirective::Set(locator) => Some(locator.clone()),
            CookieDirective::ClearBoth => None,
        }
    }
}

fn tenant_cookie(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

fn removal_cookie(name: &'static str, secure: bool) -> Cookie<'static> {
    let mut cookie = tenant_cookie(name, String::new(), secure);
    cookie.make_removal();
    cookie
}

/// Removal cookies for both tenant cookies, used on logout
pub fn clear_tenant_cookies(secure: bool) -> Vec<Cookie<'static>> {
    CookieDirective::ClearBoth.cookies(secure)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jar(pairs: &[(&'static str, &'static str)]) -> CookieJar {
        pairs
            .iter()
            .fold(CookieJar::new(), |jar, (name, value)| jar.add(Cookie::new(*name, *value)))
    }

    #[test]
    fn domain_cookie_takes_precedence() {
        let jar = jar(&[(TENANT_SLUG_COOKIE, "acme"), (TENANT_DOMAIN_COOKIE, "billing.acme.io")]);
        assert_eq!(
            TenantLocator::from_jar(&jar),
            Some(TenantLocator::Domain("billing.acme.io".to_string()))
        );
    }

    #[test]
    fn empty_cookies_are_ignored() {
        let jar = jar(&[(TENANT_DOMAIN_COOKIE, ""), (TENANT_SLUG_COOKIE, "acme")]);
        assert_eq!(TenantLocator::from_jar(&jar), Some(TenantLocator::Slug("acme".to_string())));
        assert_eq!(TenantLocator::from_jar(&CookieJar::new()), None);
    }

    #[test]
    fn setting_one_cookie_clears_the_other() {
        let cookies = CookieDirective::Set(TenantLocator::Slug("acme".to_string())).cookies(false);
        assert_eq!(cookies.len(), 2);
        assert_eq!(cookies[0].name(), TENANT_SLUG_COOKIE);
        assert_eq!(cookies[0].value(), "acme");
        assert_eq!(cookies[0].path(), Some("/"));
        assert_eq!(cookies[1].name(), TENANT_DOMAIN_COOKIE);
        assert_eq!(cookies[1].value(), "");
        assert!(cookies[1].to_string().contains("Max-Age=0"));
    }

    #[test]
    fn clear_both_and_keep() {
        let names: Vec<_> = CookieDirective::ClearBoth
            .cookies(true)
            .iter()
            .map(|c| (c.name().to_string(), c.secure()))
            .collect();
        assert_eq!(
            names,
            vec![
                (TENANT_SLUG_COOKIE.to_string(), Some(true)),
                (TENANT_DOMAIN_COOKIE.to_string(), Some(true))
            ]
        );
        assert!(CookieDirective::Keep.cookies(false).is_empty());
    }

    #[test]
    fn effective_locator_follows_directive() {
        let existing = Some(TenantLocator::Slug("old".to_string()));
        assert_eq!(CookieDirective::Keep.effective_locator(existing.clone()), existing);
        assert_eq!(CookieDirective::ClearBoth.effective_locator(existing.clone()), None);
        let set = TenantLocator::Domain("acme.io".to_string());
        assert_eq!(CookieDirective::Set(set.clone()).effective_locator(existing), Some(set));
    }
}

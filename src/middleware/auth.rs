use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::CookieJar;
use uuid::Uuid;

use crate::auth::ProviderUser;
use crate::error::ApiError;
use crate::middleware::gate::USER_ID_HEADER;
use crate::tenancy::TenantLocator;

/// User id asserted by the request gate through `x-user-id`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: Uuid,
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| Uuid::parse_str(v).ok())
            .ok_or_else(|| ApiError::unauthorized("Unauthorized"))?;
        Ok(Self { id })
    }
}

/// Full provider user record, present on routes the gate authenticated
#[derive(Debug, Clone)]
pub struct SessionUser(pub ProviderUser);

#[async_trait]
impl<S> FromRequestParts<S> for SessionUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<ProviderUser>()
            .cloned()
            .map(SessionUser)
            .ok_or_else(|| ApiError::unauthorized("Unauthorized"))
    }
}

/// Tenant selected for this request, if any
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentTenant(pub Option<TenantLocator>);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentTenant
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // The gate's decision wins over whatever cookies the client sent
        if let Some(resolved) = parts.extensions.get::<CurrentTenant>() {
            return Ok(resolved.clone());
        }
        let jar = CookieJar::from_headers(&parts.headers);
        Ok(Self(TenantLocator::from_jar(&jar)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(builder: axum::http::request::Builder) -> Parts {
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn current_user_requires_valid_header() {
        let id = Uuid::new_v4();
        let mut ok = parts(Request::builder().header(USER_ID_HEADER, id.to_string()));
        assert_eq!(CurrentUser::from_request_parts(&mut ok, &()).await.unwrap().id, id);

        let mut missing = parts(Request::builder());
        assert!(CurrentUser::from_request_parts(&mut missing, &()).await.is_err());

        let mut garbage = parts(Request::builder().header(USER_ID_HEADER, "admin"));
        assert!(CurrentUser::from_request_parts(&mut garbage, &()).await.is_err());
    }

    #[tokio::test]
    async fn current_tenant_prefers_gate_decision() {
        let mut request = parts(Request::builder().header("cookie", "tenant_slug=stale"));
        request
            .extensions
            .insert(CurrentTenant(Some(TenantLocator::Domain("acme.io".to_string()))));
        let CurrentTenant(locator) = CurrentTenant::from_request_parts(&mut request, &()).await.unwrap();
        assert_eq!(locator, Some(TenantLocator::Domain("acme.io".to_string())));

        let mut cleared = parts(Request::builder().header("cookie", "tenant_slug=stale"));
        cleared.extensions.insert(CurrentTenant(None));
        let CurrentTenant(locator) = CurrentTenant::from_request_parts(&mut cleared, &()).await.unwrap();
        assert_eq!(locator, None);

        let mut cookie_only = parts(Request::builder().header("cookie", "tenant_slug=acme"));
        let CurrentTenant(locator) = CurrentTenant::from_request_parts(&mut cookie_only, &()).await.unwrap();
        assert_eq!(locator, Some(TenantLocator::Slug("acme".to_string())));
    }
}

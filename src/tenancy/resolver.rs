use tracing::{debug, warn};
use uuid::Uuid;

use crate::database::TenancyRepository;
use crate::tenancy::{CookieDirective, HostClass, TenantLocator};

/// Decides how the tenant cookie pair should change for a request
pub struct TenantResolver<'a> {
    repo: &'a dyn TenancyRepository,
}

impl<'a> TenantResolver<'a> {
    pub fn new(repo: &'a dyn TenancyRepository) -> Self {
        Self { repo }
    }

    pub async fn resolve(
        &self,
        host: &HostClass,
        existing: Option<&TenantLocator>,
        user_id: Option<Uuid>,
    ) -> CookieDirective {
        match host {
            HostClass::Development => self.resolve_development(existing, user_id).await,
            HostClass::BaseDomain { subdomain: Some(slug) } => {
                CookieDirective::Set(TenantLocator::Slug(slug.clone()))
            }
            HostClass::BaseDomain { subdomain: None } => CookieDirective::ClearBoth,
            HostClass::Custom(domain) => CookieDirective::Set(TenantLocator::Domain(domain.clone())),
            HostClass::Missing => CookieDirective::Keep,
        }
    }

    /// Fill an empty cookie pair from the user's oldest membership
    async fn resolve_development(&self, existing: Option<&TenantLocator>, user_id: Option<Uuid>) -> CookieDirective {
        if existing.is_some() {
            return CookieDirective::Keep;
        }
        let Some(user_id) = user_id else {
            return CookieDirective::Keep;
        };

        match self.repo.first_membership_tenant(user_id).await {
            Ok(Some(tenant)) => {
                debug!("Auto-selected tenant {} for user {}", tenant.slug, user_id);
                match tenant.domain {
                    Some(domain) => CookieDirective::Set(TenantLocator::Domain(domain)),
                    None => CookieDirective::Set(TenantLocator::Slug(tenant.slug)),
                }
            }
            Ok(None) => CookieDirective::Keep,
            Err(e) => {
                warn!("Tenant auto-selection failed for user {}: {}", user_id, e);
                CookieDirective::Keep
            }
        }
    }
}

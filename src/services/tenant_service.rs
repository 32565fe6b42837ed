use std::sync::Arc;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::auth::ProviderUser;
use crate::database::models::{
    Invoice, Membership, MembershipRole, MembershipWithTenant, NewMembership, NewTenant, ProfileUpsert, Tenant,
};
use crate::database::{RepositoryError, TenancyRepository};
use crate::tenancy::TenantLocator;

const MIN_SLUG_LEN: usize = 2;
const MAX_SLUG_LEN: usize = 63;

#[derive(Debug, Error)]
pub enum TenantError {
    #[error("No tenant specified")]
    NotSpecified,
    #[error("Tenant not found")]
    NotFound,
    #[error("Access denied")]
    AccessDenied,
    #[error("Invalid slug: {0}")]
    InvalidSlug(String),
    #[error("Slug '{0}' is already taken")]
    SlugTaken(String),
    #[error("Domain '{0}' is already taken")]
    DomainTaken(String),
    #[error("User already belongs to a tenant")]
    AlreadyMember,
    #[error("Tenant conflicts with an existing record ({0})")]
    Duplicate(String),
    #[error("User has no tenant membership")]
    NoMembership,
    #[error(transparent)]
    Repository(RepositoryError),
}

impl From<RepositoryError> for TenantError {
    fn from(err: RepositoryError) -> Self {
        match err {
            // Lost a race against a concurrent create
            RepositoryError::UniqueViolation(constraint) => TenantError::Duplicate(constraint),
            RepositoryError::Conflict(_) => TenantError::AlreadyMember,
            other => TenantError::Repository(other),
        }
    }
}

/// Tenant lookup and onboarding
pub struct TenantService {
    repo: Arc<dyn TenancyRepository>,
}

impl TenantService {
    pub fn new(repo: Arc<dyn TenancyRepository>) -> Self {
        Self { repo }
    }

    /// Fetch the tenant a locator points at
    pub async fn lookup(&self, locator: Option<&TenantLocator>) -> Result<Tenant, TenantError> {
        let locator = locator.ok_or(TenantError::NotSpecified)?;
        self.repo.find_tenant(locator).await?.ok_or(TenantError::NotFound)
    }

    /// Fetch the tenant and require the user to be a member of it
    pub async fn lookup_for_member(
        &self,
        user_id: Uuid,
        locator: Option<&TenantLocator>,
    ) -> Result<(Tenant, Membership), TenantError> {
        let tenant = self.lookup(locator).await?;
        let membership = self
            .repo
            .find_membership(user_id, tenant.id)
            .await?
            .ok_or(TenantError::AccessDenied)?;
        Ok((tenant, membership))
    }

    pub async fn invoices_for(
        &self,
        user_id: Uuid,
        locator: Option<&TenantLocator>,
    ) -> Result<(Tenant, Vec<Invoice>), TenantError> {
        let (tenant, _) = self.lookup_for_member(user_id, locator).await?;
        let invoices = self.repo.list_invoices(tenant.id).await?;
        Ok((tenant, invoices))
    }

    /// Most recent membership of the user
    pub async fn current_for_user(&self, user_id: Uuid) -> Result<MembershipWithTenant, TenantError> {
        self.repo
            .latest_membership(user_id)
            .await?
            .ok_or(TenantError::NoMembership)
    }

    pub async fn memberships(&self, user_id: Uuid) -> Result<Vec<MembershipWithTenant>, TenantError> {
        Ok(self.repo.memberships_for_user(user_id).await?)
    }

    /// Create a tenant with the user as its owner.
    ///
    /// Slug and domain checks run before anything is written; the profile,
    /// tenant and owner membership then land in a single transaction. The
    /// one-tenant-per-user rule is checked again inside that transaction with
    /// the user's profile row held, so concurrent onboarding by the same user
    /// creates at most one tenant.
    pub async fn create_with_owner(&self, user: &ProviderUser, input: NewTenant) -> Result<Tenant, TenantError> {
        let input = input.normalized();
        validate_slug(&input.slug)?;

        if self.repo.slug_taken(&input.slug).await? {
            return Err(TenantError::SlugTaken(input.slug));
        }
        if let Some(domain) = &input.domain {
            if self.repo.domain_taken(domain).await? {
                return Err(TenantError::DomainTaken(domain.clone()));
            }
        }
        if self.repo.count_memberships(user.id).await? > 0 {
            return Err(TenantError::AlreadyMember);
        }

        let mut tx = self.repo.begin().await?;
        tx.ensure_profile(&ProfileUpsert::from(user)).await?;
        if tx.count_memberships(user.id).await? > 0 {
            return Err(TenantError::AlreadyMember);
        }
        let tenant = tx.insert_tenant(&input).await?;
        tx.insert_membership(&NewMembership {
            tenant_id: tenant.id,
            user_id: user.id,
            role: MembershipRole::Owner,
        })
        .await?;
        tx.commit().await?;

        info!("Created tenant {} owned by {}", tenant.slug, user.id);
        Ok(tenant)
    }
}

/// Lowercase alphanumerics and hyphens, no hyphen at either end
pub fn validate_slug(slug: &str) -> Result<(), TenantError> {
    if slug.len() < MIN_SLUG_LEN {
        return Err(TenantError::InvalidSlug(format!(
            "Slug must be at least {} characters",
            MIN_SLUG_LEN
        )));
    }
    if slug.len() > MAX_SLUG_LEN {
        return Err(TenantError::InvalidSlug(format!(
            "Slug must be at most {} characters",
            MAX_SLUG_LEN
        )));
    }
    if !slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-') {
        return Err(TenantError::InvalidSlug(
            "Slug can only contain lowercase letters, numbers, and hyphens".to_string(),
        ));
    }
    if slug.starts_with('-') || slug.ends_with('-') {
        return Err(TenantError::InvalidSlug(
            "Slug cannot start or end with a hyphen".to_string(),
        ));
    }
    Ok(())
}

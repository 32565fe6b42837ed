use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::database::models::{
    AuditLog, Invoice, Membership, MembershipWithTenant, NewAuditLog, NewMembership, NewTenant, Profile,
    ProfileUpsert, Tenant, UpsertMode,
};
use crate::tenancy::TenantLocator;

/// Postgres SQLSTATE for unique_violation
const UNIQUE_VIOLATION: &str = "23505";

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate value violates {0}")]
    UniqueViolation(String),

    #[error("Concurrent write conflict: {0}")]
    Conflict(String),

    #[error("Corrupt row: {0}")]
    Corrupt(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Sqlx(sqlx::Error),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                RepositoryError::UniqueViolation(db.constraint().unwrap_or("unique constraint").to_string())
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                RepositoryError::Unavailable(err.to_string())
            }
            _ => RepositoryError::Sqlx(err),
        }
    }
}

/// Row counts reported by `portal status`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DatabaseStats {
    pub tenants: i64,
    pub memberships: i64,
    pub profiles: i64,
    pub invoices: i64,
    pub audit_logs: i64,
}

/// Typed access to tenants, memberships, profiles, invoices and audit logs
#[async_trait]
pub trait TenancyRepository: Send + Sync {
    async fn health_check(&self) -> Result<(), RepositoryError>;

    // Tenants
    async fn find_tenant(&self, locator: &TenantLocator) -> Result<Option<Tenant>, RepositoryError>;
    async fn slug_taken(&self, slug: &str) -> Result<bool, RepositoryError>;
    async fn domain_taken(&self, domain: &str) -> Result<bool, RepositoryError>;
    /// All tenants, newest first
    async fn list_tenants(&self) -> Result<Vec<Tenant>, RepositoryError>;
    /// Insert or return the tenant with `tenant.slug`, leaving an existing row untouched
    async fn upsert_tenant_by_slug(&self, tenant: &NewTenant) -> Result<Tenant, RepositoryError>;
    /// Delete tenants whose slug starts with `prefix`, cascading to their rows
    async fn delete_tenants_by_slug_prefix(&self, prefix: &str) -> Result<u64, RepositoryError>;
    /// Delete every tenant, membership, invoice and non super-admin profile in
    /// one transaction. Audit logs are kept. Returns the deleted row counts.
    async fn reset_keeping_super_admins(&self) -> Result<DatabaseStats, RepositoryError>;

    // Memberships
    /// Tenant of the user's oldest membership
    async fn first_membership_tenant(&self, user_id: Uuid) -> Result<Option<Tenant>, RepositoryError>;
    /// All memberships of the user, oldest first
    async fn memberships_for_user(&self, user_id: Uuid) -> Result<Vec<MembershipWithTenant>, RepositoryError>;
    async fn latest_membership(&self, user_id: Uuid) -> Result<Option<MembershipWithTenant>, RepositoryError>;
    async fn count_memberships(&self, user_id: Uuid) -> Result<i64, RepositoryError>;
    async fn find_membership(&self, user_id: Uuid, tenant_id: Uuid) -> Result<Option<Membership>, RepositoryError>;

    // Invoices
    /// Invoices of a tenant, newest first
    async fn list_invoices(&self, tenant_id: Uuid) -> Result<Vec<Invoice>, RepositoryError>;

    // Profiles
    async fn find_profile(&self, id: Uuid) -> Result<Option<Profile>, RepositoryError>;
    async fn upsert_profile(&self, profile: &ProfileUpsert, mode: UpsertMode) -> Result<Profile, RepositoryError>;
    async fn set_super_admin(&self, id: Uuid, is_super_admin: bool) -> Result<Profile, RepositoryError>;

    // Audit
    async fn insert_audit_log(&self, entry: &NewAuditLog) -> Result<AuditLog, RepositoryError>;

    async fn stats(&self) -> Result<DatabaseStats, RepositoryError>;

    /// Start a unit of work. Dropping the transaction without `commit` discards it.
    async fn begin(&self) -> Result<Box<dyn TenancyTransaction>, RepositoryError>;
}

/// Writes that must land together
#[async_trait]
pub trait TenancyTransaction: Send {
    async fn ensure_profile(&mut self, profile: &ProfileUpsert) -> Result<(), RepositoryError>;
    /// Count the user's memberships, holding the user's profile row until the
    /// transaction ends. Call after `ensure_profile`.
    async fn count_memberships(&mut self, user_id: Uuid) -> Result<i64, RepositoryError>;
    async fn insert_tenant(&mut self, tenant: &NewTenant) -> Result<Tenant, RepositoryError>;
    async fn insert_membership(&mut self, membership: &NewMembership) -> Result<Membership, RepositoryError>;
    async fn commit(self: Box<Self>) -> Result<(), RepositoryError>;
}

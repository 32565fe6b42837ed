use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::models::{
    AuditLog, Invoice, Membership, MembershipWithTenant, NewAuditLog, NewInvoice, NewMembership, NewTenant,
    Profile, ProfileUpsert, Tenant, TenantSummary, UpsertMode,
};
use crate::database::repository::{DatabaseStats, RepositoryError, TenancyRepository, TenancyTransaction};
use crate::tenancy::TenantLocator;

#[derive(Default)]
struct State {
    tenants: Vec<Tenant>,
    memberships: Vec<Membership>,
    profiles: Vec<Profile>,
    invoices: Vec<Invoice>,
    audit_logs: Vec<AuditLog>,
    /// Last timestamp handed out; keeps creation order strictly increasing
    clock: Option<DateTime<Utc>>,
}

impl State {
    fn now(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let next = match self.clock {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.clock = Some(next);
        next
    }

    fn tenant(&self, id: Uuid) -> Option<&Tenant> {
        self.tenants.iter().find(|t| t.id == id)
    }

    fn with_tenant(&self, membership: &Membership) -> Result<MembershipWithTenant, RepositoryError> {
        let tenant = self
            .tenant(membership.tenant_id)
            .ok_or_else(|| RepositoryError::Corrupt(format!("membership {} has no tenant", membership.id)))?;
        Ok(MembershipWithTenant {
            membership: membership.clone(),
            tenant: TenantSummary::from(tenant),
        })
    }

    fn user_memberships(&self, user_id: Uuid) -> impl Iterator<Item = &Membership> {
        self.memberships.iter().filter(move |m| m.user_id == user_id)
    }

    fn check_tenant_unique(&self, tenant: &NewTenant) -> Result<(), RepositoryError> {
        if self.tenants.iter().any(|t| t.slug == tenant.slug) {
            return Err(RepositoryError::UniqueViolation("tenants_slug_key".to_string()));
        }
        if let Some(domain) = &tenant.domain {
            if self.tenants.iter().any(|t| t.domain.as_deref() == Some(domain.as_str())) {
                return Err(RepositoryError::UniqueViolation("tenants_domain_key".to_string()));
            }
        }
        Ok(())
    }

    fn insert_tenant(&mut self, id: Uuid, tenant: &NewTenant) -> Result<Tenant, RepositoryError> {
        self.check_tenant_unique(tenant)?;
        let created_at = self.now();
        let tenant = Tenant {
            id,
            name: tenant.name.clone(),
            slug: tenant.slug.clone(),
            domain: tenant.domain.clone(),
            created_at,
        };
        self.tenants.push(tenant.clone());
        Ok(tenant)
    }

    fn insert_membership(&mut self, id: Uuid, membership: &NewMembership) -> Result<Membership, RepositoryError> {
        if self.tenant(membership.tenant_id).is_none() {
            return Err(RepositoryError::NotFound(format!("tenant {}", membership.tenant_id)));
        }
        if self
            .memberships
            .iter()
            .any(|m| m.tenant_id == membership.tenant_id && m.user_id == membership.user_id)
        {
            return Err(RepositoryError::UniqueViolation(
                "memberships_tenant_id_user_id_key".to_string(),
            ));
        }
        let created_at = self.now();
        let membership = Membership {
            id,
            tenant_id: membership.tenant_id,
            user_id: membership.user_id,
            role: membership.role,
            created_at,
        };
        self.memberships.push(membership.clone());
        Ok(membership)
    }

    fn upsert_profile(&mut self, profile: &ProfileUpsert, mode: UpsertMode) -> Profile {
        if let Some(existing) = self.profiles.iter_mut().find(|p| p.id == profile.id) {
            if mode == UpsertMode::Overwrite {
                existing.email = profile.email.clone();
                existing.full_name = profile.full_name.clone();
                existing.avatar_url = profile.avatar_url.clone();
            }
            return existing.clone();
        }
        let created_at = self.now();
        let created = Profile {
            id: profile.id,
            email: profile.email.clone(),
            full_name: profile.full_name.clone(),
            avatar_url: profile.avatar_url.clone(),
            is_super_admin: false,
            created_at,
        };
        self.profiles.push(created.clone());
        created
    }
}

/// In-process repository used by the test suite and by development runs
/// without a database.
#[derive(Clone, Default)]
pub struct MemoryRepository {
    state: Arc<RwLock<State>>,
    fail_memberships: Arc<AtomicBool>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every transactional membership insert fail until reset
    pub fn inject_membership_failure(&self, fail: bool) {
        self.fail_memberships.store(fail, Ordering::SeqCst);
    }

    pub async fn insert_tenant(&self, tenant: NewTenant) -> Result<Tenant, RepositoryError> {
        self.state.write().await.insert_tenant(Uuid::new_v4(), &tenant.normalized())
    }

    pub async fn insert_membership(&self, membership: NewMembership) -> Result<Membership, RepositoryError> {
        self.state.write().await.insert_membership(Uuid::new_v4(), &membership)
    }

    pub async fn insert_profile(&self, profile: ProfileUpsert, is_super_admin: bool) -> Profile {
        let mut state = self.state.write().await;
        let mut created = state.upsert_profile(&profile, UpsertMode::Overwrite);
        if let Some(existing) = state.profiles.iter_mut().find(|p| p.id == profile.id) {
            existing.is_super_admin = is_super_admin;
            created = existing.clone();
        }
        created
    }

    pub async fn insert_invoice(&self, invoice: NewInvoice) -> Result<Invoice, RepositoryError> {
        let mut state = self.state.write().await;
        if state.tenant(invoice.tenant_id).is_none() {
            return Err(RepositoryError::NotFound(format!("tenant {}", invoice.tenant_id)));
        }
        let created_at = state.now();
        let invoice = Invoice {
            id: Uuid::new_v4(),
            tenant_id: invoice.tenant_id,
            number: invoice.number,
            customer_name: invoice.customer_name,
            amount: invoice.amount,
            currency: invoice.currency,
            status: invoice.status,
            issued_at: invoice.issued_at,
            created_at,
        };
        state.invoices.push(invoice.clone());
        Ok(invoice)
    }

    pub async fn audit_logs(&self) -> Vec<AuditLog> {
        self.state.read().await.audit_logs.clone()
    }
}

#[async_trait]
impl TenancyRepository for MemoryRepository {
    async fn health_check(&self) -> Result<(), RepositoryError> {
        Ok(())
    }

    async fn find_tenant(&self, locator: &TenantLocator) -> Result<Option<Tenant>, RepositoryError> {
        let state = self.state.read().await;
        let found = state.tenants.iter().find(|t| match locator {
            TenantLocator::Slug(slug) => t.slug == *slug,
            TenantLocator::Domain(domain) => t.domain.as_deref() == Some(domain.as_str()),
        });
        Ok(found.cloned())
    }

    async fn slug_taken(&self, slug: &str) -> Result<bool, RepositoryError> {
        Ok(self.state.read().await.tenants.iter().any(|t| t.slug == slug))
    }

    async fn domain_taken(&self, domain: &str) -> Result<bool, RepositoryError> {
        let state = self.state.read().await;
        Ok(state.tenants.iter().any(|t| t.domain.as_deref() == Some(domain)))
    }

    async fn list_tenants(&self) -> Result<Vec<Tenant>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state.tenants.iter().rev().cloned().collect())
    }

    async fn upsert_tenant_by_slug(&self, tenant: &NewTenant) -> Result<Tenant, RepositoryError> {
        let mut state = self.state.write().await;
        if let Some(existing) = state.tenants.iter().find(|t| t.slug == tenant.slug) {
            return Ok(existing.clone());
        }
        state.insert_tenant(Uuid::new_v4(), tenant)
    }

    async fn delete_tenants_by_slug_prefix(&self, prefix: &str) -> Result<u64, RepositoryError> {
        let mut state = self.state.write().await;
        let doomed: Vec<Uuid> = state
            .tenants
            .iter()
            .filter(|t| t.slug.starts_with(prefix))
            .map(|t| t.id)
            .collect();
        state.tenants.retain(|t| !doomed.contains(&t.id));
        state.memberships.retain(|m| !doomed.contains(&m.tenant_id));
        state.invoices.retain(|i| !doomed.contains(&i.tenant_id));
        Ok(doomed.len() as u64)
    }

    async fn reset_keeping_super_admins(&self) -> Result<DatabaseStats, RepositoryError> {
        let mut state = self.state.write().await;
        let profiles_before = state.profiles.len();
        state.profiles.retain(|p| p.is_super_admin);
        let deleted = DatabaseStats {
            tenants: state.tenants.len() as i64,
            memberships: state.memberships.len() as i64,
            profiles: (profiles_before - state.profiles.len()) as i64,
            invoices: state.invoices.len() as i64,
            audit_logs: 0,
        };
        state.tenants.clear();
        state.memberships.clear();
        state.invoices.clear();
        Ok(deleted)
    }

    async fn first_membership_tenant(&self, user_id: Uuid) -> Result<Option<Tenant>, RepositoryError> {
        let state = self.state.read().await;
        let first = state.user_memberships(user_id).next();
        Ok(first.and_then(|m| state.tenant(m.tenant_id)).cloned())
    }

    async fn memberships_for_user(&self, user_id: Uuid) -> Result<Vec<MembershipWithTenant>, RepositoryError> {
        let state = self.state.read().await;
        state.user_memberships(user_id).map(|m| state.with_tenant(m)).collect()
    }

    async fn latest_membership(&self, user_id: Uuid) -> Result<Option<MembershipWithTenant>, RepositoryError> {
        let state = self.state.read().await;
        let latest = state.user_memberships(user_id).last();
        latest.map(|m| state.with_tenant(m)).transpose()
    }

    async fn count_memberships(&self, user_id: Uuid) -> Result<i64, RepositoryError> {
        Ok(self.state.read().await.user_memberships(user_id).count() as i64)
    }

    async fn find_membership(&self, user_id: Uuid, tenant_id: Uuid) -> Result<Option<Membership>, RepositoryError> {
        let state = self.state.read().await;
        let found = state.user_memberships(user_id).find(|m| m.tenant_id == tenant_id);
        Ok(found.cloned())
    }

    async fn list_invoices(&self, tenant_id: Uuid) -> Result<Vec<Invoice>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state
            .invoices
            .iter()
            .rev()
            .filter(|i| i.tenant_id == tenant_id)
            .cloned()
            .collect())
    }

    async fn find_profile(&self, id: Uuid) -> Result<Option<Profile>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state.profiles.iter().find(|p| p.id == id).cloned())
    }

    async fn upsert_profile(&self, profile: &ProfileUpsert, mode: UpsertMode) -> Result<Profile, RepositoryError> {
        Ok(self.state.write().await.upsert_profile(profile, mode))
    }

    async fn set_super_admin(&self, id: Uuid, is_super_admin: bool) -> Result<Profile, RepositoryError> {
        let mut state = self.state.write().await;
        let profile = state
            .profiles
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| RepositoryError::NotFound(format!("profile {}", id)))?;
        profile.is_super_admin = is_super_admin;
        Ok(profile.clone())
    }

    async fn insert_audit_log(&self, entry: &NewAuditLog) -> Result<AuditLog, RepositoryError> {
        let mut state = self.state.write().await;
        let created_at = state.now();
        let log = AuditLog {
            id: Uuid::new_v4(),
            actor: entry.actor,
            action: entry.action.clone(),
            target_type: entry.target_type.clone(),
            target_id: entry.target_id.clone(),
            metadata: entry.metadata.clone(),
            created_at,
        };
        state.audit_logs.push(log.clone());
        Ok(log)
    }

    async fn stats(&self) -> Result<DatabaseStats, RepositoryError> {
        let state = self.state.read().await;
        Ok(DatabaseStats {
            tenants: state.tenants.len() as i64,
            memberships: state.memberships.len() as i64,
            profiles: state.profiles.len() as i64,
            invoices: state.invoices.len() as i64,
            audit_logs: state.audit_logs.len() as i64,
        })
    }

    async fn begin(&self) -> Result<Box<dyn TenancyTransaction>, RepositoryError> {
        Ok(Box::new(MemoryTransaction {
            repo: self.clone(),
            staged: Vec::new(),
            observed: Vec::new(),
        }))
    }
}

enum StagedWrite {
    Profile(ProfileUpsert),
    Tenant(NewTenant, Uuid),
    Membership(NewMembership, Uuid),
}

/// Buffers writes and applies them atomically on commit
pub struct MemoryTransaction {
    repo: MemoryRepository,
    staged: Vec<StagedWrite>,
    /// Membership counts read through this transaction; commit fails if any changed
    observed: Vec<(Uuid, i64)>,
}

impl MemoryTransaction {
    fn staged_tenant(&self, id: Uuid) -> bool {
        self.staged
            .iter()
            .any(|w| matches!(w, StagedWrite::Tenant(_, staged_id) if *staged_id == id))
    }
}

#[async_trait]
impl TenancyTransaction for MemoryTransaction {
    async fn ensure_profile(&mut self, profile: &ProfileUpsert) -> Result<(), RepositoryError> {
        self.staged.push(StagedWrite::Profile(profile.clone()));
        Ok(())
    }

    async fn count_memberships(&mut self, user_id: Uuid) -> Result<i64, RepositoryError> {
        let count = self.repo.state.read().await.user_memberships(user_id).count() as i64;
        self.observed.push((user_id, count));
        Ok(count)
    }

    async fn insert_tenant(&mut self, tenant: &NewTenant) -> Result<Tenant, RepositoryError> {
        self.repo.state.read().await.check_tenant_unique(tenant)?;
        let id = Uuid::new_v4();
        self.staged.push(StagedWrite::Tenant(tenant.clone(), id));
        Ok(Tenant {
            id,
            name: tenant.name.clone(),
            slug: tenant.slug.clone(),
            domain: tenant.domain.clone(),
            created_at: Utc::now(),
        })
    }

    async fn insert_membership(&mut self, membership: &NewMembership) -> Result<Membership, RepositoryError> {
        if self.repo.fail_memberships.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable("injected membership failure".to_string()));
        }
        let state = self.repo.state.read().await;
        if state.tenant(membership.tenant_id).is_none() && !self.staged_tenant(membership.tenant_id) {
            return Err(RepositoryError::NotFound(format!("tenant {}", membership.tenant_id)));
        }
        drop(state);
        let id = Uuid::new_v4();
        self.staged.push(StagedWrite::Membership(membership.clone(), id));
        Ok(Membership {
            id,
            tenant_id: membership.tenant_id,
            user_id: membership.user_id,
            role: membership.role,
            created_at: Utc::now(),
        })
    }

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        let mut state = self.repo.state.write().await;

        // Validate the whole batch before touching state
        for (user_id, seen) in &self.observed {
            if state.user_memberships(*user_id).count() as i64 != *seen {
                return Err(RepositoryError::Conflict(format!(
                    "memberships of user {} changed during the transaction",
                    user_id
                )));
            }
        }
        for write in &self.staged {
            if let StagedWrite::Tenant(tenant, _) = write {
                state.check_tenant_unique(tenant)?;
            }
        }

        let snapshot = (state.tenants.len(), state.memberships.len(), state.profiles.len());
        let mut result = Ok(());
        for write in &self.staged {
            let applied = match write {
                StagedWrite::Profile(profile) => {
                    state.upsert_profile(profile, UpsertMode::KeepExisting);
                    Ok(())
                }
                StagedWrite::Tenant(tenant, id) => state.insert_tenant(*id, tenant).map(|_| ()),
                StagedWrite::Membership(membership, id) => state.insert_membership(*id, membership).map(|_| ()),
            };
            if let Err(err) = applied {
                result = Err(err);
                break;
            }
        }

        if result.is_err() {
            state.tenants.truncate(snapshot.0);
            state.memberships.truncate(snapshot.1);
            state.profiles.truncate(snapshot.2);
        }
        result
    }
}

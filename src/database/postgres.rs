use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::database::models::{
    AuditLog, Invoice, Membership, MembershipWithTenant, NewAuditLog, NewMembership, NewTenant, Profile,
    ProfileUpsert, Tenant, TenantSummary, UpsertMode,
};
use crate::database::repository::{DatabaseStats, RepositoryError, TenancyRepository, TenancyTransaction};
use crate::tenancy::TenantLocator;

const TENANT_COLUMNS: &str = "id, name, slug, domain, created_at";
const PROFILE_COLUMNS: &str = "id, email, full_name, avatar_url, is_super_admin, created_at";

const MEMBERSHIP_WITH_TENANT: &str = r#"
    SELECT m.id, m.tenant_id, m.user_id, m.role, m.created_at,
           t.name AS tenant_name, t.slug AS tenant_slug, t.domain AS tenant_domain
    FROM memberships m
    JOIN tenants t ON t.id = m.tenant_id
    WHERE m.user_id = $1
"#;

/// PostgreSQL-backed repository
#[derive(Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[derive(FromRow)]
struct MembershipRow {
    id: Uuid,
    tenant_id: Uuid,
    user_id: Uuid,
    role: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<MembershipRow> for Membership {
    type Error = RepositoryError;

    fn try_from(row: MembershipRow) -> Result<Self, Self::Error> {
        Ok(Membership {
            id: row.id,
            tenant_id: row.tenant_id,
            user_id: row.user_id,
            role: row.role.parse().map_err(RepositoryError::Corrupt)?,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct MembershipTenantRow {
    #[sqlx(flatten)]
    membership: MembershipRow,
    tenant_name: String,
    tenant_slug: String,
    tenant_domain: Option<String>,
}

impl TryFrom<MembershipTenantRow> for MembershipWithTenant {
    type Error = RepositoryError;

    fn try_from(row: MembershipTenantRow) -> Result<Self, Self::Error> {
        let tenant = TenantSummary {
            id: row.membership.tenant_id,
            name: row.tenant_name,
            slug: row.tenant_slug,
            domain: row.tenant_domain,
        };
        Ok(MembershipWithTenant {
            membership: row.membership.try_into()?,
            tenant,
        })
    }
}

#[derive(FromRow)]
struct InvoiceRow {
    id: Uuid,
    tenant_id: Uuid,
    number: String,
    customer_name: String,
    amount: Decimal,
    currency: String,
    status: String,
    issued_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<InvoiceRow> for Invoice {
    type Error = RepositoryError;

    fn try_from(row: InvoiceRow) -> Result<Self, Self::Error> {
        Ok(Invoice {
            id: row.id,
            tenant_id: row.tenant_id,
            number: row.number,
            customer_name: row.customer_name,
            amount: row.amount,
            currency: row.currency,
            status: row.status.parse().map_err(RepositoryError::Corrupt)?,
            issued_at: row.issued_at,
            created_at: row.created_at,
        })
    }
}

async fn insert_tenant<'e, E>(executor: E, tenant: &NewTenant) -> Result<Tenant, RepositoryError>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    let query = format!(
        "INSERT INTO tenants (id, name, slug, domain) VALUES ($1, $2, $3, $4) RETURNING {}",
        TENANT_COLUMNS
    );
    let tenant = sqlx::query_as::<_, Tenant>(&query)
        .bind(Uuid::new_v4())
        .bind(&tenant.name)
        .bind(&tenant.slug)
        .bind(&tenant.domain)
        .fetch_one(executor)
        .await?;
    Ok(tenant)
}

#[async_trait]
impl TenancyRepository for PgRepository {
    async fn health_check(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn find_tenant(&self, locator: &TenantLocator) -> Result<Option<Tenant>, RepositoryError> {
        let (column, value) = match locator {
            TenantLocator::Slug(slug) => ("slug", slug),
            TenantLocator::Domain(domain) => ("domain", domain),
        };
        let query = format!("SELECT {} FROM tenants WHERE {} = $1", TENANT_COLUMNS, column);
        let tenant = sqlx::query_as::<_, Tenant>(&query)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;
        Ok(tenant)
    }

    async fn slug_taken(&self, slug: &str) -> Result<bool, RepositoryError> {
        let (taken,): (bool,) = sqlx::query_as("SELECT EXISTS (SELECT 1 FROM tenants WHERE slug = $1)")
            .bind(slug)
            .fetch_one(&self.pool)
            .await?;
        Ok(taken)
    }

    async fn domain_taken(&self, domain: &str) -> Result<bool, RepositoryError> {
        let (taken,): (bool,) = sqlx::query_as("SELECT EXISTS (SELECT 1 FROM tenants WHERE domain = $1)")
            .bind(domain)
            .fetch_one(&self.pool)
            .await?;
        Ok(taken)
    }

    async fn list_tenants(&self) -> Result<Vec<Tenant>, RepositoryError> {
        let query = format!("SELECT {} FROM tenants ORDER BY created_at DESC, id DESC", TENANT_COLUMNS);
        let tenants = sqlx::query_as::<_, Tenant>(&query).fetch_all(&self.pool).await?;
        Ok(tenants)
    }

    async fn upsert_tenant_by_slug(&self, tenant: &NewTenant) -> Result<Tenant, RepositoryError> {
        let query = format!(
            r#"
            INSERT INTO tenants (id, name, slug, domain) VALUES ($1, $2, $3, $4)
            ON CONFLICT (slug) DO UPDATE SET slug = EXCLUDED.slug
            RETURNING {}
            "#,
            TENANT_COLUMNS
        );
        let tenant = sqlx::query_as::<_, Tenant>(&query)
            .bind(Uuid::new_v4())
            .bind(&tenant.name)
            .bind(&tenant.slug)
            .bind(&tenant.domain)
            .fetch_one(&self.pool)
            .await?;
        Ok(tenant)
    }

    async fn delete_tenants_by_slug_prefix(&self, prefix: &str) -> Result<u64, RepositoryError> {
        let escaped = prefix.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
        let result = sqlx::query("DELETE FROM tenants WHERE slug LIKE $1 || '%'")
            .bind(escaped)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn reset_keeping_super_admins(&self) -> Result<DatabaseStats, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let invoices = sqlx::query("DELETE FROM invoices").execute(&mut *tx).await?;
        let memberships = sqlx::query("DELETE FROM memberships").execute(&mut *tx).await?;
        let tenants = sqlx::query("DELETE FROM tenants").execute(&mut *tx).await?;
        let profiles = sqlx::query("DELETE FROM profiles WHERE NOT is_super_admin")
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(DatabaseStats {
            tenants: tenants.rows_affected() as i64,
            memberships: memberships.rows_affected() as i64,
            profiles: profiles.rows_affected() as i64,
            invoices: invoices.rows_affected() as i64,
            audit_logs: 0,
        })
    }

    async fn first_membership_tenant(&self, user_id: Uuid) -> Result<Option<Tenant>, RepositoryError> {
        let tenant = sqlx::query_as::<_, Tenant>(
            r#"
            SELECT t.id, t.name, t.slug, t.domain, t.created_at
            FROM memberships m
            JOIN tenants t ON t.id = m.tenant_id
            WHERE m.user_id = $1
            ORDER BY m.created_at ASC, m.id ASC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(tenant)
    }

    async fn memberships_for_user(&self, user_id: Uuid) -> Result<Vec<MembershipWithTenant>, RepositoryError> {
        let query = format!("{} ORDER BY m.created_at ASC, m.id ASC", MEMBERSHIP_WITH_TENANT);
        sqlx::query_as::<_, MembershipTenantRow>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(MembershipWithTenant::try_from)
            .collect()
    }

    async fn latest_membership(&self, user_id: Uuid) -> Result<Option<MembershipWithTenant>, RepositoryError> {
        let query = format!("{} ORDER BY m.created_at DESC, m.id DESC LIMIT 1", MEMBERSHIP_WITH_TENANT);
        sqlx::query_as::<_, MembershipTenantRow>(&query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .map(MembershipWithTenant::try_from)
            .transpose()
    }

    async fn count_memberships(&self, user_id: Uuid) -> Result<i64, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM memberships WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn find_membership(&self, user_id: Uuid, tenant_id: Uuid) -> Result<Option<Membership>, RepositoryError> {
        sqlx::query_as::<_, MembershipRow>(
            "SELECT id, tenant_id, user_id, role, created_at FROM memberships WHERE user_id = $1 AND tenant_id = $2",
        )
        .bind(user_id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?
        .map(Membership::try_from)
        .transpose()
    }

    async fn list_invoices(&self, tenant_id: Uuid) -> Result<Vec<Invoice>, RepositoryError> {
        sqlx::query_as::<_, InvoiceRow>(
            r#"
            SELECT id, tenant_id, number, customer_name, amount, currency, status, issued_at, created_at
            FROM invoices
            WHERE tenant_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Invoice::try_from)
        .collect()
    }

    async fn find_profile(&self, id: Uuid) -> Result<Option<Profile>, RepositoryError> {
        let query = format!("SELECT {} FROM profiles WHERE id = $1", PROFILE_COLUMNS);
        let profile = sqlx::query_as::<_, Profile>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(profile)
    }

    async fn upsert_profile(&self, profile: &ProfileUpsert, mode: UpsertMode) -> Result<Profile, RepositoryError> {
        let on_conflict = match mode {
            // A no-op update so RETURNING still yields the existing row
            UpsertMode::KeepExisting => "DO UPDATE SET id = profiles.id",
            UpsertMode::Overwrite => {
                "DO UPDATE SET email = EXCLUDED.email, full_name = EXCLUDED.full_name, avatar_url = EXCLUDED.avatar_url"
            }
        };
        let query = format!(
            "INSERT INTO profiles (id, email, full_name, avatar_url) VALUES ($1, $2, $3, $4) ON CONFLICT (id) {} RETURNING {}",
            on_conflict, PROFILE_COLUMNS
        );
        let profile = sqlx::query_as::<_, Profile>(&query)
            .bind(profile.id)
            .bind(&profile.email)
            .bind(&profile.full_name)
            .bind(&profile.avatar_url)
            .fetch_one(&self.pool)
            .await?;
        Ok(profile)
    }

    async fn set_super_admin(&self, id: Uuid, is_super_admin: bool) -> Result<Profile, RepositoryError> {
        let query = format!(
            "UPDATE profiles SET is_super_admin = $2 WHERE id = $1 RETURNING {}",
            PROFILE_COLUMNS
        );
        sqlx::query_as::<_, Profile>(&query)
            .bind(id)
            .bind(is_super_admin)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("profile {}", id)))
    }

    async fn insert_audit_log(&self, entry: &NewAuditLog) -> Result<AuditLog, RepositoryError> {
        let log = sqlx::query_as::<_, AuditLog>(
            r#"
            INSERT INTO audit_logs (id, actor, action, target_type, target_id, metadata)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, actor, action, target_type, target_id, metadata, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(entry.actor)
        .bind(&entry.action)
        .bind(&entry.target_type)
        .bind(&entry.target_id)
        .bind(&entry.metadata)
        .fetch_one(&self.pool)
        .await?;
        Ok(log)
    }

    async fn stats(&self) -> Result<DatabaseStats, RepositoryError> {
        let (tenants, memberships, profiles, invoices, audit_logs): (i64, i64, i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM tenants),
                (SELECT COUNT(*) FROM memberships),
                (SELECT COUNT(*) FROM profiles),
                (SELECT COUNT(*) FROM invoices),
                (SELECT COUNT(*) FROM audit_logs)
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(DatabaseStats {
            tenants,
            memberships,
            profiles,
            invoices,
            audit_logs,
        })
    }

    async fn begin(&self) -> Result<Box<dyn TenancyTransaction>, RepositoryError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTransaction { tx }))
    }
}

/// Rolls back on drop unless committed
pub struct PgTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl TenancyTransaction for PgTransaction {
    async fn ensure_profile(&mut self, profile: &ProfileUpsert) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO profiles (id, email, full_name, avatar_url) VALUES ($1, $2, $3, $4) ON CONFLICT (id) DO NOTHING",
        )
        .bind(profile.id)
        .bind(&profile.email)
        .bind(&profile.full_name)
        .bind(&profile.avatar_url)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn count_memberships(&mut self, user_id: Uuid) -> Result<i64, RepositoryError> {
        // Serializes transactions for the same user until commit or rollback
        sqlx::query("SELECT id FROM profiles WHERE id = $1 FOR UPDATE")
            .bind(user_id)
            .fetch_optional(&mut *self.tx)
            .await?;
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM memberships WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(count)
    }

    async fn insert_tenant(&mut self, tenant: &NewTenant) -> Result<Tenant, RepositoryError> {
        insert_tenant(&mut *self.tx, tenant).await
    }

    async fn insert_membership(&mut self, membership: &NewMembership) -> Result<Membership, RepositoryError> {
        sqlx::query_as::<_, MembershipRow>(
            r#"
            INSERT INTO memberships (id, tenant_id, user_id, role)
            VALUES ($1, $2, $3, $4)
            RETURNING id, tenant_id, user_id, role, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(membership.tenant_id)
        .bind(membership.user_id)
        .bind(membership.role.as_str())
        .fetch_one(&mut *self.tx)
        .await?
        .try_into()
    }

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        self.tx.commit().await?;
        Ok(())
    }
}

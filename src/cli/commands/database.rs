use anyhow::Context;
use serde_json::json;

use crate::cli::utils::{output_success, output_table};
use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::database::models::NewTenant;
use crate::database::{DatabaseManager, PgRepository, TenancyRepository};

pub const TEST_SLUG_PREFIX: &str = "test-";

/// Sample tenant inserted by `portal seed`
pub fn sample_tenant() -> NewTenant {
    NewTenant {
        name: "Acme Corporation".to_string(),
        slug: "acme-corp".to_string(),
        domain: Some("acme.example.com".to_string()),
    }
}

async fn connect(config: &AppConfig) -> anyhow::Result<PgRepository> {
    config.require_database_url()?;
    let pool = DatabaseManager::connect(&config.database)
        .await
        .context("failed to connect to database")?;
    Ok(PgRepository::new(pool))
}

pub async fn migrate(config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let repo = connect(config).await?;
    DatabaseManager::migrate(repo.pool()).await?;
    output_success(output_format, "Migrations applied", None)
}

pub async fn seed(config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let repo = connect(config).await?;
    let tenant = repo.upsert_tenant_by_slug(&sample_tenant()).await?;
    output_success(
        output_format,
        &format!("Seeded tenant '{}' ({})", tenant.name, tenant.slug),
        Some(json!({ "tenant": tenant })),
    )
}

pub async fn status(config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    if let Err(e) = config.validate() {
        tracing::warn!("Configuration problem: {}", e);
    }
    let repo = connect(config).await?;
    repo.health_check().await?;
    let stats = repo.stats().await?;

    output_table(
        output_format,
        "database",
        &[
            ("tenants", stats.tenants),
            ("memberships", stats.memberships),
            ("profiles", stats.profiles),
            ("invoices", stats.invoices),
            ("audit_logs", stats.audit_logs),
        ],
    )
}

pub async fn clean_test_data(config: &AppConfig, prefix: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    if prefix.is_empty() {
        anyhow::bail!("refusing to delete with an empty slug prefix");
    }
    let repo = connect(config).await?;
    let deleted = repo.delete_tenants_by_slug_prefix(prefix).await?;
    output_success(
        output_format,
        &format!("Deleted {} tenant(s) with slug prefix '{}'", deleted, prefix),
        Some(json!({ "deleted_tenants": deleted })),
    )
}

pub async fn reset(config: &AppConfig, confirmed: bool, output_format: OutputFormat) -> anyhow::Result<()> {
    if !confirmed {
        anyhow::bail!("reset deletes every tenant and non super-admin profile; pass --yes to confirm");
    }
    let repo = connect(config).await?;
    let deleted = repo.reset_keeping_super_admins().await?;
    tracing::warn!(
        "Reset removed {} tenant(s) and {} profile(s)",
        deleted.tenants,
        deleted.profiles
    );
    output_success(
        output_format,
        &format!(
            "Deleted {} tenant(s), {} membership(s), {} invoice(s) and {} profile(s); super admins kept",
            deleted.tenants, deleted.memberships, deleted.invoices, deleted.profiles
        ),
        Some(json!({ "deleted": deleted })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryRepository;

    #[tokio::test]
    async fn seeding_twice_keeps_one_tenant() {
        let repo = MemoryRepository::new();
        let first = repo.upsert_tenant_by_slug(&sample_tenant()).await.unwrap();
        let second = repo.upsert_tenant_by_slug(&sample_tenant()).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(repo.stats().await.unwrap().tenants, 1);
    }

    #[tokio::test]
    async fn reset_requires_confirmation() {
        let config = AppConfig::from_lookup(|_| None);
        let err = reset(&config, false, OutputFormat::Text).await.unwrap_err();
        assert!(err.to_string().contains("--yes"));
    }

    #[test]
    fn sample_tenant_slug_is_valid() {
        assert!(crate::services::tenant_service::validate_slug(&sample_tenant().slug).is_ok());
        assert!(!sample_tenant().slug.starts_with(TEST_SLUG_PREFIX));
    }
}

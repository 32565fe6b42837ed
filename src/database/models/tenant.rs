use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Tenant {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub domain: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields accepted when creating a tenant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTenant {
    pub name: String,
    pub slug: String,
    pub domain: Option<String>,
}

impl NewTenant {
    /// Trim everything, lowercase slug and domain, drop an empty domain
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            slug: self.slug.trim().to_ascii_lowercase(),
            domain: self
                .domain
                .map(|d| d.trim().trim_end_matches('.').to_ascii_lowercase())
                .filter(|d| !d.is_empty()),
        }
    }
}

/// Compact tenant view embedded in membership listings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenantSummary {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub domain: Option<String>,
}

impl From<&Tenant> for TenantSummary {
    fn from(tenant: &Tenant) -> Self {
        Self {
            id: tenant.id,
            name: tenant.name.clone(),
            slug: tenant.slug.clone(),
            domain: tenant.domain.clone(),
        }
    }
}

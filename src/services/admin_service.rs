use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::database::models::{NewAuditLog, Profile, Tenant};
use crate::database::{RepositoryError, TenancyRepository};

pub const SET_SUPER_ADMIN_ACTION: &str = "set_super_admin";

#[derive(Debug, Error)]
pub enum AdminError {
    #[error("Super admin access required")]
    Forbidden,
    #[error("Cannot modify your own privileges")]
    SelfModification,
    #[error("User {0} not found")]
    UserNotFound(Uuid),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Super-admin console operations
pub struct AdminService {
    repo: Arc<dyn TenancyRepository>,
}

impl AdminService {
    pub fn new(repo: Arc<dyn TenancyRepository>) -> Self {
        Self { repo }
    }

    pub async fn require_super_admin(&self, user_id: Uuid) -> Result<Profile, AdminError> {
        match self.repo.find_profile(user_id).await? {
            Some(profile) if profile.is_super_admin => Ok(profile),
            _ => Err(AdminError::Forbidden),
        }
    }

    pub async fn list_tenants(&self) -> Result<Vec<Tenant>, AdminError> {
        Ok(self.repo.list_tenants().await?)
    }

    /// Grant or revoke super admin, recording an audit entry
    pub async fn set_super_admin(&self, actor: Uuid, target: Uuid, is_super_admin: bool) -> Result<Profile, AdminError> {
        if actor == target {
            return Err(AdminError::SelfModification);
        }

        let profile = self
            .repo
            .set_super_admin(target, is_super_admin)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound(_) => AdminError::UserNotFound(target),
                other => AdminError::Repository(other),
            })?;

        self.repo
            .insert_audit_log(&NewAuditLog {
                actor,
                action: SET_SUPER_ADMIN_ACTION.to_string(),
                target_type: "user".to_string(),
                target_id: target.to_string(),
                metadata: json!({ "to": is_super_admin }),
            })
            .await?;

        info!("User {} set super admin of {} to {}", actor, target, is_super_admin);
        Ok(profile)
    }
}

use std::sync::Arc;

use crate::auth::AuthProvider;
use crate::config::AppConfig;
use crate::database::TenancyRepository;
use crate::services::{AdminService, TenantService};

/// Shared, immutable application state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub repo: Arc<dyn TenancyRepository>,
    pub auth: Arc<dyn AuthProvider>,
}

impl AppState {
    pub fn new(config: AppConfig, repo: Arc<dyn TenancyRepository>, auth: Arc<dyn AuthProvider>) -> Self {
        Self {
            config: Arc::new(config),
            repo,
            auth,
        }
    }

    pub fn tenants(&self) -> TenantService {
        TenantService::new(self.repo.clone())
    }

    pub fn admin(&self) -> AdminService {
        AdminService::new(self.repo.clone())
    }

    pub fn secure_cookies(&self) -> bool {
        self.config.security.secure_cookies
    }
}

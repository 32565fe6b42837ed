pub mod admin_service;
pub mod tenant_service;

pub use admin_service::{AdminError, AdminService};
pub use tenant_service::{TenantError, TenantService};

// handlers/protected/mod.rs - Protected handlers (session required)
//
// Security Level: authenticated session
// Routes: /api/* (except /api/health), /dashboard, /onboarding
// Middleware: request gate rejects with 401 (API) or redirects to /login (pages)
// and sets x-user-id, which handlers read through `CurrentUser`.

pub mod pages;
pub mod tenant;
pub mod tenants;
pub mod user;

pub use pages::{dashboard, onboarding};
pub use tenant::{tenant_current, tenant_invoices};
pub use tenants::create_tenant;
pub use user::{profile_get, profile_post, user_memberships, user_tenant};

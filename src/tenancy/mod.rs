//! Tenant resolution from the request host and tenant cookies.
//!
//! The gate classifies the host ([`classify_host`]), asks the
//! [`TenantResolver`] what to do with the `tenant_slug` / `tenant_domain`
//! cookie pair, and writes the resulting [`CookieDirective`] to the response.

pub mod cookies;
pub mod host;
pub mod resolver;

pub use cookies::{clear_tenant_cookies, CookieDirective, TenantLocator, TENANT_DOMAIN_COOKIE, TENANT_SLUG_COOKIE};
pub use host::{classify_host, normalize_host, HostClass};
pub use resolver::TenantResolver;

pub mod audit_log;
pub mod invoice;
pub mod membership;
pub mod profile;
pub mod tenant;

pub use audit_log::{AuditLog, NewAuditLog};
pub use invoice::{Invoice, InvoiceStatus, NewInvoice};
pub use membership::{Membership, MembershipRole, MembershipWithTenant, NewMembership};
pub use profile::{Profile, ProfileUpsert, UpsertMode};
pub use tenant::{NewTenant, Tenant, TenantSummary};

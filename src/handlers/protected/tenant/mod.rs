pub mod current;
pub mod invoices;

pub use current::tenant_current;
pub use invoices::tenant_invoices;

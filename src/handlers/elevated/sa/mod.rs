pub mod console;
pub mod tenants;
pub mod users;

pub use console::console;
pub use tenants::sa_tenants;
pub use users::sa_users_patch;

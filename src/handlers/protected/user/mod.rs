pub mod memberships;
pub mod profile;
pub mod tenant;

pub use memberships::user_memberships;
pub use profile::{profile_get, profile_post};
pub use tenant::user_tenant;

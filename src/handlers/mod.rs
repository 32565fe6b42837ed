// handlers/mod.rs - 3-Tier Handler Architecture
//
// Public (no session) → Protected (session via the request gate) → Elevated (super admin)

pub mod elevated;
pub mod protected;
pub mod public;

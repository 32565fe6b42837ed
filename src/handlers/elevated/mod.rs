// handlers/elevated/mod.rs - Elevated handlers (super admin required)
//
// Security Level: authenticated session + profile.is_super_admin
// Routes: /sa, /api/sa/*
// Every handler calls `AdminService::require_super_admin` before doing work.

pub mod sa;

pub use sa::{console, sa_tenants, sa_users_patch};

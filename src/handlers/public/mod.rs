// handlers/public/mod.rs - Public handlers (no session required)
//
// Security Level: None
// Routes: /, /api/health, /login, /register, /auth/*
// Middleware: request gate only (tenant cookies, x-user-id stripping)

pub mod auth;
pub mod pages;
pub mod root;

pub use pages::{login_page, register_page};
pub use root::{health, index};

pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod server;
pub mod services;
pub mod state;
pub mod tenancy;

pub use error::ApiError;
pub use server::app;
pub use state::AppState;

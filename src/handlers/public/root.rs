// handlers/public/root.rs - GET / and GET /api/health

use axum::{extract::State, response::Json};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/**
 * GET / - Service name, version and endpoint summary
 */
pub async fn index() -> Json<Value> {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "description": env!("CARGO_PKG_DESCRIPTION"),
        "endpoints": {
            "public": ["/", "/api/health", "/login", "/register"],
            "auth": [
                "POST /auth/login",
                "POST /auth/register",
                "POST /auth/magic-link",
                "GET /auth/oauth/:provider",
                "GET /auth/callback",
                "POST /auth/logout"
            ],
            "protected": [
                "POST /api/tenants",
                "GET /api/tenant/current",
                "GET /api/tenant/invoices",
                "GET|POST /api/user/profile",
                "GET /api/user/memberships",
                "GET /api/user/tenant",
                "/dashboard",
                "/onboarding"
            ],
            "elevated": ["/sa", "GET /api/sa/tenants", "PATCH /api/sa/users"]
        }
    }))
}

/**
 * GET /api/health - Repository connectivity check
 *
 * 200 when the repository answers, 503 otherwise.
 */
pub async fn health(State(state): State<AppState>) -> ApiResult<Value> {
    state.repo.health_check().await.map_err(|e| {
        tracing::error!("Health check failed: {}", e);
        ApiError::service_unavailable("Database unavailable")
    })?;

    Ok(ApiResponse::success(json!({ "status": "ok", "database": "connected" })))
}

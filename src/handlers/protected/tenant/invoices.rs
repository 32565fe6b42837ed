// handlers/protected/tenant/invoices.rs - GET /api/tenant/invoices handler

use axum::extract::State;
use serde_json::{json, Value};

use crate::middleware::{ApiResponse, ApiResult, CurrentTenant, CurrentUser};
use crate::state::AppState;

/**
 * GET /api/tenant/invoices - Invoices of the cookie tenant, newest first
 *
 * 400 without a tenant cookie, 404 for an unknown tenant, 403 when the
 * caller holds no membership on it.
 */
pub async fn tenant_invoices(
    State(state): State<AppState>,
    user: CurrentUser,
    CurrentTenant(locator): CurrentTenant,
) -> ApiResult<Value> {
    let (_, invoices) = state.tenants().invoices_for(user.id, locator.as_ref()).await?;
    Ok(ApiResponse::success(json!({ "invoices": invoices })))
}

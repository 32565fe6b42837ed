// handlers/protected/tenant/current.rs - GET /api/tenant/current handler

use axum::extract::State;
use serde_json::{json, Value};

use crate::database::models::TenantSummary;
use crate::middleware::{ApiResponse, ApiResult, CurrentTenant, CurrentUser};
use crate::state::AppState;

/// Tenant selected by the tenant cookies
pub async fn tenant_current(
    State(state): State<AppState>,
    _user: CurrentUser,
    CurrentTenant(locator): CurrentTenant,
) -> ApiResult<Value> {
    let tenant = state.tenants().lookup(locator.as_ref()).await?;
    Ok(ApiResponse::success(json!({ "tenant": TenantSummary::from(&tenant) })))
}

// handlers/protected/tenants.rs - POST /api/tenants handler

use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::api::{JsonOrForm, PayloadKind};
use crate::auth::ProviderUser;
use crate::database::models::NewTenant;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, CurrentUser, SessionUser};
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTenantRequest {
    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    pub name: String,
    #[validate(length(min = 2, message = "Slug must be at least 2 characters"))]
    pub slug: String,
    #[serde(default)]
    pub domain: Option<String>,
}

/**
 * POST /api/tenants - Onboard a new tenant owned by the caller
 *
 * Expected Input (JSON or form):
 * ```json
 * {
 *   "name": "Acme Corp",          // Required: at least 2 characters
 *   "slug": "acme-corp",          // Required: lowercase letters, digits, hyphens
 *   "domain": "billing.acme.io"   // Optional: custom domain
 * }
 * ```
 *
 * Responses:
 * - 201 `{ "tenant": {...} }` for JSON
 * - 303 to `/dashboard` for forms
 * - 409 when the slug or domain is taken, or the caller already has a tenant
 */
pub async fn create_tenant(
    State(state): State<AppState>,
    current: CurrentUser,
    SessionUser(session_user): SessionUser,
    payload: JsonOrForm<CreateTenantRequest>,
) -> Result<Response, ApiError> {
    // x-user-id is authoritative; the session record only supplies profile fields
    let owner = ProviderUser {
        id: current.id,
        ..session_user
    };

    let JsonOrForm { value, kind } = payload;
    let tenant = state
        .tenants()
        .create_with_owner(
            &owner,
            NewTenant {
                name: value.name,
                slug: value.slug,
                domain: value.domain,
            },
        )
        .await?;

    Ok(match kind {
        PayloadKind::Form => Redirect::to(&state.config.url_for("/dashboard")).into_response(),
        PayloadKind::Json => ApiResponse::created(json!({ "tenant": tenant })).into_response(),
    })
}

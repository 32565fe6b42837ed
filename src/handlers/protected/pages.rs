// handlers/protected/pages.rs - GET /dashboard and GET /onboarding

use askama::Template;
use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
};

use crate::database::models::{Invoice, Tenant};
use crate::error::ApiError;
use crate::middleware::{CurrentTenant, CurrentUser};
use crate::services::TenantError;
use crate::state::AppState;

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub tenant: Tenant,
    pub invoices: Vec<Invoice>,
}

#[derive(Template)]
#[template(path = "onboarding.html")]
pub struct OnboardingTemplate {}

/// Tenant dashboard. Users without a usable tenant are sent to onboarding.
pub async fn dashboard(
    State(state): State<AppState>,
    user: CurrentUser,
    CurrentTenant(locator): CurrentTenant,
) -> Result<Response, ApiError> {
    let (tenant, invoices) = match state.tenants().invoices_for(user.id, locator.as_ref()).await {
        Ok(found) => found,
        Err(TenantError::NotSpecified | TenantError::NotFound | TenantError::AccessDenied) => {
            return Ok(Redirect::to("/onboarding").into_response());
        }
        Err(e) => return Err(e.into()),
    };

    Ok(DashboardTemplate { tenant, invoices }.into_response())
}

pub async fn onboarding(_user: CurrentUser) -> impl IntoResponse {
    OnboardingTemplate {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::InvoiceStatus;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    #[test]
    fn dashboard_escapes_tenant_and_invoice_text() {
        let tenant = Tenant {
            id: Uuid::new_v4(),
            name: "<script>alert(1)</script>".to_string(),
            slug: "acme".to_string(),
            domain: None,
            created_at: Utc::now(),
        };
        let invoice = Invoice {
            id: Uuid::new_v4(),
            tenant_id: tenant.id,
            number: "INV-001".to_string(),
            customer_name: "Tom & Jerry".to_string(),
            amount: Decimal::new(12_500, 2),
            currency: "USD".to_string(),
            status: InvoiceStatus::Paid,
            issued_at: None,
            created_at: Utc::now(),
        };

        let html = DashboardTemplate {
            tenant,
            invoices: vec![invoice],
        }
        .render()
        .unwrap();

        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("Tom &amp; Jerry"));
        assert!(html.contains("125.00 USD"));
        assert!(html.contains("<td>paid</td>"));
    }
}

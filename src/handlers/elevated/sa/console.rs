// handlers/elevated/sa/console.rs - GET /sa super-admin console

use askama::Template;
use axum::{
    extract::State,
    response::{IntoResponse, Response},
};

use crate::database::models::Tenant;
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::state::AppState;

#[derive(Template)]
#[template(path = "sa_console.html")]
pub struct ConsoleTemplate {
    pub tenants: Vec<Tenant>,
}

pub async fn console(State(state): State<AppState>, user: CurrentUser) -> Result<Response, ApiError> {
    let admin = state.admin();
    admin.require_super_admin(user.id).await?;

    let tenants = admin.list_tenants().await?;
    Ok(ConsoleTemplate { tenants }.into_response())
}

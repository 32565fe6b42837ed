// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::auth::AuthError;
use crate::config::ConfigError;
use crate::database::RepositoryError;
use crate::services::{AdminError, TenantError};

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    ValidationError {
        message: String,
        field_errors: Option<HashMap<String, String>>,
    },

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict(String),

    // 500 Internal Server Error
    InternalServerError(String),
    ConfigMissing(&'static str),

    // 502 Bad Gateway (auth provider issues)
    BadGateway(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::ValidationError { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::InternalServerError(_) | ApiError::ConfigMissing(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Client-safe error message
    pub fn message(&self) -> String {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::InternalServerError(msg)
            | ApiError::BadGateway(msg)
            | ApiError::ServiceUnavailable(msg) => msg.clone(),
            ApiError::ValidationError { message, .. } => message.clone(),
            ApiError::ConfigMissing(what) => format!("{} configuration missing", what),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::ValidationError { .. } => "VALIDATION_ERROR",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::ConfigMissing(_) => "CONFIGURATION_MISSING",
            ApiError::BadGateway(_) => "BAD_GATEWAY",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    pub fn to_json(&self) -> Value {
        let mut body = json!({
            "error": true,
            "message": self.message(),
            "code": self.error_code()
        });

        if let ApiError::ValidationError { field_errors: Some(field_errors), .. } = self {
            body["field_errors"] = json!(field_errors);
        }

        body
    }
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn validation_error(
        message: impl Into<String>,
        field_errors: Option<HashMap<String, String>>,
    ) -> Self {
        ApiError::ValidationError {
            message: message.into(),
            field_errors,
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        ApiError::BadGateway(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let field_errors = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let message = errs
                    .first()
                    .and_then(|e| e.message.as_ref().map(|m| m.to_string()))
                    .unwrap_or_else(|| "Invalid value".to_string());
                (field.to_string(), message)
            })
            .collect::<HashMap<_, _>>();

        ApiError::validation_error("Invalid input", Some(field_errors))
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(msg) => ApiError::not_found(msg),
            RepositoryError::UniqueViolation(constraint) => {
                ApiError::conflict(format!("Value already in use ({})", constraint))
            }
            RepositoryError::Conflict(msg) => ApiError::conflict(msg),
            RepositoryError::Unavailable(msg) => {
                tracing::error!("Repository unavailable: {}", msg);
                ApiError::service_unavailable("Database temporarily unavailable")
            }
            RepositoryError::Corrupt(msg) => {
                tracing::error!("Corrupt row: {}", msg);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
            RepositoryError::Sqlx(sqlx_err) => {
                // Log the real error but return generic message
                tracing::error!("SQLx error: {}", sqlx_err);
                ApiError::internal_server_error("Database error occurred")
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => ApiError::unauthorized("Invalid login credentials"),
            AuthError::InvalidSession(reason) => {
                tracing::debug!("Rejected session: {}", reason);
                ApiError::unauthorized("Unauthorized")
            }
            AuthError::NotConfigured(what) => {
                tracing::error!("Auth provider not configured: {}", what);
                ApiError::ConfigMissing("Auth provider")
            }
            AuthError::Rejected { status, message } if status < 500 => ApiError::bad_request(message),
            AuthError::Rejected { status, message } => {
                tracing::error!("Auth provider error ({}): {}", status, message);
                ApiError::bad_gateway("Authentication service error")
            }
            AuthError::Transport(e) => {
                tracing::error!("Auth provider unreachable: {}", e);
                ApiError::bad_gateway("Authentication service unavailable")
            }
        }
    }
}

impl From<TenantError> for ApiError {
    fn from(err: TenantError) -> Self {
        match err {
            TenantError::NotSpecified => ApiError::bad_request("No tenant specified"),
            TenantError::NotFound => ApiError::not_found("Tenant not found"),
            TenantError::AccessDenied => ApiError::forbidden("Access denied"),
            TenantError::InvalidSlug(reason) => {
                let mut field_errors = HashMap::new();
                field_errors.insert("slug".to_string(), reason.clone());
                ApiError::validation_error(reason, Some(field_errors))
            }
            e @ (TenantError::SlugTaken(_)
            | TenantError::DomainTaken(_)
            | TenantError::AlreadyMember
            | TenantError::Duplicate(_)) => ApiError::conflict(e.to_string()),
            TenantError::NoMembership => {
                ApiError::not_found("No tenant found for user. Please create or join a tenant first.")
            }
            TenantError::Repository(e) => e.into(),
        }
    }
}

impl From<AdminError> for ApiError {
    fn from(err: AdminError) -> Self {
        match err {
            AdminError::Forbidden => ApiError::forbidden("Super admin access required"),
            AdminError::SelfModification => ApiError::bad_request("You cannot modify your own privileges"),
            AdminError::UserNotFound(id) => ApiError::not_found(format!("User '{}' not found", id)),
            AdminError::Repository(e) => e.into(),
        }
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        tracing::error!("Configuration error: {}", err);
        match err {
            ConfigError::Missing(name) => ApiError::ConfigMissing(name),
            ConfigError::Invalid { name, .. } => ApiError::ConfigMissing(name),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_errors_carry_descriptive_message() {
        let err: ApiError = TenantError::SlugTaken("acme".to_string()).into();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert!(err.message().contains("acme"));
    }

    #[test]
    fn internal_errors_hide_details() {
        let err: ApiError = RepositoryError::Corrupt("role column held 'root'".to_string()).into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.message().contains("root"));
    }

    #[test]
    fn missing_membership_is_forbidden_not_missing() {
        let denied: ApiError = TenantError::AccessDenied.into();
        let missing: ApiError = TenantError::NotFound.into();
        assert_eq!(denied.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn config_missing_names_the_dependency() {
        let err: ApiError = ConfigError::Missing("DATABASE_URL").into();
        assert_eq!(err.to_json()["message"], "DATABASE_URL configuration missing");
        assert_eq!(err.to_json()["code"], "CONFIGURATION_MISSING");
    }
}

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
    http::header::CONTENT_TYPE,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    Json,
    Form,
}

/// Validated body accepted either as JSON or as an urlencoded HTML form.
///
/// Handlers use `kind` to answer forms with a redirect and JSON with data.
#[derive(Debug)]
pub struct JsonOrForm<T> {
    pub value: T,
    pub kind: PayloadKind,
}

#[async_trait]
impl<T, S> FromRequest<S> for JsonOrForm<T>
where
    T: DeserializeOwned + Validate + 'static,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let kind = match req.headers().get(CONTENT_TYPE).and_then(|v| v.to_str().ok()) {
            Some(ct) if ct.starts_with("application/x-www-form-urlencoded") => PayloadKind::Form,
            _ => PayloadKind::Json,
        };

        let body = Bytes::from_request(req, state)
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to read request body: {}", e)))?;

        let value: T = match kind {
            PayloadKind::Json => serde_json::from_slice(&body)
                .map_err(|e| ApiError::bad_request(format!("Invalid JSON body: {}", e)))?,
            PayloadKind::Form => serde_urlencoded::from_bytes(&body)
                .map_err(|e| ApiError::bad_request(format!("Invalid form body: {}", e)))?,
        };

        value.validate()?;
        Ok(Self { value, kind })
    }
}

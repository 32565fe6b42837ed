//! Hosted authentication provider seam.
//!
//! Credential storage, session issuance and OAuth code exchange all live in
//! an external GoTrue-compatible service. Everything the app needs from it
//! goes through [`AuthProvider`], so the gate and handlers can be exercised
//! against a scripted provider in tests.

pub mod claims;
pub mod hosted;
pub mod pkce;
pub mod session;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

pub use hosted::HostedAuthClient;
pub use pkce::PkcePair;

/// User record as reported by the auth provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: Value,
}

impl ProviderUser {
    pub fn new(id: Uuid, email: impl Into<String>) -> Self {
        Self {
            id,
            email: Some(email.into()),
            user_metadata: Value::Null,
        }
    }

    /// `full_name`, falling back to the OAuth `name` claim
    pub fn full_name(&self) -> Option<String> {
        self.metadata_str("full_name").or_else(|| self.metadata_str("name"))
    }

    pub fn avatar_url(&self) -> Option<String> {
        self.metadata_str("avatar_url")
    }

    fn metadata_str(&self, key: &str) -> Option<String> {
        self.user_metadata
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub expires_in: i64,
    pub user: ProviderUser,
}

/// Sign-up may or may not start a session, depending on whether the
/// provider requires e-mail confirmation.
#[derive(Debug, Clone)]
pub struct SignUpOutcome {
    pub user: ProviderUser,
    pub session: Option<AuthSession>,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid login credentials")]
    InvalidCredentials,

    #[error("Invalid session: {0}")]
    InvalidSession(String),

    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error("Auth provider rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError>;

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: Option<&str>,
    ) -> Result<SignUpOutcome, AuthError>;

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError>;

    async fn exchange_code_for_session(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<AuthSession, AuthError>;

    /// Resolve the user behind an access token
    async fn get_user(&self, access_token: &str) -> Result<ProviderUser, AuthError>;

    /// Send a passwordless sign-in link that lands on `redirect_to`
    async fn send_magic_link(
        &self,
        email: &str,
        redirect_to: &str,
        code_challenge: &str,
    ) -> Result<(), AuthError>;

    /// URL the browser should visit to start an OAuth sign-in
    fn authorize_url(
        &self,
        provider: &str,
        redirect_to: &str,
        code_challenge: &str,
    ) -> Result<String, AuthError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn full_name_falls_back_to_name() {
        let mut user = ProviderUser::new(Uuid::new_v4(), "ana@example.com");
        assert_eq!(user.full_name(), None);

        user.user_metadata = json!({ "name": "Ana Ruiz", "avatar_url": "https://img/a.png" });
        assert_eq!(user.full_name().as_deref(), Some("Ana Ruiz"));
        assert_eq!(user.avatar_url().as_deref(), Some("https://img/a.png"));

        user.user_metadata = json!({ "full_name": "Ana María Ruiz", "name": "Ana" });
        assert_eq!(user.full_name().as_deref(), Some("Ana María Ruiz"));
    }

    #[test]
    fn deserializes_provider_user_without_metadata() {
        let id = Uuid::new_v4();
        let user: ProviderUser = serde_json::from_value(json!({ "id": id })).unwrap();
        assert_eq!(user.id, id);
        assert_eq!(user.email, None);
    }
}

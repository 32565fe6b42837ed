use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::{AuthError, ProviderUser};

/// Audience the provider stamps on tokens for signed-in users
pub const AUTHENTICATED_AUDIENCE: &str = "authenticated";

/// Claims carried by a provider-issued access token
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    #[serde(default)]
    pub aud: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub user_metadata: Value,
    pub exp: i64,
    #[serde(default)]
    pub iat: i64,
}

impl From<Claims> for ProviderUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            email: claims.email,
            user_metadata: claims.user_metadata,
        }
    }
}

/// Verify an HS256 access token locally with the provider's signing secret
pub fn verify_access_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    if secret.is_empty() {
        return Err(AuthError::NotConfigured("AUTH_JWT_SECRET"));
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[AUTHENTICATED_AUDIENCE]);

    let token_data = decode::<Claims>(token, &decoding_key, &validation)
        .map_err(|e| AuthError::InvalidSession(format!("Invalid JWT token: {}", e)))?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    const SECRET: &str = "super-secret-jwt-token-with-at-least-32-characters";

    fn token_for(sub: Uuid, exp_offset: Duration, secret: &str) -> String {
        let now = Utc::now();
        let claims = Claims {
            sub,
            aud: Some(AUTHENTICATED_AUDIENCE.to_string()),
            email: Some("owner@acme.test".to_string()),
            role: Some("authenticated".to_string()),
            user_metadata: json!({ "full_name": "Acme Owner" }),
            exp: (now + exp_offset).timestamp(),
            iat: now.timestamp(),
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    #[test]
    fn accepts_valid_token() {
        let sub = Uuid::new_v4();
        let token = token_for(sub, Duration::hours(1), SECRET);

        let user: ProviderUser = verify_access_token(&token, SECRET).unwrap().into();
        assert_eq!(user.id, sub);
        assert_eq!(user.email.as_deref(), Some("owner@acme.test"));
        assert_eq!(user.full_name().as_deref(), Some("Acme Owner"));
    }

    #[test]
    fn rejects_wrong_secret() {
        let token = token_for(Uuid::new_v4(), Duration::hours(1), SECRET);
        let result = verify_access_token(&token, "a-different-secret-of-sufficient-size");
        assert!(matches!(result, Err(AuthError::InvalidSession(_))));
    }

    #[test]
    fn rejects_expired_token() {
        let token = token_for(Uuid::new_v4(), Duration::hours(-2), SECRET);
        assert!(matches!(
            verify_access_token(&token, SECRET),
            Err(AuthError::InvalidSession(_))
        ));
    }

    #[test]
    fn empty_secret_is_a_configuration_error() {
        assert!(matches!(
            verify_access_token("abc.def.ghi", ""),
            Err(AuthError::NotConfigured(_))
        ));
    }
}

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

use super::claims::verify_access_token;
use super::{AuthError, AuthProvider, AuthSession, ProviderUser, SignUpOutcome};
use crate::config::AuthConfig;

/// Client for a GoTrue-compatible auth REST API (`/auth/v1/*`)
#[derive(Clone)]
pub struct HostedAuthClient {
    http: Client,
    base_url: Option<Url>,
    anon_key: Option<String>,
    jwt_secret: Option<String>,
}

/// Error body shapes the provider uses across endpoints
#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl HostedAuthClient {
    /// Missing URL or key is tolerated here and reported per call, so the
    /// server can still boot and answer with a configuration error.
    pub fn from_config(config: &AuthConfig) -> Result<Self, AuthError> {
        let base_url = match config.url.as_deref() {
            Some(raw) => Some(Url::parse(raw).map_err(|e| AuthError::Rejected {
                status: 0,
                message: format!("invalid AUTH_URL: {}", e),
            })?),
            None => None,
        };

        Ok(Self {
            http: Client::new(),
            base_url,
            anon_key: config.anon_key.clone(),
            jwt_secret: config.jwt_secret.clone().filter(|s| !s.is_empty()),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, AuthError> {
        let base = self.base_url.as_ref().ok_or(AuthError::NotConfigured("AUTH_URL"))?;
        base.join(path).map_err(|e| AuthError::Rejected {
            status: 0,
            message: format!("invalid auth endpoint {}: {}", path, e),
        })
    }

    fn request(&self, builder: RequestBuilder) -> Result<RequestBuilder, AuthError> {
        let key = self.anon_key.as_deref().ok_or(AuthError::NotConfigured("AUTH_ANON_KEY"))?;
        Ok(builder.header("apikey", key))
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, AuthError> {
        let response = self.request(builder)?.send().await?;
        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }
        Ok(response.json::<T>().await?)
    }

    async fn rejection(response: Response) -> AuthError {
        let status = response.status();
        let message = match response.json::<ProviderErrorBody>().await {
            Ok(body) => body
                .error_description
                .or(body.msg)
                .or(body.message)
                .or(body.error)
                .unwrap_or_else(|| status.to_string()),
            Err(_) => status.to_string(),
        };

        AuthError::Rejected {
            status: status.as_u16(),
            message,
        }
    }
}

fn is_client_rejection(err: &AuthError) -> bool {
    matches!(err, AuthError::Rejected { status, .. }
        if *status == StatusCode::BAD_REQUEST.as_u16() || *status == StatusCode::UNAUTHORIZED.as_u16())
}

#[async_trait]
impl AuthProvider for HostedAuthClient {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let mut url = self.endpoint("auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", "password");

        self.send_json(self.http.post(url).json(&json!({ "email": email, "password": password })))
            .await
            .map_err(|e| if is_client_rejection(&e) { AuthError::InvalidCredentials } else { e })
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: Option<&str>,
    ) -> Result<SignUpOutcome, AuthError> {
        let url = self.endpoint("auth/v1/signup")?;
        let body = json!({
            "email": email,
            "password": password,
            "data": { "full_name": full_name },
        });

        // With autoconfirm the provider answers with a session, otherwise
        // with the bare (unconfirmed) user.
        let value: Value = self.send_json(self.http.post(url).json(&body)).await?;
        if value.get("access_token").is_some() {
            let session: AuthSession = serde_json::from_value(value).map_err(|e| AuthError::Rejected {
                status: 0,
                message: format!("unexpected sign-up payload: {}", e),
            })?;
            return Ok(SignUpOutcome {
                user: session.user.clone(),
                session: Some(session),
            });
        }

        let user: ProviderUser = serde_json::from_value(value).map_err(|e| AuthError::Rejected {
            status: 0,
            message: format!("unexpected sign-up payload: {}", e),
        })?;
        Ok(SignUpOutcome { user, session: None })
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let url = self.endpoint("auth/v1/logout")?;
        let response = self
            .request(self.http.post(url).bearer_auth(access_token))?
            .send()
            .await?;

        // An already-expired session counts as signed out
        if response.status().is_success() || response.status() == StatusCode::UNAUTHORIZED {
            Ok(())
        } else {
            Err(Self::rejection(response).await)
        }
    }

    async fn exchange_code_for_session(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<AuthSession, AuthError> {
        let mut url = self.endpoint("auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", "pkce");

        self.send_json(
            self.http
                .post(url)
                .json(&json!({ "auth_code": code, "code_verifier": code_verifier })),
        )
        .await
        .map_err(|e| if is_client_rejection(&e) { AuthError::InvalidSession(e.to_string()) } else { e })
    }

    async fn get_user(&self, access_token: &str) -> Result<ProviderUser, AuthError> {
        if let Some(secret) = &self.jwt_secret {
            return verify_access_token(access_token, secret).map(ProviderUser::from);
        }

        let url = self.endpoint("auth/v1/user")?;
        self.send_json(self.http.get(url).bearer_auth(access_token))
            .await
            .map_err(|e| match e {
                AuthError::Rejected { status, message } if status == 401 || status == 403 => {
                    AuthError::InvalidSession(message)
                }
                other => other,
            })
    }

    async fn send_magic_link(
        &self,
        email: &str,
        redirect_to: &str,
        code_challenge: &str,
    ) -> Result<(), AuthError> {
        let mut url = self.endpoint("auth/v1/otp")?;
        url.query_pairs_mut().append_pair("redirect_to", redirect_to);

        let body = json!({
            "email": email,
            "create_user": true,
            "code_challenge": code_challenge,
            "code_challenge_method": "s256",
        });
        let _: Value = self.send_json(self.http.post(url).json(&body)).await?;
        Ok(())
    }

    fn authorize_url(
        &self,
        provider: &str,
        redirect_to: &str,
        code_challenge: &str,
    ) -> Result<String, AuthError> {
        let mut url = self.endpoint("auth/v1/authorize")?;
        url.query_pairs_mut()
            .append_pair("provider", provider)
            .append_pair("redirect_to", redirect_to)
            .append_pair("code_challenge", code_challenge)
            .append_pair("code_challenge_method", "s256");
        Ok(url.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(url: Option<&str>) -> HostedAuthClient {
        HostedAuthClient::from_config(&AuthConfig {
            url: url.map(str::to_string),
            anon_key: Some("anon".to_string()),
            jwt_secret: None,
        })
        .unwrap()
    }

    #[test]
    fn builds_authorize_url() {
        let url = client(Some("https://auth.example.com/"))
            .authorize_url("github", "http://localhost:3000/auth/callback?next=/dashboard", "chal")
            .unwrap();

        let parsed = Url::parse(&url).unwrap();
        assert_eq!(parsed.path(), "/auth/v1/authorize");
        let pairs: Vec<(String, String)> = parsed.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("provider".to_string(), "github".to_string())));
        assert!(pairs.contains(&(
            "redirect_to".to_string(),
            "http://localhost:3000/auth/callback?next=/dashboard".to_string()
        )));
        assert!(pairs.contains(&("code_challenge_method".to_string(), "s256".to_string())));
    }

    #[test]
    fn missing_url_is_reported_per_call() {
        let result = client(None).authorize_url("github", "/", "chal");
        assert!(matches!(result, Err(AuthError::NotConfigured("AUTH_URL"))));
    }

    #[test]
    fn rejects_malformed_url() {
        let result = HostedAuthClient::from_config(&AuthConfig {
            url: Some("not a url".to_string()),
            anon_key: None,
            jwt_secret: None,
        });
        assert!(result.is_err());
    }
}

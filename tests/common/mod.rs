#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use tenant_portal::auth::{AuthError, AuthProvider, AuthSession, ProviderUser, SignUpOutcome};
use tenant_portal::config::AppConfig;
use tenant_portal::database::models::{MembershipRole, NewMembership, NewTenant, ProfileUpsert, Tenant};
use tenant_portal::database::MemoryRepository;
use tenant_portal::{app, AppState};

pub const PASSWORD: &str = "correct horse battery";

/// Auth provider that knows a fixed set of users by access token
#[derive(Default, Clone)]
pub struct ScriptedAuthProvider {
    users: Arc<Mutex<HashMap<String, ProviderUser>>>,
    codes: Arc<Mutex<HashMap<String, String>>>,
    signed_out: Arc<Mutex<Vec<String>>>,
}

impl ScriptedAuthProvider {
    /// Register a user and return the access token that identifies them
    pub fn add_user(&self, email: &str) -> (ProviderUser, String) {
        let user = ProviderUser::new(Uuid::new_v4(), email);
        let token = format!("token-{}", user.id);
        self.users.lock().unwrap().insert(token.clone(), user.clone());
        (user, token)
    }

    /// Accept `code` once the browser presents `verifier`
    pub fn expect_code(&self, code: &str, verifier: &str) {
        self.codes.lock().unwrap().insert(code.to_string(), verifier.to_string());
    }

    pub fn signed_out(&self) -> Vec<String> {
        self.signed_out.lock().unwrap().clone()
    }

    fn session_for(&self, user: &ProviderUser) -> AuthSession {
        AuthSession {
            access_token: format!("token-{}", user.id),
            refresh_token: format!("refresh-{}", user.id),
            expires_in: 3600,
            user: user.clone(),
        }
    }
}

#[async_trait]
impl AuthProvider for ScriptedAuthProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let users = self.users.lock().unwrap();
        let user = users
            .values()
            .find(|u| u.email.as_deref() == Some(email))
            .filter(|_| password == PASSWORD)
            .ok_or(AuthError::InvalidCredentials)?;
        Ok(self.session_for(user))
    }

    async fn sign_up(&self, email: &str, _password: &str, _full_name: Option<&str>) -> Result<SignUpOutcome, AuthError> {
        let (user, _) = self.add_user(email);
        Ok(SignUpOutcome { user, session: None })
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        self.signed_out.lock().unwrap().push(access_token.to_string());
        Ok(())
    }

    async fn exchange_code_for_session(&self, code: &str, code_verifier: &str) -> Result<AuthSession, AuthError> {
        let expected = self.codes.lock().unwrap().remove(code);
        if expected.as_deref() != Some(code_verifier) {
            return Err(AuthError::InvalidSession("bad code".to_string()));
        }
        let users = self.users.lock().unwrap();
        let user = users
            .values()
            .next()
            .ok_or_else(|| AuthError::InvalidSession("no users".to_string()))?;
        Ok(self.session_for(user))
    }

    async fn get_user(&self, access_token: &str) -> Result<ProviderUser, AuthError> {
        self.users
            .lock()
            .unwrap()
            .get(access_token)
            .cloned()
            .ok_or_else(|| AuthError::InvalidSession("unknown token".to_string()))
    }

    async fn send_magic_link(&self, _email: &str, _redirect_to: &str, _code_challenge: &str) -> Result<(), AuthError> {
        Ok(())
    }

    fn authorize_url(&self, provider: &str, redirect_to: &str, code_challenge: &str) -> Result<String, AuthError> {
        Ok(format!(
            "https://auth.test/authorize?provider={}&redirect_to={}&code_challenge={}",
            provider, redirect_to, code_challenge
        ))
    }
}

pub struct TestApp {
    pub router: Router,
    pub repo: MemoryRepository,
    pub auth: ScriptedAuthProvider,
}

impl TestApp {
    pub fn development() -> Self {
        Self::with_env(&[])
    }

    pub fn production() -> Self {
        Self::with_env(&[("APP_ENV", "production"), ("BASE_DOMAINS", "portal.test")])
    }

    pub fn with_env(vars: &[(&str, &str)]) -> Self {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        let config = AppConfig::from_lookup(|key| vars.get(key).cloned());
        let repo = MemoryRepository::new();
        let auth = ScriptedAuthProvider::default();
        let state = AppState::new(config, Arc::new(repo.clone()), Arc::new(auth.clone()));
        Self {
            router: app(state),
            repo,
            auth,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Tenant plus a membership for `user`
    pub async fn tenant_with_member(&self, user: &ProviderUser, slug: &str, domain: Option<&str>, role: MembershipRole) -> Tenant {
        let tenant = self
            .repo
            .insert_tenant(NewTenant {
                name: slug.to_string(),
                slug: slug.to_string(),
                domain: domain.map(str::to_string),
            })
            .await
            .unwrap();
        self.repo
            .insert_membership(NewMembership {
                tenant_id: tenant.id,
                user_id: user.id,
                role,
            })
            .await
            .unwrap();
        tenant
    }

    pub async fn profile(&self, user: &ProviderUser, is_super_admin: bool) {
        self.repo.insert_profile(ProfileUpsert::from(user), is_super_admin).await;
    }
}

pub const DEV_HOST: &str = "localhost:3000";

pub fn get(uri: &str) -> axum::http::request::Builder {
    get_on(DEV_HOST, uri)
}

pub fn post(uri: &str) -> axum::http::request::Builder {
    post_on(DEV_HOST, uri)
}

pub fn get_on(host: &str, uri: &str) -> axum::http::request::Builder {
    Request::builder().method("GET").uri(uri).header(header::HOST, host)
}

pub fn post_on(host: &str, uri: &str) -> axum::http::request::Builder {
    Request::builder().method("POST").uri(uri).header(header::HOST, host)
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

pub fn json_body(value: Value) -> Body {
    Body::from(serde_json::to_vec(&value).unwrap())
}

pub async fn read_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn read_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// All `Set-Cookie` values on the response
pub fn set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok().map(str::to_string))
        .collect()
}

/// The `Set-Cookie` value that writes `name`, if any
pub fn cookie_named(response: &Response<Body>, name: &str) -> Option<String> {
    let prefix = format!("{}=", name);
    set_cookies(response).into_iter().find(|c| c.starts_with(&prefix))
}

pub fn is_removal(cookie: &str) -> bool {
    cookie.contains("Max-Age=0")
}

pub fn location(response: &Response<Body>) -> Option<&str> {
    response.headers().get(header::LOCATION).and_then(|v| v.to_str().ok())
}

pub fn assert_status(response: &Response<Body>, status: StatusCode) {
    assert_eq!(response.status(), status, "unexpected status");
}

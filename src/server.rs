use anyhow::Context;
use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::auth::{AuthProvider, HostedAuthClient};
use crate::config::{AppConfig, ConfigError};
use crate::database::{DatabaseManager, MemoryRepository, PgRepository, TenancyRepository};
use crate::handlers::{elevated, protected, public};
use crate::middleware::request_gate;
use crate::state::AppState;

/// Full router with the request gate in front of every route
pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .merge(public_routes())
        .merge(auth_routes())
        .merge(protected_routes())
        .merge(elevated_routes())
        .layer(from_fn_with_state(state.clone(), request_gate))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(public::index))
        .route("/api/health", get(public::health))
        .route("/login", get(public::login_page))
        .route("/register", get(public::register_page))
}

fn auth_routes() -> Router<AppState> {
    use public::auth;

    Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/register", post(auth::register))
        .route("/auth/magic-link", post(auth::magic_link))
        .route("/auth/oauth/:provider", get(auth::oauth_start))
        .route("/auth/callback", get(auth::callback))
        .route("/auth/logout", post(auth::logout))
}

fn protected_routes() -> Router<AppState> {
    Router::new()
        // Pages
        .route("/dashboard", get(protected::dashboard))
        .route("/onboarding", get(protected::onboarding))
        // Tenants
        .route("/api/tenants", post(protected::create_tenant))
        .route("/api/tenant/current", get(protected::tenant_current))
        .route("/api/tenant/invoices", get(protected::tenant_invoices))
        // User
        .route(
            "/api/user/profile",
            get(protected::profile_get).post(protected::profile_post),
        )
        .route("/api/user/memberships", get(protected::user_memberships))
        .route("/api/user/tenant", get(protected::user_tenant))
}

fn elevated_routes() -> Router<AppState> {
    use axum::routing::patch;

    Router::new()
        .route("/sa", get(elevated::console))
        .route("/api/sa/tenants", get(elevated::sa_tenants))
        .route("/api/sa/users", patch(elevated::sa_users_patch))
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// Wire the repository and auth provider described by the configuration
pub async fn build_state(config: AppConfig) -> anyhow::Result<AppState> {
    if let Err(e) = config.require_auth() {
        warn!("{}; auth endpoints will answer with a configuration error", e);
    }

    let repo: Arc<dyn TenancyRepository> = match config.database.url.as_deref() {
        Some(_) => {
            let pool = DatabaseManager::connect(&config.database).await?;
            DatabaseManager::migrate(&pool).await?;
            Arc::new(PgRepository::new(pool))
        }
        None if config.environment.is_development() => {
            warn!("DATABASE_URL not set; using in-memory repository (data is lost on restart)");
            Arc::new(MemoryRepository::new())
        }
        None => return Err(ConfigError::Missing("DATABASE_URL").into()),
    };

    let auth: Arc<dyn AuthProvider> = Arc::new(HostedAuthClient::from_config(&config.auth)?);

    Ok(AppState::new(config, repo, auth))
}

pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    let port = config.server.port;
    let environment = config.environment;
    let state = build_state(config).await?;

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    info!("tenant-portal listening on http://{} ({:?})", bind_addr, environment);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
    }
}

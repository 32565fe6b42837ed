use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub tenancy: TenancyConfig,
    pub auth: AuthConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Environment {
    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    /// Public URL of the web app, used for absolute redirects after form posts
    pub app_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenancyConfig {
    /// Platform-owned domains whose subdomains map to tenant slugs
    pub base_domains: Vec<String>,
    /// Treat every host as a development host
    pub force_localhost: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    pub url: Option<String>,
    #[serde(skip_serializing)]
    pub anon_key: Option<String>,
    #[serde(skip_serializing)]
    pub jwt_secret: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(skip_serializing)]
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub secure_cookies: bool,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not configured")]
    Missing(&'static str),

    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let environment = match lookup("APP_ENV").as_deref() {
            Some("production") | Some("prod") => Environment::Production,
            Some("staging") | Some("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_overrides(&lookup)
    }

    fn with_overrides(mut self, lookup: &impl Fn(&str) -> Option<String>) -> Self {
        // Server
        if let Some(v) = lookup("PORT") {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Some(v) = lookup("APP_URL") {
            self.server.app_url = v.trim_end_matches('/').to_string();
        }

        // Tenancy
        if let Some(v) = lookup("BASE_DOMAINS") {
            self.tenancy.base_domains = parse_domain_list(&v);
        }
        if let Some(v) = lookup("FORCE_LOCALHOST") {
            self.tenancy.force_localhost = v.parse().unwrap_or(self.tenancy.force_localhost);
        }

        // Auth provider
        self.auth.url = lookup("AUTH_URL").filter(|v| !v.trim().is_empty()).or(self.auth.url);
        self.auth.anon_key = lookup("AUTH_ANON_KEY").filter(|v| !v.trim().is_empty()).or(self.auth.anon_key);
        self.auth.jwt_secret = lookup("AUTH_JWT_SECRET").filter(|v| !v.trim().is_empty()).or(self.auth.jwt_secret);

        // Database
        self.database.url = lookup("DATABASE_URL").filter(|v| !v.trim().is_empty()).or(self.database.url);
        if let Some(v) = lookup("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Some(v) = lookup("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Security
        if let Some(v) = lookup("SECURE_COOKIES") {
            self.security.secure_cookies = v.parse().unwrap_or(self.security.secure_cookies);
        }
        if let Some(v) = lookup("CORS_ORIGINS") {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        self
    }

    /// Check that everything needed to serve requests is present.
    ///
    /// The database URL may be omitted in development, where the server
    /// falls back to the in-memory repository.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.require_auth()?;

        if self.database.url.is_none() && !self.environment.is_development() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        if let Some(raw) = &self.database.url {
            url::Url::parse(raw).map_err(|e| ConfigError::Invalid {
                name: "DATABASE_URL",
                reason: e.to_string(),
            })?;
        }

        Ok(())
    }

    pub fn require_auth(&self) -> Result<(&str, &str), ConfigError> {
        let url = self.auth.url.as_deref().ok_or(ConfigError::Missing("AUTH_URL"))?;
        let key = self.auth.anon_key.as_deref().ok_or(ConfigError::Missing("AUTH_ANON_KEY"))?;
        Ok((url, key))
    }

    pub fn require_database_url(&self) -> Result<&str, ConfigError> {
        self.database.url.as_deref().ok_or(ConfigError::Missing("DATABASE_URL"))
    }

    /// Absolute URL on the public app for a path such as `/dashboard`
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.server.app_url, path)
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                port: 3000,
                app_url: "http://localhost:3000".to_string(),
            },
            tenancy: TenancyConfig {
                base_domains: Vec::new(),
                force_localhost: false,
            },
            auth: AuthConfig::default(),
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
            },
            security: SecurityConfig {
                secure_cookies: false,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:3001".to_string()],
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                port: 3000,
                app_url: "https://staging.example.com".to_string(),
            },
            tenancy: TenancyConfig {
                base_domains: Vec::new(),
                force_localhost: false,
            },
            auth: AuthConfig::default(),
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 10,
            },
            security: SecurityConfig {
                secure_cookies: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                port: 3000,
                app_url: "https://app.example.com".to_string(),
            },
            tenancy: TenancyConfig {
                base_domains: Vec::new(),
                force_localhost: false,
            },
            auth: AuthConfig::default(),
            database: DatabaseConfig {
                url: None,
                max_connections: 50,
                connection_timeout: 5,
            },
            security: SecurityConfig {
                secure_cookies: true,
                cors_origins: vec!["https://app.example.com".to_string()],
            },
        }
    }
}

/// Lowercased, dot-trimmed, de-duplicated list of domains
fn parse_domain_list(raw: &str) -> Vec<String> {
    let mut domains: Vec<String> = Vec::new();
    for domain in raw.split(',') {
        let domain = domain.trim().trim_matches('.').to_ascii_lowercase();
        if !domain.is_empty() && !domains.contains(&domain) {
            domains.push(domain);
        }
    }
    domains
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::from_lookup(lookup_from(&[]));
        assert_eq!(config.environment, Environment::Development);
        assert!(!config.security.secure_cookies);
        assert!(config.tenancy.base_domains.is_empty());
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::from_lookup(lookup_from(&[("APP_ENV", "production")]));
        assert_eq!(config.environment, Environment::Production);
        assert!(config.security.secure_cookies);
        assert_eq!(config.database.max_connections, 50);
    }

    #[test]
    fn parses_base_domains() {
        let config = AppConfig::from_lookup(lookup_from(&[(
            "BASE_DOMAINS",
            " Example.com , .saas.io,,example.com ",
        )]));
        assert_eq!(config.tenancy.base_domains, vec!["example.com", "saas.io"]);
    }

    #[test]
    fn validate_reports_missing_auth() {
        let config = AppConfig::from_lookup(lookup_from(&[]));
        assert_eq!(config.validate(), Err(ConfigError::Missing("AUTH_URL")));

        let config = AppConfig::from_lookup(lookup_from(&[("AUTH_URL", "https://auth.example.com")]));
        assert_eq!(config.validate(), Err(ConfigError::Missing("AUTH_ANON_KEY")));
    }

    #[test]
    fn production_requires_database_url() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("APP_ENV", "production"),
            ("AUTH_URL", "https://auth.example.com"),
            ("AUTH_ANON_KEY", "anon"),
        ]));
        assert_eq!(config.validate(), Err(ConfigError::Missing("DATABASE_URL")));
    }

    #[test]
    fn development_allows_missing_database_url() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("AUTH_URL", "https://auth.example.com"),
            ("AUTH_ANON_KEY", "anon"),
        ]));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn auth_settings_default_to_unset() {
        let config = AppConfig::from_lookup(lookup_from(&[]));
        assert!(config.auth.url.is_none() && config.auth.anon_key.is_none() && config.auth.jwt_secret.is_none());
        assert_eq!(config.require_auth(), Err(ConfigError::Missing("AUTH_URL")));
    }

    #[test]
    fn url_for_joins_app_url() {
        let config = AppConfig::from_lookup(lookup_from(&[("APP_URL", "https://app.acme.io/")]));
        assert_eq!(config.url_for("/dashboard"), "https://app.acme.io/dashboard");
    }
}

//! Server configuration loaded from environment variables.
//!
//! Environment variables (a `.env` file is honored via `dotenvy`):
//!   DATABASE_URL          - PostgreSQL connection string
//!   HOST / PORT           - bind address (default 0.0.0.0:3000)
//!   PUBLIC_BASE_URL       - externally visible origin, used for the OAuth redirect URI
//!   SESSION_TTL_HOURS     - session lifetime (default 720)
//!   COOKIE_SECURE         - mark the session cookie Secure (default true)
//!   DB_MAX_CONNECTIONS    - pool size (default 10)
//!   DB_MIN_CONNECTIONS    - connections kept open while idle (default 1)
//!   DB_ACQUIRE_TIMEOUT_SECS - wait for a free connection (default 30)
//!   DB_IDLE_TIMEOUT_SECS  - close idle connections after (default 600)
//!   CORS_ALLOWED_ORIGINS  - comma-separated origins allowed with credentials
//!   OAUTH_CLIENT_ID, OAUTH_CLIENT_SECRET, OAUTH_AUTH_URL,
//!   OAUTH_TOKEN_URL, OAUTH_USERINFO_URL - identity provider (required)
//!   OAUTH_SCOPES          - requested scopes (default "openid email")

use chrono::Duration;

use notekeep_core::defaults;
use notekeep_core::{Error, Result};
use notekeep_db::PoolConfig;

/// Identity provider endpoints and client credentials.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub auth_url: String,
    pub token_url: String,
    pub userinfo_url: String,
    pub scopes: String,
}

/// Complete server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub public_base_url: String,
    pub session_ttl: Duration,
    pub cookie_secure: bool,
    pub pool: PoolConfig,
    pub cors_allowed_origins: Vec<String>,
    pub oauth: OAuthConfig,
}

impl ServerConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| {
            var(key).ok_or_else(|| Error::Config(format!("{} must be set", key)))
        };

        let port = parse_or(var("PORT"), "PORT", defaults::PORT)?;
        let session_ttl_hours = parse_or(
            var("SESSION_TTL_HOURS"),
            "SESSION_TTL_HOURS",
            defaults::SESSION_TTL_HOURS,
        )?;
        if session_ttl_hours <= 0 {
            return Err(Error::Config("SESSION_TTL_HOURS must be positive".to_string()));
        }

        let max_connections = parse_or(
            var("DB_MAX_CONNECTIONS"),
            "DB_MAX_CONNECTIONS",
            defaults::DB_MAX_CONNECTIONS,
        )?;
        if max_connections == 0 {
            return Err(Error::Config("DB_MAX_CONNECTIONS must be positive".to_string()));
        }
        let pool = PoolConfig::new()
            .max_connections(max_connections)
            .min_connections(parse_or(
                var("DB_MIN_CONNECTIONS"),
                "DB_MIN_CONNECTIONS",
                defaults::DB_MIN_CONNECTIONS,
            )?)
            .acquire_timeout(std::time::Duration::from_secs(parse_or(
                var("DB_ACQUIRE_TIMEOUT_SECS"),
                "DB_ACQUIRE_TIMEOUT_SECS",
                defaults::DB_ACQUIRE_TIMEOUT_SECS,
            )?))
            .idle_timeout(std::time::Duration::from_secs(parse_or(
                var("DB_IDLE_TIMEOUT_SECS"),
                "DB_IDLE_TIMEOUT_SECS",
                defaults::DB_IDLE_TIMEOUT_SECS,
            )?));

        let public_base_url = var("PUBLIC_BASE_URL")
            .unwrap_or_else(|| format!("http://localhost:{}", port))
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            host: var("HOST").unwrap_or_else(|| defaults::HOST.to_string()),
            port,
            public_base_url,
            session_ttl: Duration::hours(session_ttl_hours),
            cookie_secure: parse_bool(var("COOKIE_SECURE"), "COOKIE_SECURE", true)?,
            pool,
            cors_allowed_origins: var("CORS_ALLOWED_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            oauth: OAuthConfig {
                client_id: required("OAUTH_CLIENT_ID")?,
                client_secret: required("OAUTH_CLIENT_SECRET")?,
                auth_url: required("OAUTH_AUTH_URL")?,
                token_url: required("OAUTH_TOKEN_URL")?,
                userinfo_url: required("OAUTH_USERINFO_URL")?,
                scopes: var("OAUTH_SCOPES").unwrap_or_else(|| defaults::OAUTH_SCOPES.to_string()),
            },
        })
    }

    /// Redirect URI registered with the identity provider.
    pub fn redirect_uri(&self) -> String {
        format!("{}/auth/callback", self.public_base_url)
    }
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, key: &str, default: T) -> Result<T> {
    match value {
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("{} has invalid value '{}'", key, v))),
        None => Ok(default),
    }
}

fn parse_bool(value: Option<String>, key: &str, default: bool) -> Result<bool> {
    match value.as_deref().map(str::trim) {
        None => Ok(default),
        Some("true") | Some("1") => Ok(true),
        Some("false") | Some("0") => Ok(false),
        Some(other) => Err(Error::Config(format!(
            "{} has invalid value '{}'",
            key, other
        ))),
    }
}

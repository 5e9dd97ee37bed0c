use std::env;
use std::net::SocketAddr;
use anyhow::{Context, Result};
use zeroize::{Zeroize, Zeroizing};

/// The minimum accepted length of the token-signing secret, in bytes.
const MIN_SECRET_LEN: usize = 32;

/// The application's configuration.
#[derive(Clone)]
pub struct Config {
    /// The URL of the PostgreSQL database, credentials included.
    pub database_url: String,
    /// The maximum number of pooled database connections.
    pub database_max_connections: usize,
    /// The secret used to sign access tokens.
    pub jwt_secret: Zeroizing<Vec<u8>>,
    /// The lifetime of an access token in hours.
    pub token_ttl_hours: i64,
    /// The address the HTTP server binds to.
    pub bind_addr: SocketAddr,
    /// The origins allowed by CORS.
    pub cors_origins: Vec<String>,
    /// Optional admin account created or refreshed at startup.
    pub bootstrap_admin: Option<BootstrapAdmin>,
    /// Whether login and API routes are rate limited.
    pub rate_limit_enabled: bool,
}

/// Admin credentials read from the environment at startup.
#[derive(Clone)]
pub struct BootstrapAdmin {
    pub username: String,
    pub password: Zeroizing<String>,
}

impl Config {
    /// Creates a new `Config` from environment variables.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `Config`.
    pub fn from_env() -> Result<Self> {
        let mut secret = env::var("JWT_SECRET")
            .context("JWT_SECRET must be set (generate with: openssl rand -hex 32)")?;
        let jwt_secret = Zeroizing::new(secret.as_bytes().to_vec());
        secret.zeroize();

        if jwt_secret.len() < MIN_SECRET_LEN {
            anyhow::bail!("JWT_SECRET must be at least {} bytes", MIN_SECRET_LEN);
        }

        let bootstrap_admin = match (env::var("ADMIN_USERNAME"), env::var("ADMIN_PASSWORD")) {
            (Ok(username), Ok(password)) => Some(BootstrapAdmin {
                username,
                password: Zeroizing::new(password),
            }),
            (Ok(_), Err(_)) => anyhow::bail!("ADMIN_PASSWORD must be set when ADMIN_USERNAME is"),
            _ => None,
        };

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .context("DATABASE_URL must be set")?,
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "16".to_string())
                .parse()
                .context("Invalid DATABASE_MAX_CONNECTIONS")?,
            jwt_secret,
            token_ttl_hours: env::var("TOKEN_TTL_HOURS")
                .unwrap_or_else(|_| "12".to_string())
                .parse()
                .context("Invalid TOKEN_TTL_HOURS")?,
            bind_addr: env::var("BIND_ADDR")
                .unwrap_or_else(|_| "127.0.0.1:5001".to_string())
                .parse()
                .context("Invalid BIND_ADDR")?,
            cors_origins: parse_origins(
                &env::var("CORS_ORIGINS").unwrap_or_else(|_| "http://localhost:3000".to_string()),
            ),
            bootstrap_admin,
            rate_limit_enabled: env::var("RATE_LIMIT_ENABLED")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .context("Invalid RATE_LIMIT_ENABLED (expected true or false)")?,
        })
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
impl Config {
    /// A configuration for in-process tests; nothing here is read from the environment.
    pub fn for_tests() -> Self {
        Self {
            database_url: "postgres://unused@localhost/unused".to_string(),
            database_max_connections: 1,
            jwt_secret: Zeroizing::new(b"test-secret-test-secret-test-secret!".to_vec()),
            token_ttl_hours: 1,
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            cors_origins: vec!["http://localhost:3000".to_string()],
            bootstrap_admin: None,
            rate_limit_enabled: false,
        }
    }
}

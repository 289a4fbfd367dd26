//! Configuration loaded from environment variables.

use std::env;

use anyhow::{Context, Result};

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port (default: 3000).
    pub port: u16,

    /// PostgreSQL connection URL. Only required when running against
    /// PostgreSQL.
    pub database_url: Option<String>,

    /// Maximum database connections in pool (default: 10).
    pub database_max_connections: u32,

    /// Redis connection URL for sessions.
    pub redis_url: String,

    /// CORS allowed origins (comma-separated, default: "*").
    pub cors_allowed_origins: Vec<String>,

    /// Cookie SameSite policy: "strict", "lax", or "none" (default: "strict").
    pub cookie_same_site: String,

    /// Send the session cookie only over HTTPS (default: true).
    pub cookie_secure: bool,

    /// Site name shown in exported documents (default: "Inkwell").
    pub site_name: String,

    /// Language tag of exported documents (default: "en").
    pub site_lang: String,

    /// Emails seeded into the signup whitelist as readers at startup.
    pub signup_whitelist: Vec<String>,

    /// Email seeded into the signup whitelist as admin at startup.
    pub bootstrap_admin_email: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .context("PORT must be a valid u16")?;

        let database_url = env::var("DATABASE_URL").ok().filter(|v| !v.is_empty());

        let database_max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .context("DATABASE_MAX_CONNECTIONS must be a valid u32")?;

        let redis_url =
            env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .map(|v| split_list(&v))
            .unwrap_or_else(|_| vec!["*".to_string()]);

        let cookie_same_site = env::var("COOKIE_SAME_SITE")
            .unwrap_or_else(|_| "strict".to_string())
            .to_lowercase();

        let cookie_secure = env::var("COOKIE_SECURE")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .context("COOKIE_SECURE must be true or false")?;

        let site_name = env::var("SITE_NAME").unwrap_or_else(|_| "Inkwell".to_string());

        let site_lang = env::var("SITE_LANG")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "en".to_string());

        let signup_whitelist = env::var("SIGNUP_WHITELIST")
            .map(|v| split_list(&v))
            .unwrap_or_default();

        let bootstrap_admin_email = env::var("BOOTSTRAP_ADMIN_EMAIL")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        Ok(Self {
            port,
            database_url,
            database_max_connections,
            redis_url,
            cors_allowed_origins,
            cookie_same_site,
            cookie_secure,
            site_name,
            site_lang,
            signup_whitelist,
            bootstrap_admin_email,
        })
    }

    /// The database URL, or an error naming the missing variable.
    pub fn require_database_url(&self) -> Result<&str> {
        self.database_url
            .as_deref()
            .context("DATABASE_URL environment variable is required")
    }
}

impl Default for Config {
    /// Settings for local runs and tests: no database, no bootstrap users.
    fn default() -> Self {
        Self {
            port: 3000,
            database_url: None,
            database_max_connections: 10,
            redis_url: "redis://127.0.0.1:6379".to_string(),
            cors_allowed_origins: vec!["*".to_string()],
            cookie_same_site: "strict".to_string(),
            cookie_secure: true,
            site_name: "Inkwell".to_string(),
            site_lang: "en".to_string(),
            signup_whitelist: Vec::new(),
            bootstrap_admin_email: None,
        }
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

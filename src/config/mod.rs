use once_cell::sync::Lazy;
use std::env;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub port: u16,
    pub client_origin: Option<String>,
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,
    pub client_dist_dir: String,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("invalid value for environment variable: {0}")]
    Invalid(&'static str),
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = if development_mode() {
            Environment::Development
        } else {
            Environment::Production
        };

        let port = match env::var("PORT") {
            Ok(v) => v.parse().map_err(|_| ConfigError::Invalid("PORT"))?,
            Err(_) => 3000,
        };

        let jwt_expiry_hours = match env::var("JWT_EXPIRY_HOURS") {
            Ok(v) => v.parse().map_err(|_| ConfigError::Invalid("JWT_EXPIRY_HOURS"))?,
            Err(_) => 24 * 7,
        };

        Ok(Self {
            environment,
            port,
            client_origin: env::var("CLIENT_ORIGIN").ok(),
            database_url: env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?,
            jwt_secret: env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))?,
            jwt_expiry_hours,
            client_dist_dir: env::var("CLIENT_DIST_DIR").unwrap_or_else(|_| "client/dist".to_string()),
            max_request_size_bytes: 10 * 1024 * 1024,
        })
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }
}

/// True unless APP_ENV selects production. Reads the environment directly so
/// error rendering can consult it before the config singleton exists.
pub fn development_mode() -> bool {
    !matches!(env::var("APP_ENV").as_deref(), Ok("production") | Ok("prod"))
}

// Global singleton config - initialized once at startup. The process refuses
// to start without the required variables.
pub static CONFIG: Lazy<AppConfig> = Lazy::new(|| match AppConfig::from_env() {
    Ok(config) => config,
    Err(e) => {
        eprintln!("configuration error: {}", e);
        tracing::error!("configuration error: {}", e);
        std::process::exit(1);
    }
});

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

//! API configuration module.
//!
//! Configuration is layered with the `config` crate:
//!
//! ```text
//! built-in defaults  →  daftar.toml (optional)  →  DAFTAR_* environment
//!     (lowest)                                          (highest)
//! ```
//!
//! | Key                   | Env var                      | Default              |
//! |-----------------------|------------------------------|----------------------|
//! | `host`                | `DAFTAR_HOST`                | `0.0.0.0`            |
//! | `port`                | `DAFTAR_PORT`                | `8080`               |
//! | `database_path`       | `DAFTAR_DATABASE_PATH`       | `./daftar.db`        |
//! | `max_connections`     | `DAFTAR_MAX_CONNECTIONS`     | `5`                  |
//! | `jwt_secret`          | `DAFTAR_JWT_SECRET`          | dev secret           |
//! | `jwt_lifetime_secs`   | `DAFTAR_JWT_LIFETIME_SECS`   | `28800` (8 hours)    |

use serde::{Deserialize, Serialize};

/// Development-only signing secret. Must be overridden in production.
pub const DEV_JWT_SECRET: &str = "daftar-dev-secret-change-in-production";

/// API server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Bind host
    pub host: String,

    /// HTTP port
    pub port: u16,

    /// SQLite database file
    pub database_path: String,

    /// Pool size
    pub max_connections: u32,

    /// JWT secret key for signing tokens
    pub jwt_secret: String,

    /// JWT access token lifetime in seconds
    pub jwt_lifetime_secs: i64,
}

impl ApiConfig {
    /// Loads configuration from defaults, `daftar.toml` and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", 8080)?
            .set_default("database_path", "./daftar.db")?
            .set_default("max_connections", 5)?
            .set_default("jwt_secret", DEV_JWT_SECRET)?
            .set_default("jwt_lifetime_secs", 28_800)?
            .add_source(config::File::with_name("daftar").required(false))
            .add_source(config::Environment::with_prefix("DAFTAR").try_parsing(true))
            .build()?;

        let config: ApiConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Checks values the type system cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("jwt_secret".to_string()));
        }
        if self.jwt_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue("jwt_lifetime_secs".to_string()));
        }
        if self.max_connections == 0 {
            return Err(ConfigError::InvalidValue("max_connections".to_string()));
        }
        Ok(())
    }

    /// `host:port` for the listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Whether the built-in development secret is still in use.
    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ApiConfig {
        ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 9000,
            database_path: ":memory:".to_string(),
            max_connections: 1,
            jwt_secret: "secret".to_string(),
            jwt_lifetime_secs: 60,
        }
    }

    #[test]
    fn test_bind_address() {
        assert_eq!(sample().bind_address(), "127.0.0.1:9000");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = sample();
        config.jwt_secret = "  ".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::MissingRequired(_))));

        let mut config = sample();
        config.jwt_lifetime_secs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue(_))));

        assert!(sample().validate().is_ok());
    }
}

use serde::{Deserialize, Serialize};
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid listen address '{0}'")]
    InvalidListenAddress(String),

    #[error("JWT secret must be at least {min} bytes, got {actual}")]
    WeakJwtSecret { min: usize, actual: usize },

    #[error("Token validity must be between 1 and {max} minutes, got {actual}")]
    InvalidTokenValidity { max: i64, actual: i64 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub security: SecurityConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub sqlite_file: PathBuf,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub listen_address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// HMAC key for HS512 tokens. `None` means a random key is generated at startup,
    /// which invalidates every issued token on restart.
    #[serde(skip_serializing)]
    pub jwt_secret: Option<String>,
    pub token_validity_minutes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub default_filter: String,
}

pub const MIN_JWT_SECRET_LEN: usize = 32;
/// One year.
pub const MAX_TOKEN_VALIDITY_MINUTES: i64 = 60 * 24 * 365;

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Database overrides
        if let Ok(v) = env::var("BOOKSTORE_SQLITE_FILE") {
            self.database.sqlite_file = PathBuf::from(v);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Server overrides
        if let Ok(v) = env::var("BOOKSTORE_LISTEN_ADDR") {
            self.server.listen_address = v;
        }

        // Security overrides
        if let Ok(v) = env::var("BOOKSTORE_JWT_SECRET") {
            if !v.is_empty() {
                self.security.jwt_secret = Some(v);
            }
        }
        if let Ok(v) = env::var("BOOKSTORE_TOKEN_VALIDITY_MINUTES") {
            self.security.token_validity_minutes =
                v.parse().unwrap_or(self.security.token_validity_minutes);
        }

        if let Ok(v) = env::var("BOOKSTORE_LOG") {
            self.logging.default_filter = v;
        }

        self
    }

    /// Settings for tests: in-memory database and a fixed signing key.
    pub fn for_tests() -> Self {
        let mut config = Self::development();
        config.database.sqlite_file = PathBuf::from(":memory:");
        config.database.max_connections = 1;
        config.server.listen_address = "127.0.0.1:0".to_string();
        config.security.jwt_secret = Some("test-secret-test-secret-test-secret!".to_string());
        config
    }

    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.server
            .listen_address
            .parse()
            .map_err(|_| ConfigError::InvalidListenAddress(self.server.listen_address.clone()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.listen_addr()?;
        if let Some(secret) = &self.security.jwt_secret {
            if secret.len() < MIN_JWT_SECRET_LEN {
                return Err(ConfigError::WeakJwtSecret {
                    min: MIN_JWT_SECRET_LEN,
                    actual: secret.len(),
                });
            }
        }
        let validity = self.security.token_validity_minutes;
        if !(1..=MAX_TOKEN_VALIDITY_MINUTES).contains(&validity) {
            return Err(ConfigError::InvalidTokenValidity {
                max: MAX_TOKEN_VALIDITY_MINUTES,
                actual: validity,
            });
        }
        Ok(())
    }

    pub fn is_in_memory(&self) -> bool {
        self.database.sqlite_file.as_os_str() == ":memory:"
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                sqlite_file: PathBuf::from("bookstore.sqlite"),
                max_connections: 5,
                connection_timeout: 30,
            },
            server: ServerConfig {
                listen_address: "0.0.0.0:8080".to_string(),
            },
            security: SecurityConfig {
                jwt_secret: None,
                token_validity_minutes: 15,
            },
            logging: LoggingConfig {
                default_filter: "bookstore=debug,tower_http=debug".to_string(),
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                sqlite_file: PathBuf::from("bookstore.sqlite"),
                max_connections: 10,
                connection_timeout: 5,
            },
            server: ServerConfig {
                listen_address: "0.0.0.0:8080".to_string(),
            },
            security: SecurityConfig {
                jwt_secret: None,
                token_validity_minutes: 15,
            },
            logging: LoggingConfig {
                default_filter: "bookstore=info,tower_http=info".to_string(),
            },
        }
    }
}

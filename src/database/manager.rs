use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;

/// The persisted entity a storage failure relates to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    User,
    Book,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entity::User => write!(f, "user"),
            Entity::Book => write!(f, "book"),
        }
    }
}

/// Errors from the storage layer
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to open database {path}: {source}")]
    Connect {
        path: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Failed to {operation} {entity}: {source}")]
    Query {
        entity: Entity,
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("{0} violates a uniqueness constraint")]
    Duplicate(Entity),

    #[error("pseudonym is already taken")]
    DuplicatePseudonym,

    #[error("Expected at most one {0}, found several")]
    AmbiguousMatch(Entity),

    #[error("{0} disappeared before it could be read back")]
    Missing(Entity),

    #[error("Credentials incorrect")]
    InvalidCredentials,

    #[error(transparent)]
    Password(#[from] crate::auth::password::PasswordError),
}

const PSEUDONYM_CONSTRAINT: &str = "users.pseudonym";

impl StoreError {
    /// Wraps a sqlx error with context. Unique-constraint violations become
    /// [`StoreError::Duplicate`] so a lost race reads like a failed pre-check.
    pub(crate) fn query(entity: Entity, operation: &'static str) -> impl FnOnce(sqlx::Error) -> Self {
        move |source| match &source {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                // SQLite names the column: "UNIQUE constraint failed: users.pseudonym"
                if db.message().contains(PSEUDONYM_CONSTRAINT) {
                    StoreError::DuplicatePseudonym
                } else {
                    StoreError::Duplicate(entity)
                }
            }
            _ => StoreError::Query {
                entity,
                operation,
                source,
            },
        }
    }
}

/// Opens and checks SQLite connection pools
pub struct DatabaseManager;

impl DatabaseManager {
    pub const MEMORY: &'static str = ":memory:";

    /// Open a pool for the configured file, creating it when missing.
    ///
    /// An in-memory database lives only as long as its connection, so that case is
    /// pinned to one connection that never idles out.
    pub async fn connect(config: &DatabaseConfig) -> Result<SqlitePool, StoreError> {
        let path = config.sqlite_file.to_string_lossy().into_owned();
        let connect_err = |source| StoreError::Connect {
            path: path.clone(),
            source,
        };

        let in_memory = path == Self::MEMORY;
        let options = if in_memory {
            SqliteConnectOptions::from_str("sqlite::memory:").map_err(connect_err)?
        } else {
            SqliteConnectOptions::new()
                .filename(&config.sqlite_file)
                .create_if_missing(true)
        }
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));

        let mut pool_options = SqlitePoolOptions::new()
            .acquire_timeout(Duration::from_secs(config.connection_timeout));
        pool_options = if in_memory {
            pool_options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            pool_options.max_connections(config.max_connections.max(1))
        };

        let pool = pool_options.connect_with(options).await.map_err(connect_err)?;
        info!(database = %path, "Opened SQLite database");
        Ok(pool)
    }

    /// Round-trip a trivial statement to prove the pool is usable.
    pub async fn health_check(pool: &SqlitePool) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(pool).await?;
        Ok(())
    }
}

use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, info};

/// One schema step. Statements run in order inside a single transaction.
#[derive(Debug)]
pub struct Migration {
    pub version: i64,
    pub description: &'static str,
    pub statements: &'static [&'static str],
}

pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "create users and books",
        statements: &[
            "CREATE TABLE users (
                user_id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                password TEXT NOT NULL,
                pseudonym TEXT NOT NULL UNIQUE,
                is_admin BOOLEAN NOT NULL DEFAULT 0
            )",
            "CREATE TABLE books (
                book_id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL
                    REFERENCES users (user_id) ON DELETE CASCADE ON UPDATE CASCADE,
                image_url TEXT NOT NULL,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                price INTEGER NOT NULL CHECK (price >= 0),
                UNIQUE (user_id, title)
            )",
        ],
    },
    Migration {
        version: 2,
        description: "index book prices",
        statements: &["CREATE INDEX books_price_idx ON books (price)"],
    },
];

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Failed to read schema version: {0}")]
    Version(#[source] sqlx::Error),

    #[error("Migration {version} ({description}) failed: {source}")]
    Apply {
        version: i64,
        description: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("Database schema is at version {current}, expected {latest}; run the migrate command")]
    Outdated { current: i64, latest: i64 },

    #[error("Database schema version {current} is newer than this build supports ({latest})")]
    Newer { current: i64, latest: i64 },
}

pub fn latest_version() -> i64 {
    MIGRATIONS.last().map(|m| m.version).unwrap_or(0)
}

/// Version recorded in `schema_version`, or 0 for a fresh database.
pub async fn current_version(pool: &SqlitePool) -> Result<i64, MigrationError> {
    let has_table: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'schema_version'",
    )
    .fetch_one(pool)
    .await
    .map_err(MigrationError::Version)?;

    if has_table == 0 {
        return Ok(0);
    }

    let version: Option<i64> = sqlx::query_scalar("SELECT MAX(version) FROM schema_version")
        .fetch_one(pool)
        .await
        .map_err(MigrationError::Version)?;
    Ok(version.unwrap_or(0))
}

/// Fails unless the schema matches this build exactly.
pub async fn ensure_current(pool: &SqlitePool) -> Result<(), MigrationError> {
    let current = current_version(pool).await?;
    let latest = latest_version();
    match current.cmp(&latest) {
        std::cmp::Ordering::Equal => Ok(()),
        std::cmp::Ordering::Less => Err(MigrationError::Outdated { current, latest }),
        std::cmp::Ordering::Greater => Err(MigrationError::Newer { current, latest }),
    }
}

/// Applies every pending migration and returns how many ran.
pub async fn migrate(pool: &SqlitePool) -> Result<usize, MigrationError> {
    sqlx::query("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)")
        .execute(pool)
        .await
        .map_err(MigrationError::Version)?;

    let current = current_version(pool).await?;
    let latest = latest_version();
    if current > latest {
        return Err(MigrationError::Newer { current, latest });
    }

    let mut applied = 0;
    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        apply(pool, migration).await.map_err(|source| MigrationError::Apply {
            version: migration.version,
            description: migration.description,
            source,
        })?;
        info!(version = migration.version, "Applied migration: {}", migration.description);
        applied += 1;
    }

    if applied == 0 {
        debug!(version = current, "Database schema already up to date");
    }
    Ok(applied)
}

async fn apply(pool: &SqlitePool, migration: &Migration) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    for statement in migration.statements {
        sqlx::query(statement).execute(&mut *tx).await?;
    }
    sqlx::query("INSERT INTO schema_version (version) VALUES (?1)")
        .bind(migration.version)
        .execute(&mut *tx)
        .await?;
    tx.commit().await
}

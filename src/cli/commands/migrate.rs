use crate::config::AppConfig;
use crate::database::{migrations, DatabaseManager};

pub async fn handle(config: AppConfig) -> anyhow::Result<()> {
    let pool = DatabaseManager::connect(&config.database).await?;
    let applied = migrations::migrate(&pool).await?;
    tracing::info!(
        applied,
        version = migrations::latest_version(),
        "Database schema is up to date"
    );
    pool.close().await;
    Ok(())
}

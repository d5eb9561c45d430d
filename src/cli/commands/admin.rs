use anyhow::bail;

use crate::config::AppConfig;
use crate::database::models::UserCreationRequest;
use crate::database::{migrations, DatabaseManager, Storage};
use crate::validator::{validate_user_creation, ValidatorError};

/// Bootstraps an administrator whose pseudonym is the username, subject to the
/// same validation as `POST /users`.
pub async fn handle(config: AppConfig, username: String, password: String) -> anyhow::Result<()> {
    let pool = DatabaseManager::connect(&config.database).await?;
    migrations::ensure_current(&pool).await?;
    let storage = Storage::new(pool);

    let request = UserCreationRequest {
        pseudonym: username.clone(),
        username,
        password,
        is_admin: true,
    };

    match validate_user_creation(&storage, &request).await {
        Ok(()) => {}
        Err(ValidatorError::Invalid(e)) => bail!("cannot create administrator: {}", e.code()),
        Err(ValidatorError::Store(e)) => return Err(e.into()),
    }

    let user = storage.create_user(&request).await?;
    tracing::info!(user_id = user.id, username = %user.username, "Created administrator");
    storage.pool().close().await;
    Ok(())
}

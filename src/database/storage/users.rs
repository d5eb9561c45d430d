use tracing::info;

use super::Storage;
use crate::auth::password::{hash_password_blocking, verify_password_blocking};
use crate::database::manager::{Entity, StoreError};
use crate::database::models::{User, UserCreationRequest, UserModificationRequest};

const USER_COLUMNS: &str = "user_id, username, pseudonym, is_admin";

impl Storage {
    pub async fn create_user(&self, request: &UserCreationRequest) -> Result<User, StoreError> {
        // An empty credential is stored as-is; it is not a PHC string and never verifies.
        let password = if request.password.is_empty() {
            String::new()
        } else {
            hash_password_blocking(request.password.clone()).await?
        };

        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (username, password, pseudonym, is_admin) \
             VALUES (?1, ?2, ?3, ?4) RETURNING {}",
            USER_COLUMNS
        ))
        .bind(request.username.to_lowercase())
        .bind(password)
        .bind(&request.pseudonym)
        .bind(request.is_admin)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::query(Entity::User, "insert"))?;

        info!(user_id = user.id, username = %user.username, "Created user");
        Ok(user)
    }

    /// Applies the present fields of `patch`. A new password is re-hashed, an
    /// absent one leaves the stored hash alone. `None` when the user is gone.
    pub async fn update_user(
        &self,
        user_id: i64,
        patch: &UserModificationRequest,
    ) -> Result<Option<User>, StoreError> {
        if patch.is_empty() {
            return self.user_by_id(user_id).await;
        }

        let username = patch.username.as_deref().map(str::to_lowercase);
        let query = match &patch.password {
            Some(password) => {
                let hash = hash_password_blocking(password.clone()).await?;
                sqlx::query_as::<_, User>(&format!(
                    "UPDATE users SET username = COALESCE(?2, username), \
                     pseudonym = COALESCE(?3, pseudonym), is_admin = COALESCE(?4, is_admin), \
                     password = ?5 WHERE user_id = ?1 RETURNING {}",
                    USER_COLUMNS
                ))
                .bind(user_id)
                .bind(username)
                .bind(patch.pseudonym.clone())
                .bind(patch.is_admin)
                .bind(hash)
                .fetch_optional(&self.pool)
                .await
            }
            None => {
                sqlx::query_as::<_, User>(&format!(
                    "UPDATE users SET username = COALESCE(?2, username), \
                     pseudonym = COALESCE(?3, pseudonym), is_admin = COALESCE(?4, is_admin) \
                     WHERE user_id = ?1 RETURNING {}",
                    USER_COLUMNS
                ))
                .bind(user_id)
                .bind(username)
                .bind(patch.pseudonym.clone())
                .bind(patch.is_admin)
                .fetch_optional(&self.pool)
                .await
            }
        };

        query.map_err(StoreError::query(Entity::User, "update"))
    }

    /// Removes the user and, through the foreign key, all of their books.
    pub async fn delete_user(&self, user_id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE user_id = ?1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(StoreError::query(Entity::User, "delete"))?;

        if result.rows_affected() > 0 {
            info!(user_id, "Deleted user");
        }
        Ok(result.rows_affected() > 0)
    }

    pub async fn user_by_id(&self, user_id: i64) -> Result<Option<User>, StoreError> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE user_id = ?1",
            USER_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::query(Entity::User, "select"))
    }

    pub async fn user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE username = ?1",
            USER_COLUMNS
        ))
        .bind(username.to_lowercase())
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::query(Entity::User, "select"))
    }

    pub async fn users(&self) -> Result<Vec<User>, StoreError> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users ORDER BY username ASC",
            USER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::query(Entity::User, "select"))
    }

    /// Returns the account when the password matches. Unknown usernames and wrong
    /// passwords both fail with [`StoreError::InvalidCredentials`].
    pub async fn check_password(&self, username: &str, password: &str) -> Result<User, StoreError> {
        let row: Option<(i64, String)> =
            sqlx::query_as("SELECT user_id, password FROM users WHERE username = ?1")
                .bind(username.to_lowercase())
                .fetch_optional(&self.pool)
                .await
                .map_err(StoreError::query(Entity::User, "select"))?;

        let (user_id, stored_hash) = match row {
            Some((user_id, hash)) => (Some(user_id), Some(hash)),
            None => (None, None),
        };

        if !verify_password_blocking(password.to_string(), stored_hash).await? {
            return Err(StoreError::InvalidCredentials);
        }

        match user_id {
            Some(user_id) => self
                .user_by_id(user_id)
                .await?
                .ok_or(StoreError::InvalidCredentials),
            None => Err(StoreError::InvalidCredentials),
        }
    }

    pub async fn user_exists(&self, username: &str) -> Result<bool, StoreError> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE username = ?1)")
            .bind(username.to_lowercase())
            .fetch_one(&self.pool)
            .await
            .map_err(StoreError::query(Entity::User, "check"))
    }

    /// Whether a user other than `user_id` already has `username`.
    pub async fn another_user_exists(&self, user_id: i64, username: &str) -> Result<bool, StoreError> {
        sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM users WHERE username = ?1 AND user_id != ?2)",
        )
        .bind(username.to_lowercase())
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::query(Entity::User, "check"))
    }

    pub async fn user_with_pseudonym_exists(
        &self,
        pseudonym: &str,
        exclude_user: Option<i64>,
    ) -> Result<bool, StoreError> {
        sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM users WHERE pseudonym = ?1 \
             AND (?2 IS NULL OR user_id != ?2))",
        )
        .bind(pseudonym)
        .bind(exclude_user)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::query(Entity::User, "check"))
    }
}

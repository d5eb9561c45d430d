//! Persisted users and books.
//!
//! Point lookups return `Option`; only real persistence problems are errors.
//! Uniqueness pre-checks live in `validator`, the schema constraints are the
//! backstop and surface as [`StoreError::Duplicate`].

mod books;
mod users;

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::database::manager::StoreError;
use crate::validator::UniquenessLookup;

#[derive(Debug, Clone)]
pub struct Storage {
    pool: SqlitePool,
}

impl Storage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl UniquenessLookup for Storage {
    async fn username_taken(
        &self,
        username: &str,
        exclude_user: Option<i64>,
    ) -> Result<bool, StoreError> {
        match exclude_user {
            Some(user_id) => self.another_user_exists(user_id, username).await,
            None => self.user_exists(username).await,
        }
    }

    async fn pseudonym_taken(
        &self,
        pseudonym: &str,
        exclude_user: Option<i64>,
    ) -> Result<bool, StoreError> {
        self.user_with_pseudonym_exists(pseudonym, exclude_user).await
    }

    async fn title_taken(
        &self,
        owner_id: i64,
        title: &str,
        exclude_book: Option<i64>,
    ) -> Result<bool, StoreError> {
        self.book_with_title_exists(owner_id, title, exclude_book).await
    }
}

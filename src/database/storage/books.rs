use tracing::info;

use super::Storage;
use crate::database::manager::{Entity, StoreError};
use crate::database::models::{
    Book, BookCreationRequest, BookListingRequest, BookModificationRequest,
};
use crate::database::query_builder::BookQuery;

impl Storage {
    pub async fn create_book(
        &self,
        owner_id: i64,
        request: &BookCreationRequest,
    ) -> Result<Book, StoreError> {
        let book_id: i64 = sqlx::query_scalar(
            "INSERT INTO books (user_id, title, description, price, image_url) \
             VALUES (?1, ?2, ?3, ?4, ?5) RETURNING book_id",
        )
        .bind(owner_id)
        .bind(&request.title)
        .bind(&request.description)
        .bind(request.price)
        .bind(&request.image_url)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::query(Entity::Book, "insert"))?;

        info!(book_id, owner_id, "Created book");
        self.book_by_id(book_id)
            .await?
            .ok_or(StoreError::Missing(Entity::Book))
    }

    /// Applies the present fields of `patch` in one statement and re-reads the book.
    pub async fn update_book(
        &self,
        book_id: i64,
        patch: &BookModificationRequest,
    ) -> Result<Option<Book>, StoreError> {
        let result = sqlx::query(
            "UPDATE books SET title = COALESCE(?2, title), \
             description = COALESCE(?3, description), price = COALESCE(?4, price), \
             image_url = COALESCE(?5, image_url) WHERE book_id = ?1",
        )
        .bind(book_id)
        .bind(patch.title.clone())
        .bind(patch.description.clone())
        .bind(patch.price)
        .bind(patch.image_url.clone())
        .execute(&self.pool)
        .await
        .map_err(StoreError::query(Entity::Book, "update"))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.book_by_id(book_id).await
    }

    pub async fn delete_book(&self, book_id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM books WHERE book_id = ?1")
            .bind(book_id)
            .execute(&self.pool)
            .await
            .map_err(StoreError::query(Entity::Book, "delete"))?;

        if result.rows_affected() > 0 {
            info!(book_id, "Deleted book");
        }
        Ok(result.rows_affected() > 0)
    }

    pub async fn book_by_id(&self, book_id: i64) -> Result<Option<Book>, StoreError> {
        if book_id <= 0 {
            return Ok(None);
        }
        BookQuery::new().book(book_id).fetch_one(&self.pool).await
    }

    /// The book, provided it belongs to `user_id`.
    pub async fn book_for_user(&self, user_id: i64, book_id: i64) -> Result<Option<Book>, StoreError> {
        if user_id <= 0 || book_id <= 0 {
            return Ok(None);
        }
        BookQuery::new()
            .owner(user_id)
            .book(book_id)
            .fetch_one(&self.pool)
            .await
    }

    pub async fn books(&self) -> Result<Vec<Book>, StoreError> {
        BookQuery::new().fetch_many(&self.pool).await
    }

    pub async fn books_by_user(&self, user_id: i64) -> Result<Vec<Book>, StoreError> {
        if user_id <= 0 {
            return Ok(Vec::new());
        }
        BookQuery::new().owner(user_id).fetch_many(&self.pool).await
    }

    pub async fn search_books(&self, request: &BookListingRequest) -> Result<Vec<Book>, StoreError> {
        BookQuery::from_listing(request).fetch_many(&self.pool).await
    }

    /// Whether `owner_id` already has a book titled `title`, ignoring `exclude_book`.
    pub async fn book_with_title_exists(
        &self,
        owner_id: i64,
        title: &str,
        exclude_book: Option<i64>,
    ) -> Result<bool, StoreError> {
        sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM books WHERE user_id = ?1 AND title = ?2 \
             AND (?3 IS NULL OR book_id != ?3))",
        )
        .bind(owner_id)
        .bind(title)
        .bind(exclude_book)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::query(Entity::Book, "check"))
    }
}

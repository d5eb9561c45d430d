use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::api::format::{FormatError, Representation};
use crate::database::models::user::User;
use crate::database::query_builder::{BookSort, SortDirection};

/// A listed book together with a snapshot of its owner, rebuilt on every read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: i64,
    pub user_id: i64,
    pub user: User,
    pub title: String,
    pub description: String,
    /// Minor currency units.
    pub price: i64,
    pub image_url: String,
}

impl Representation for Book {
    const XML_ROOT: &'static str = "book";
}

/// Flat row produced by the books/users join.
#[derive(Debug, Clone, FromRow)]
pub struct BookRow {
    pub book_id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: String,
    pub price: i64,
    pub image_url: String,
    pub username: String,
    pub pseudonym: String,
    pub is_admin: bool,
}

impl From<BookRow> for Book {
    fn from(row: BookRow) -> Self {
        Self {
            id: row.book_id,
            user_id: row.user_id,
            user: User {
                id: row.user_id,
                username: row.username,
                pseudonym: row.pseudonym,
                is_admin: row.is_admin,
            },
            title: row.title,
            description: row.description,
            price: row.price,
            image_url: row.image_url,
        }
    }
}

/// Body of `POST /users/:id/books`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BookCreationRequest {
    pub title: String,
    pub description: String,
    pub price: i64,
    pub image_url: String,
}

/// Body of `PUT /users/:id/books/:book_id`. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BookModificationRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub image_url: Option<String>,
}

/// Search parameters of `GET /books`, already parsed from the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookListingRequest {
    pub author_id: Option<i64>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub order: Option<BookSort>,
    pub direction: Option<SortDirection>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookList {
    #[serde(rename = "book")]
    pub items: Vec<Book>,
}

impl From<Vec<Book>> for BookList {
    fn from(items: Vec<Book>) -> Self {
        Self { items }
    }
}

impl Representation for BookList {
    const XML_ROOT: &'static str = "books";

    fn to_json(&self) -> Result<Vec<u8>, FormatError> {
        serde_json::to_vec(&self.items).map_err(|e| FormatError::Render {
            format: "json",
            message: e.to_string(),
        })
    }
}

//! Request validation. Checks run in a fixed order and stop at the first
//! failure, whose code is reported to the client unchanged.

mod book;
mod user;

pub use book::{validate_book_creation, validate_book_listing, validate_book_modification};
pub use user::{validate_user_creation, validate_user_modification};

use async_trait::async_trait;
use thiserror::Error;

use crate::database::manager::StoreError;

pub const PASSWORD_MIN_LENGTH: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("user_mandatory_fields:username")]
    MissingUsername,
    #[error("user_mandatory_fields:pseudonym")]
    MissingPseudonym,
    #[error("user_already_exists")]
    UserAlreadyExists,
    #[error("pseudonym_already_exists")]
    PseudonymAlreadyExists,
    #[error("password_min_length")]
    PasswordTooShort,

    #[error("book_mandatory_fields:title")]
    MissingTitle,
    #[error("book_already_exists")]
    BookAlreadyExists,
    #[error("invalid_book_fields:image_url")]
    InvalidImageUrl,
    #[error("invalid_book_fields:price")]
    InvalidPrice,

    #[error("invalid_search_fields:author-id")]
    InvalidAuthorId,
    #[error("invalid_search_fields:title")]
    InvalidSearchTitle,
    #[error("invalid_search_fields:description")]
    InvalidSearchDescription,
    #[error("invalid_search_fields:min-price")]
    InvalidMinPrice,
    #[error("invalid_search_fields:max-price")]
    InvalidMaxPrice,
    #[error("invalid_search_fields:min-price,max-price")]
    InvalidPriceRange,
    #[error("invalid_search_fields:limit")]
    InvalidLimit,
    #[error("invalid_search_fields:offset")]
    InvalidOffset,
}

impl ValidationError {
    /// Stable code sent to clients.
    pub fn code(&self) -> String {
        self.to_string()
    }
}

#[derive(Debug, Error)]
pub enum ValidatorError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Uniqueness lookups against persisted state.
#[async_trait]
pub trait UniquenessLookup: Send + Sync {
    /// Username comparison is case-insensitive.
    async fn username_taken(&self, username: &str, exclude_user: Option<i64>)
        -> Result<bool, StoreError>;

    async fn pseudonym_taken(&self, pseudonym: &str, exclude_user: Option<i64>)
        -> Result<bool, StoreError>;

    async fn title_taken(&self, owner_id: i64, title: &str, exclude_book: Option<i64>)
        -> Result<bool, StoreError>;
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct FakeLookup {
        /// (user_id, username, pseudonym)
        pub users: Vec<(i64, String, String)>,
        /// (book_id, owner_id, title)
        pub books: Vec<(i64, i64, String)>,
        pub fail: bool,
        pub calls: Mutex<Vec<&'static str>>,
    }

    impl FakeLookup {
        pub fn with_user(mut self, id: i64, username: &str, pseudonym: &str) -> Self {
            self.users.push((id, username.to_string(), pseudonym.to_string()));
            self
        }

        pub fn with_book(mut self, id: i64, owner_id: i64, title: &str) -> Self {
            self.books.push((id, owner_id, title.to_string()));
            self
        }

        pub fn failing() -> Self {
            Self { fail: true, ..Default::default() }
        }

        fn record(&self, call: &'static str) -> Result<(), StoreError> {
            self.calls.lock().unwrap().push(call);
            if self.fail {
                Err(StoreError::Query {
                    entity: crate::database::manager::Entity::User,
                    operation: "check",
                    source: sqlx::Error::PoolClosed,
                })
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl UniquenessLookup for FakeLookup {
        async fn username_taken(
            &self,
            username: &str,
            exclude_user: Option<i64>,
        ) -> Result<bool, StoreError> {
            self.record("username_taken")?;
            let username = username.to_lowercase();
            Ok(self
                .users
                .iter()
                .any(|(id, name, _)| *name == username && Some(*id) != exclude_user))
        }

        async fn pseudonym_taken(
            &self,
            pseudonym: &str,
            exclude_user: Option<i64>,
        ) -> Result<bool, StoreError> {
            self.record("pseudonym_taken")?;
            Ok(self
                .users
                .iter()
                .any(|(id, _, p)| p == pseudonym && Some(*id) != exclude_user))
        }

        async fn title_taken(
            &self,
            owner_id: i64,
            title: &str,
            exclude_book: Option<i64>,
        ) -> Result<bool, StoreError> {
            self.record("title_taken")?;
            Ok(self.books.iter().any(|(id, owner, t)| {
                *owner == owner_id && t == title && Some(*id) != exclude_book
            }))
        }
    }
}

// handlers/protected/mod.rs - Protected handlers (JWT authentication required)
//
// Every route here runs behind `require_caller`, which places the authenticated
// `Caller` in the request extensions. Handlers take it as an explicit argument
// and make the admin/owner decision before touching the store.

pub mod user_books;
pub mod users;

pub use user_books::{user_book_delete, user_book_post, user_book_put, user_books_get};
pub use users::{user_delete, user_get, user_put, users_get, users_post};

// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Token acquisition, the book catalogue and the health check.

pub mod authenticate;
pub mod books;
pub mod health;

pub use authenticate::authenticate_post;
pub use books::{book_get, books_get};
pub use health::health_get;

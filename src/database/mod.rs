pub mod manager;
pub mod migrations;
pub mod models;
pub mod query_builder;
pub mod storage;

pub use manager::{DatabaseManager, Entity, StoreError};
pub use query_builder::{BookQuery, BookSort, SortDirection};
pub use storage::Storage;

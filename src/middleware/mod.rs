pub mod auth;
pub mod response;

pub use auth::{require_caller, Caller};
pub use response::{ApiResponse, ApiResult, Negotiated};

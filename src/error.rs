// HTTP API Error Types
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::api::format::{Format, FormatError, Representation};
use crate::auth::TokenError;
use crate::database::manager::{Entity, StoreError};
use crate::validator::{ValidationError, ValidatorError};

pub const SERVER_ERROR: &str = "Server Error";
pub const RESOURCE_NOT_FOUND: &str = "Resource Not Found";
pub const ACCESS_FORBIDDEN: &str = "Access Forbidden";
pub const UNAUTHORIZED: &str = "Unauthorized";
pub const CREDENTIALS_INCORRECT: &str = "Credentials incorrect";

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    Validation(ValidationError),

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 406 Not Acceptable
    NotAcceptable(String),

    // 409 Conflict
    Conflict(String),

    // 415 Unsupported Media Type
    UnsupportedMediaType(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

/// Error document sent to clients.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: bool,
    pub code: &'static str,
    pub message: String,
}

impl Representation for ErrorBody {
    const XML_ROOT: &'static str = "error";
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::NotAcceptable(_) => StatusCode::NOT_ACCEPTABLE,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> String {
        match self {
            ApiError::Validation(e) => e.code(),
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::NotAcceptable(msg)
            | ApiError::Conflict(msg)
            | ApiError::UnsupportedMediaType(msg)
            | ApiError::InternalServerError(msg)
            | ApiError::ServiceUnavailable(msg) => msg.clone(),
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::NotAcceptable(_) => "NOT_ACCEPTABLE",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::UnsupportedMediaType(_) => "UNSUPPORTED_MEDIA_TYPE",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            error: true,
            code: self.error_code(),
            message: self.message(),
        }
    }

    /// Renders the error in the format the client negotiated.
    pub fn render(self, format: Format) -> Response {
        let status = self.status_code();
        match format.encode(&self.to_body()) {
            Ok(body) => (status, [(header::CONTENT_TYPE, format.mime())], body).into_response(),
            Err(e) => {
                tracing::error!("Failed to render error body: {}", e);
                status.into_response()
            }
        }
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn unauthorized() -> Self {
        ApiError::Unauthorized(UNAUTHORIZED.to_string())
    }

    pub fn credentials_incorrect() -> Self {
        ApiError::Unauthorized(CREDENTIALS_INCORRECT.to_string())
    }

    pub fn forbidden() -> Self {
        ApiError::Forbidden(ACCESS_FORBIDDEN.to_string())
    }

    pub fn not_found() -> Self {
        ApiError::NotFound(RESOURCE_NOT_FOUND.to_string())
    }

    pub fn internal_server_error() -> Self {
        ApiError::InternalServerError(SERVER_ERROR.to_string())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Validation(err)
    }
}

impl From<ValidatorError> for ApiError {
    fn from(err: ValidatorError) -> Self {
        match err {
            ValidatorError::Invalid(e) => e.into(),
            ValidatorError::Store(e) => e.into(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidCredentials => ApiError::credentials_incorrect(),
            StoreError::Duplicate(entity) => {
                tracing::warn!("Uniqueness constraint rejected {} write", entity);
                let code = match entity {
                    Entity::User => ValidationError::UserAlreadyExists,
                    Entity::Book => ValidationError::BookAlreadyExists,
                };
                ApiError::Conflict(code.code())
            }
            StoreError::DuplicatePseudonym => {
                tracing::warn!("Uniqueness constraint rejected pseudonym");
                ApiError::Conflict(ValidationError::PseudonymAlreadyExists.code())
            }
            other => {
                // Log the real error but return generic message
                tracing::error!("Storage error: {}", other);
                ApiError::internal_server_error()
            }
        }
    }
}

impl From<FormatError> for ApiError {
    fn from(err: FormatError) -> Self {
        match err {
            FormatError::UnsupportedContentType(_) => ApiError::UnsupportedMediaType(err.to_string()),
            FormatError::NotAcceptable(_) => ApiError::NotAcceptable(err.to_string()),
            FormatError::Malformed { .. } => ApiError::bad_request(err.to_string()),
            FormatError::Render { .. } => {
                tracing::error!("{}", err);
                ApiError::internal_server_error()
            }
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Invalid(e) => {
                tracing::debug!("Rejected token: {}", e);
                ApiError::unauthorized()
            }
            TokenError::Generation(e) => {
                tracing::error!("Token generation failed: {}", e);
                ApiError::internal_server_error()
            }
        }
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Used where no format has been negotiated yet, e.g. extractor rejections
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.render(Format::Json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_carry_their_code() {
        let err = ApiError::from(ValidationError::BookAlreadyExists);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), "book_already_exists");
        assert_eq!(err.to_body().code, "VALIDATION_ERROR");
    }

    #[test]
    fn storage_errors_are_opaque() {
        let err = ApiError::from(StoreError::Query {
            entity: Entity::Book,
            operation: "select",
            source: sqlx::Error::PoolClosed,
        });
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message(), SERVER_ERROR);
    }

    #[test]
    fn duplicate_rows_become_conflicts() {
        let err = ApiError::from(StoreError::Duplicate(Entity::User));
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.message(), "user_already_exists");

        let err = ApiError::from(StoreError::DuplicatePseudonym);
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.message(), "pseudonym_already_exists");
    }

    #[test]
    fn bad_credentials_are_unauthorized() {
        let err = ApiError::from(StoreError::InvalidCredentials);
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.message(), CREDENTIALS_INCORRECT);
    }

    #[test]
    fn negotiation_failures_map_to_their_statuses() {
        let err = ApiError::from(FormatError::NotAcceptable("text/html".into()));
        assert_eq!(err.status_code(), StatusCode::NOT_ACCEPTABLE);
        let err = ApiError::from(FormatError::UnsupportedContentType("text/plain".into()));
        assert_eq!(err.status_code(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[test]
    fn xml_error_body() {
        let xml = ApiError::not_found().to_body().to_xml().unwrap();
        assert_eq!(
            xml,
            "<error><error>true</error><code>NOT_FOUND</code><message>Resource Not Found</message></error>"
        );
    }
}

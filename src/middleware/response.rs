use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;

use crate::api::format::{Format, FormatError, Representation};
use crate::error::ApiError;

/// A successful handler outcome, rendered once the response format is known.
#[derive(Debug)]
pub struct ApiResponse<T> {
    pub data: Option<T>,
    pub status_code: StatusCode,
}

impl<T> ApiResponse<T> {
    /// Create a successful API response with default 200 status
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            status_code: StatusCode::OK,
        }
    }

    /// Create a 201 Created response
    pub fn created(data: T) -> Self {
        Self {
            data: Some(data),
            status_code: StatusCode::CREATED,
        }
    }

    /// Create a 204 No Content response
    pub fn no_content() -> Self {
        Self {
            data: None,
            status_code: StatusCode::NO_CONTENT,
        }
    }
}

pub type ApiResult<T> = Result<ApiResponse<T>, ApiError>;

/// Formats negotiated from the request headers, passed to handlers explicitly.
///
/// `accept` is settled during extraction (406 when nothing acceptable). The body
/// format is only enforced when a handler actually decodes a body.
#[derive(Debug, Clone)]
pub struct Negotiated {
    pub accept: Format,
    content_type: Result<Format, String>,
}

impl Negotiated {
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, ApiError> {
        let accept = Format::from_accept(header_str(headers, header::ACCEPT))?;
        let content_type = Format::from_content_type(header_str(headers, header::CONTENT_TYPE))
            .map_err(|e| match e {
                FormatError::UnsupportedContentType(value) => value,
                other => other.to_string(),
            });
        Ok(Self {
            accept,
            content_type,
        })
    }

    pub fn content_type(&self) -> Result<Format, ApiError> {
        self.content_type
            .clone()
            .map_err(|value| FormatError::UnsupportedContentType(value).into())
    }

    pub fn decode<T: DeserializeOwned>(&self, body: &[u8]) -> Result<T, ApiError> {
        Ok(self.content_type()?.decode(body)?)
    }

    pub fn respond<T: Representation>(&self, result: ApiResult<T>) -> Response {
        match result {
            Ok(response) => self.render(response),
            Err(err) => {
                if err.status_code().is_client_error() {
                    tracing::warn!(
                        status = err.status_code().as_u16(),
                        code = err.error_code(),
                        "Request rejected: {}",
                        err.message()
                    );
                }
                err.render(self.accept)
            }
        }
    }

    pub fn render<T: Representation>(&self, response: ApiResponse<T>) -> Response {
        let Some(data) = response.data else {
            return response.status_code.into_response();
        };

        match self.accept.encode(&data) {
            Ok(body) => (
                response.status_code,
                [(header::CONTENT_TYPE, self.accept.mime())],
                body,
            )
                .into_response(),
            Err(e) => {
                tracing::error!("Failed to serialize response data: {}", e);
                ApiError::internal_server_error().render(self.accept)
            }
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Negotiated
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Negotiated::from_headers(&parts.headers)
    }
}

fn header_str(headers: &HeaderMap, name: header::HeaderName) -> Option<&str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Token {
        token: String,
    }

    impl Representation for Token {
        const XML_ROOT: &'static str = "token";
    }

    fn headers(accept: Option<&'static str>, content_type: Option<&'static str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(v) = accept {
            headers.insert(header::ACCEPT, HeaderValue::from_static(v));
        }
        if let Some(v) = content_type {
            headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(v));
        }
        headers
    }

    #[test]
    fn unacceptable_accept_header_fails_extraction() {
        let err = Negotiated::from_headers(&headers(Some("image/png"), None)).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_ACCEPTABLE);
    }

    #[test]
    fn unsupported_content_type_only_fails_on_decode() {
        let negotiated = Negotiated::from_headers(&headers(None, Some("text/plain"))).unwrap();
        assert_eq!(negotiated.accept, Format::Json);
        let err = negotiated.decode::<serde_json::Value>(b"{}").unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[test]
    fn renders_in_accepted_format() {
        let negotiated = Negotiated::from_headers(&headers(Some("text/xml"), None)).unwrap();
        let response = negotiated.render(ApiResponse::created(Token { token: "abc".into() }));
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/xml");
    }

    #[test]
    fn no_content_has_no_body_type() {
        let negotiated = Negotiated::from_headers(&HeaderMap::new()).unwrap();
        let response = negotiated.respond::<Token>(Ok(ApiResponse::no_content()));
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response.headers().get(header::CONTENT_TYPE).is_none());
    }

    #[test]
    fn errors_follow_accept_header() {
        let negotiated = Negotiated::from_headers(&headers(Some("application/xml"), None)).unwrap();
        let response = negotiated.respond::<Token>(Err(ApiError::forbidden()));
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/xml");
    }
}

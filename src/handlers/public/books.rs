// handlers/public/books.rs - GET /books, GET /books/:id handlers

use std::collections::HashSet;

use axum::{
    extract::{Path, RawQuery, State},
    response::Response,
};

use crate::database::models::{Book, BookList, BookListingRequest};
use crate::database::query_builder::{BookSort, SortDirection};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, Negotiated};
use crate::state::AppState;
use crate::validator::validate_book_listing;

/// GET /books - search the catalogue.
///
/// Query parameters: `author-id`, `title`, `description`, `min-price`,
/// `max-price`, `order` (id, title, price), `direction` (asc, desc), `limit`,
/// `offset`. Unknown parameters are ignored.
pub async fn books_get(
    State(state): State<AppState>,
    negotiated: Negotiated,
    RawQuery(query): RawQuery,
) -> Response {
    negotiated.respond(search_books(&state, query.as_deref()).await)
}

/// GET /books/:id - show a single book
pub async fn book_get(
    State(state): State<AppState>,
    negotiated: Negotiated,
    Path(book_id): Path<i64>,
) -> Response {
    negotiated.respond(show_book(&state, book_id).await)
}

async fn search_books(state: &AppState, query: Option<&str>) -> ApiResult<BookList> {
    let request = parse_listing(query)?;
    validate_book_listing(&request)?;

    let books = state.storage.search_books(&request).await?;
    Ok(ApiResponse::success(books.into()))
}

async fn show_book(state: &AppState, book_id: i64) -> ApiResult<Book> {
    let book = state
        .storage
        .book_by_id(book_id)
        .await?
        .ok_or_else(ApiError::not_found)?;
    Ok(ApiResponse::success(book))
}

/// Turns the raw query string into a listing request. Repeated keys, non-integer
/// and negative numbers are rejected here; semantic limits are left to
/// [`validate_book_listing`].
pub fn parse_listing(query: Option<&str>) -> Result<BookListingRequest, ApiError> {
    let mut request = BookListingRequest::default();
    let Some(query) = query else {
        return Ok(request);
    };

    let mut seen = HashSet::new();
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        if !seen.insert(key.clone()) {
            return Err(ApiError::bad_request(format!(
                "Parameter '{}' given more than once",
                key
            )));
        }

        match key.as_ref() {
            "author-id" => request.author_id = Some(non_negative(&key, &value)?),
            "min-price" => request.min_price = Some(non_negative(&key, &value)?),
            "max-price" => request.max_price = Some(non_negative(&key, &value)?),
            "limit" => request.limit = Some(non_negative(&key, &value)?),
            "offset" => request.offset = Some(non_negative(&key, &value)?),
            "title" => request.title = Some(value.into_owned()),
            "description" => request.description = Some(value.into_owned()),
            "order" => {
                request.order = Some(BookSort::parse(&value).ok_or_else(|| {
                    ApiError::bad_request(format!("Cannot sort by '{}'", value))
                })?)
            }
            "direction" => {
                request.direction = Some(SortDirection::parse(&value).ok_or_else(|| {
                    ApiError::bad_request(format!("Unknown sort direction '{}'", value))
                })?)
            }
            _ => {}
        }
    }

    Ok(request)
}

fn non_negative(key: &str, value: &str) -> Result<i64, ApiError> {
    match value.parse::<i64>() {
        Ok(n) if n >= 0 => Ok(n),
        _ => Err(ApiError::bad_request(format!(
            "Parameter '{}' must be a non-negative integer",
            key
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn empty_query_is_unfiltered() {
        assert_eq!(parse_listing(None).unwrap(), BookListingRequest::default());
        assert_eq!(parse_listing(Some("")).unwrap(), BookListingRequest::default());
    }

    #[test]
    fn parses_every_parameter() {
        let request = parse_listing(Some(
            "author-id=3&title=Da%20Vinci&description=code&min-price=100&max-price=900\
             &order=price&direction=asc&limit=10&offset=20&unknown=x",
        ))
        .unwrap();

        assert_eq!(
            request,
            BookListingRequest {
                author_id: Some(3),
                title: Some("Da Vinci".into()),
                description: Some("code".into()),
                min_price: Some(100),
                max_price: Some(900),
                order: Some(BookSort::Price),
                direction: Some(SortDirection::Asc),
                limit: Some(10),
                offset: Some(20),
            }
        );
    }

    #[test]
    fn rejects_repeated_parameters() {
        let err = parse_listing(Some("title=a&title=b")).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn rejects_negative_and_non_numeric_values() {
        assert!(parse_listing(Some("min-price=-5")).is_err());
        assert!(parse_listing(Some("author-id=abc")).is_err());
        assert!(parse_listing(Some("order=rating")).is_err());
    }

    #[test]
    fn empty_strings_survive_parsing_for_validation() {
        let request = parse_listing(Some("title=")).unwrap();
        assert_eq!(request.title.as_deref(), Some(""));
        assert!(validate_book_listing(&request).is_err());
    }
}

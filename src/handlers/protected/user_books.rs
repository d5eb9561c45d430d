// handlers/protected/user_books.rs - /users/:id/books handlers

use axum::{
    body::Bytes,
    extract::{Path, State},
    response::Response,
    Extension,
};

use crate::database::models::{Book, BookCreationRequest, BookList, BookModificationRequest};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, Caller, Negotiated};
use crate::state::AppState;
use crate::validator::{validate_book_creation, validate_book_modification};

/// GET /users/:id/books
pub async fn user_books_get(
    State(state): State<AppState>,
    negotiated: Negotiated,
    Path(user_id): Path<i64>,
) -> Response {
    negotiated.respond(list_user_books(&state, user_id).await)
}

/// POST /users/:id/books - list a book for the user (owner or administrator)
pub async fn user_book_post(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    negotiated: Negotiated,
    Path(user_id): Path<i64>,
    body: Bytes,
) -> Response {
    negotiated.respond(create_book(&state, &caller, &negotiated, user_id, &body).await)
}

/// PUT /users/:id/books/:book_id - partial update (owner or administrator)
pub async fn user_book_put(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    negotiated: Negotiated,
    Path((user_id, book_id)): Path<(i64, i64)>,
    body: Bytes,
) -> Response {
    negotiated.respond(update_book(&state, &caller, &negotiated, user_id, book_id, &body).await)
}

/// DELETE /users/:id/books/:book_id (owner or administrator)
pub async fn user_book_delete(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    negotiated: Negotiated,
    Path((user_id, book_id)): Path<(i64, i64)>,
) -> Response {
    negotiated.respond(delete_book(&state, &caller, user_id, book_id).await)
}

async fn list_user_books(state: &AppState, user_id: i64) -> ApiResult<BookList> {
    if state.storage.user_by_id(user_id).await?.is_none() {
        return Err(ApiError::not_found());
    }
    let books = state.storage.books_by_user(user_id).await?;
    Ok(ApiResponse::success(books.into()))
}

async fn create_book(
    state: &AppState,
    caller: &Caller,
    negotiated: &Negotiated,
    user_id: i64,
    body: &[u8],
) -> ApiResult<Book> {
    if !caller.may_act_for(user_id) {
        return Err(ApiError::forbidden());
    }
    if state.storage.user_by_id(user_id).await?.is_none() {
        return Err(ApiError::not_found());
    }

    let request: BookCreationRequest = negotiated.decode(body)?;
    validate_book_creation(&state.storage, user_id, &request).await?;

    let book = state.storage.create_book(user_id, &request).await?;
    Ok(ApiResponse::created(book))
}

async fn update_book(
    state: &AppState,
    caller: &Caller,
    negotiated: &Negotiated,
    user_id: i64,
    book_id: i64,
    body: &[u8],
) -> ApiResult<Book> {
    if !caller.may_act_for(user_id) {
        return Err(ApiError::forbidden());
    }
    if state.storage.book_for_user(user_id, book_id).await?.is_none() {
        return Err(ApiError::not_found());
    }

    let patch: BookModificationRequest = negotiated.decode(body)?;
    validate_book_modification(&state.storage, user_id, book_id, &patch).await?;

    let book = state
        .storage
        .update_book(book_id, &patch)
        .await?
        .ok_or_else(ApiError::not_found)?;
    Ok(ApiResponse::success(book))
}

async fn delete_book(
    state: &AppState,
    caller: &Caller,
    user_id: i64,
    book_id: i64,
) -> ApiResult<Book> {
    if !caller.may_act_for(user_id) {
        return Err(ApiError::forbidden());
    }
    if state.storage.book_for_user(user_id, book_id).await?.is_none() {
        return Err(ApiError::not_found());
    }

    if !state.storage.delete_book(book_id).await? {
        return Err(ApiError::not_found());
    }
    Ok(ApiResponse::no_content())
}

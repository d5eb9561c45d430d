// handlers/protected/users.rs - /users and /users/:id handlers

use axum::{
    body::Bytes,
    extract::{Path, State},
    response::Response,
    Extension,
};

use crate::database::models::{User, UserCreationRequest, UserList, UserModificationRequest};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, Caller, Negotiated};
use crate::state::AppState;
use crate::validator::{validate_user_creation, validate_user_modification};

/// GET /users - every account, ordered by username
pub async fn users_get(State(state): State<AppState>, negotiated: Negotiated) -> Response {
    negotiated.respond(list_users(&state).await)
}

/// POST /users - create an account (administrators only)
pub async fn users_post(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    negotiated: Negotiated,
    body: Bytes,
) -> Response {
    negotiated.respond(create_user(&state, &caller, &negotiated, &body).await)
}

/// GET /users/:id
pub async fn user_get(
    State(state): State<AppState>,
    negotiated: Negotiated,
    Path(user_id): Path<i64>,
) -> Response {
    negotiated.respond(show_user(&state, user_id).await)
}

/// PUT /users/:id - partial update of the caller's own account, or any account
/// for administrators
pub async fn user_put(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    negotiated: Negotiated,
    Path(user_id): Path<i64>,
    body: Bytes,
) -> Response {
    negotiated.respond(update_user(&state, &caller, &negotiated, user_id, &body).await)
}

/// DELETE /users/:id - administrators only, never their own account
pub async fn user_delete(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    negotiated: Negotiated,
    Path(user_id): Path<i64>,
) -> Response {
    negotiated.respond(delete_user(&state, &caller, user_id).await)
}

async fn list_users(state: &AppState) -> ApiResult<UserList> {
    let users = state.storage.users().await?;
    Ok(ApiResponse::success(users.into()))
}

async fn create_user(
    state: &AppState,
    caller: &Caller,
    negotiated: &Negotiated,
    body: &[u8],
) -> ApiResult<User> {
    if !caller.is_admin() {
        return Err(ApiError::forbidden());
    }

    let request: UserCreationRequest = negotiated.decode(body)?;
    validate_user_creation(&state.storage, &request).await?;

    let user = state.storage.create_user(&request).await?;
    Ok(ApiResponse::created(user))
}

async fn show_user(state: &AppState, user_id: i64) -> ApiResult<User> {
    let user = state
        .storage
        .user_by_id(user_id)
        .await?
        .ok_or_else(ApiError::not_found)?;
    Ok(ApiResponse::success(user))
}

async fn update_user(
    state: &AppState,
    caller: &Caller,
    negotiated: &Negotiated,
    user_id: i64,
    body: &[u8],
) -> ApiResult<User> {
    if !caller.may_act_for(user_id) {
        return Err(ApiError::forbidden());
    }

    let patch: UserModificationRequest = negotiated.decode(body)?;
    if !caller.is_admin() && patch.is_admin == Some(true) {
        tracing::warn!(user_id, "Non-admin tried to grant admin rights");
        return Err(ApiError::forbidden());
    }

    if state.storage.user_by_id(user_id).await?.is_none() {
        return Err(ApiError::not_found());
    }
    validate_user_modification(&state.storage, user_id, &patch).await?;

    let user = state
        .storage
        .update_user(user_id, &patch)
        .await?
        .ok_or_else(ApiError::not_found)?;
    Ok(ApiResponse::success(user))
}

async fn delete_user(state: &AppState, caller: &Caller, user_id: i64) -> ApiResult<User> {
    if !caller.is_admin() {
        return Err(ApiError::forbidden());
    }
    if caller.id() == user_id {
        return Err(ApiError::bad_request("Deleting own account not possible"));
    }

    if !state.storage.delete_user(user_id).await? {
        return Err(ApiError::not_found());
    }
    Ok(ApiResponse::no_content())
}

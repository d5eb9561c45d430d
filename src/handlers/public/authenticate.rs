// handlers/public/authenticate.rs - POST /authenticate handler

use axum::{extract::State, response::Response, Form};
use serde::{Deserialize, Serialize};

use crate::api::format::Representation;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, Negotiated};
use crate::state::AppState;

#[derive(Default, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

impl Representation for TokenResponse {
    const XML_ROOT: &'static str = "token";
}

/// POST /authenticate - exchange form-encoded `username` and `password` for a
/// bearer token.
pub async fn authenticate_post(
    State(state): State<AppState>,
    negotiated: Negotiated,
    Form(credentials): Form<Credentials>,
) -> Response {
    negotiated.respond(authenticate(&state, credentials).await)
}

async fn authenticate(state: &AppState, credentials: Credentials) -> ApiResult<TokenResponse> {
    if credentials.username.is_empty() || credentials.password.is_empty() {
        return Err(ApiError::bad_request("Username or password empty"));
    }

    let user = state
        .storage
        .check_password(&credentials.username, &credentials.password)
        .await?;

    let token = state.tokens.issue(&user.username)?;
    tracing::info!(user_id = user.id, "Issued access token");
    Ok(ApiResponse::success(TokenResponse { token }))
}

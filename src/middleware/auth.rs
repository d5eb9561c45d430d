use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::api::format::Format;
use crate::database::models::User;
use crate::error::ApiError;
use crate::state::AppState;

/// The authenticated account making the request.
#[derive(Clone, Debug)]
pub struct Caller(pub User);

impl Caller {
    pub fn id(&self) -> i64 {
        self.0.id
    }

    pub fn is_admin(&self) -> bool {
        self.0.is_admin
    }

    /// Administrators act for anyone, everyone else only for themselves.
    pub fn may_act_for(&self, user_id: i64) -> bool {
        self.is_admin() || self.id() == user_id
    }
}

/// JWT authentication middleware that validates tokens and loads the caller.
///
/// A valid token whose subject no longer exists is treated like an invalid one.
pub async fn require_caller(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Response {
    let accept = headers.get(header::ACCEPT).and_then(|v| v.to_str().ok());
    let format = Format::from_accept(accept).unwrap_or(Format::Json);

    match authenticate(&state, &headers).await {
        Ok(caller) => {
            request.extensions_mut().insert(caller);
            next.run(request).await
        }
        Err(err) => {
            tracing::warn!(path = %request.uri().path(), "Authentication failed: {}", err);
            err.render(format)
        }
    }
}

async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<Caller, ApiError> {
    let token = extract_jwt_from_headers(headers).map_err(|msg| {
        tracing::debug!("{}", msg);
        ApiError::unauthorized()
    })?;

    let claims = state.tokens.verify(&token)?;

    let user = state
        .storage
        .user_by_username(&claims.sub)
        .await?
        .ok_or_else(ApiError::unauthorized)?;

    Ok(Caller(user))
}

/// Extract JWT token from Authorization header
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| "Missing Authorization header".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        if token.trim().is_empty() {
            return Err("Empty JWT token".to_string());
        }
        Ok(token.trim().to_string())
    } else {
        Err("Authorization header must use Bearer token format".to_string())
    }
}

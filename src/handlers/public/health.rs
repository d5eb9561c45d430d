// handlers/public/health.rs - GET /health handler

use axum::{extract::State, response::Response};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::api::format::Representation;
use crate::database::DatabaseManager;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, Negotiated};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub database: &'static str,
    pub timestamp: DateTime<Utc>,
}

impl Representation for Health {
    const XML_ROOT: &'static str = "health";
}

pub async fn health_get(State(state): State<AppState>, negotiated: Negotiated) -> Response {
    negotiated.respond(health(&state).await)
}

async fn health(state: &AppState) -> ApiResult<Health> {
    DatabaseManager::health_check(state.storage.pool())
        .await
        .map_err(|e| {
            tracing::error!("Health check failed: {}", e);
            ApiError::service_unavailable("database unavailable")
        })?;

    Ok(ApiResponse::success(Health {
        status: "ok",
        database: "ok",
        timestamp: Utc::now(),
    }))
}

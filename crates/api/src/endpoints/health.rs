//! Liveness endpoint.

use agora_common::{AppError, AppResult};
use axum::{Router, extract::State, routing::get};
use serde::Serialize;

use crate::{middleware::AppState, response::ApiResponse};

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// Report liveness. Fails with 500 if the database is unreachable.
async fn health(State(state): State<AppState>) -> AppResult<ApiResponse<HealthResponse>> {
    state.db.ping().await.map_err(AppError::db)?;
    Ok(ApiResponse::ok(HealthResponse { status: "ok" }))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

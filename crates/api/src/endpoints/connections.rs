//! Connection endpoints.

use agora_common::AppResult;
use agora_db::entities::connection::{self, ConnectionStatus};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};

use super::DeletedResponse;
use crate::{
    extractors::{AuthUser, Pagination},
    middleware::AppState,
    response::ApiResponse,
};

/// Connection request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectRequest {
    pub user_id: String,
}

/// Optional status filter for listing.
#[derive(Debug, Deserialize)]
pub struct StatusFilter {
    pub status: Option<ConnectionStatus>,
}

/// Connection response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionResponse {
    pub id: String,
    pub sender_id: String,
    pub recipient_id: String,
    pub status: ConnectionStatus,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl From<connection::Model> for ConnectionResponse {
    fn from(c: connection::Model) -> Self {
        Self {
            id: c.id,
            sender_id: c.sender_id,
            recipient_id: c.recipient_id,
            status: c.status,
            created_at: c.created_at.to_rfc3339(),
            updated_at: c.updated_at.map(|d| d.to_rfc3339()),
        }
    }
}

/// Connections the caller is part of, in either direction.
async fn list(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(filter): Query<StatusFilter>,
    Query(page): Query<Pagination>,
) -> AppResult<ApiResponse<Vec<ConnectionResponse>>> {
    let connections = state
        .connection_service
        .list(&user.id, filter.status, page.limit(), page.until_id())
        .await?;
    Ok(ApiResponse::ok(
        connections.into_iter().map(Into::into).collect(),
    ))
}

async fn request(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ConnectRequest>,
) -> AppResult<ApiResponse<ConnectionResponse>> {
    let connection = state
        .connection_service
        .request(&user.id, &req.user_id)
        .await?;
    Ok(ApiResponse::created(connection.into()))
}

/// Accept a pending request. The two users end up following each other.
async fn accept(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<ConnectionResponse>> {
    let connection = state.connection_service.accept(&user.id, &id).await?;
    Ok(ApiResponse::ok(connection.into()))
}

async fn reject(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<ConnectionResponse>> {
    let connection = state.connection_service.reject(&user.id, &id).await?;
    Ok(ApiResponse::ok(connection.into()))
}

async fn remove(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<DeletedResponse>> {
    let summary = state.connection_service.delete(&user.id, &id).await?;
    Ok(ApiResponse::ok(summary.into()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(request))
        .route("/{id}", delete(remove))
        .route("/{id}/accept", post(accept))
        .route("/{id}/reject", post(reject))
}

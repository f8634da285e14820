//! Message endpoints.

use agora_common::AppResult;
use agora_db::entities::message;
use axum::{
    Router,
    extract::{Path, State},
    routing::delete,
};
use serde::Serialize;

use super::DeletedResponse;
use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Message response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub id: String,
    pub conversation_id: String,
    pub sender_id: String,
    pub text: String,
    pub created_at: String,
}

impl From<message::Model> for MessageResponse {
    fn from(m: message::Model) -> Self {
        Self {
            id: m.id,
            conversation_id: m.conversation_id,
            sender_id: m.sender_id,
            text: m.text,
            created_at: m.created_at.to_rfc3339(),
        }
    }
}

/// Delete a message. Only its sender may.
async fn remove(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<DeletedResponse>> {
    let summary = state.messaging_service.delete_message(&user.id, &id).await?;
    Ok(ApiResponse::ok(summary.into()))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/{id}", delete(remove))
}

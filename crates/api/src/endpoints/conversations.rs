//! Conversation endpoints.

use agora_common::AppResult;
use agora_core::SendMessageInput;
use agora_db::{entities::conversation, id_list};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use serde::{Deserialize, Serialize};

use super::{DeletedResponse, messages::MessageResponse};
use crate::{
    extractors::{AuthUser, Pagination},
    middleware::AppState,
    response::ApiResponse,
};

/// Open-conversation request. The caller is always a participant.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenRequest {
    pub participant_ids: Vec<String>,
}

/// Conversation response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationResponse {
    pub id: String,
    pub participants: Vec<String>,
    pub messages_count: usize,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl From<conversation::Model> for ConversationResponse {
    fn from(c: conversation::Model) -> Self {
        Self {
            participants: id_list::ids(&c.participants),
            messages_count: id_list::ids(&c.messages).len(),
            id: c.id,
            created_at: c.created_at.to_rfc3339(),
            updated_at: c.updated_at.map(|d| d.to_rfc3339()),
        }
    }
}

/// The caller's conversations, most recently active first.
async fn list(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<ConversationResponse>>> {
    let conversations = state.messaging_service.list(&user.id).await?;
    Ok(ApiResponse::ok(
        conversations.into_iter().map(Into::into).collect(),
    ))
}

async fn open(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<OpenRequest>,
) -> AppResult<ApiResponse<ConversationResponse>> {
    let conversation = state
        .messaging_service
        .open(&user.id, &req.participant_ids)
        .await?;
    Ok(ApiResponse::created(conversation.into()))
}

async fn show(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<ConversationResponse>> {
    let conversation = state.messaging_service.get(&user.id, &id).await?;
    Ok(ApiResponse::ok(conversation.into()))
}

/// Delete a conversation and all of its messages.
async fn delete(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<DeletedResponse>> {
    let summary = state.messaging_service.delete(&user.id, &id).await?;
    Ok(ApiResponse::ok(summary.into()))
}

/// Messages in a conversation, newest first.
async fn messages(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(page): Query<Pagination>,
) -> AppResult<ApiResponse<Vec<MessageResponse>>> {
    let messages = state
        .messaging_service
        .messages(&user.id, &id, page.limit(), page.until_id())
        .await?;
    Ok(ApiResponse::ok(messages.into_iter().map(Into::into).collect()))
}

async fn send(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<SendMessageInput>,
) -> AppResult<ApiResponse<MessageResponse>> {
    let message = state.messaging_service.send(&user.id, &id, input).await?;
    Ok(ApiResponse::created(message.into()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(open))
        .route("/{id}", get(show).delete(delete))
        .route("/{id}/messages", get(messages).post(send))
}

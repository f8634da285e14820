//! Comment endpoints.

use agora_common::AppResult;
use agora_core::{CommentInput, CommentWithCreator};
use agora_db::entities::comment;
use axum::{
    Json, Router,
    extract::{Path, State},
    routing::patch,
};
use serde::Serialize;

use super::{DeletedResponse, users::UserSummary};
use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Comment response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: String,
    pub post_id: String,
    pub creator_id: String,
    pub text: String,
    pub created_at: String,
    pub updated_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator: Option<UserSummary>,
}

impl From<comment::Model> for CommentResponse {
    fn from(c: comment::Model) -> Self {
        Self {
            id: c.id,
            post_id: c.post_id,
            creator_id: c.creator_id,
            text: c.text,
            created_at: c.created_at.to_rfc3339(),
            updated_at: c.updated_at.map(|d| d.to_rfc3339()),
            creator: None,
        }
    }
}

impl From<CommentWithCreator> for CommentResponse {
    fn from((comment, creator): CommentWithCreator) -> Self {
        Self {
            creator: creator.map(Into::into),
            ..Self::from(comment)
        }
    }
}

async fn update(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<CommentInput>,
) -> AppResult<ApiResponse<CommentResponse>> {
    let comment = state.comment_service.update(&user.id, &id, input).await?;
    Ok(ApiResponse::ok(comment.into()))
}

/// Delete a comment. Allowed for its author and for the post's author.
async fn delete(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<DeletedResponse>> {
    let summary = state.comment_service.delete(&user.id, &id).await?;
    Ok(ApiResponse::ok(summary.into()))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/{id}", patch(update).delete(delete))
}

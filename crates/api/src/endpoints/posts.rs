//! Post endpoints, including a post's comment thread.

use agora_common::AppResult;
use agora_core::{CommentInput, CreatePostInput, PostWithCreator, UpdatePostInput};
use agora_db::{entities::post, id_list};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use serde::Serialize;

use super::{DeletedResponse, comments::CommentResponse, users::UserSummary};
use crate::{
    extractors::{AuthUser, Pagination},
    middleware::AppState,
    response::ApiResponse,
};

/// A post without its author.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSummary {
    pub id: String,
    pub creator_id: String,
    pub text: String,
    pub image_url: Option<String>,
    pub comments: Vec<String>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl From<post::Model> for PostSummary {
    fn from(p: post::Model) -> Self {
        Self {
            comments: id_list::ids(&p.comments),
            id: p.id,
            creator_id: p.creator_id,
            text: p.text,
            image_url: p.image_url,
            created_at: p.created_at.to_rfc3339(),
            updated_at: p.updated_at.map(|d| d.to_rfc3339()),
        }
    }
}

/// A post with its author populated.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    #[serde(flatten)]
    pub post: PostSummary,
    pub creator: Option<UserSummary>,
}

impl From<PostWithCreator> for PostResponse {
    fn from((post, creator): PostWithCreator) -> Self {
        Self {
            post: post.into(),
            creator: creator.map(Into::into),
        }
    }
}

/// Global feed, newest first.
async fn feed(
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> AppResult<ApiResponse<Vec<PostResponse>>> {
    let posts = state
        .post_service
        .feed(page.limit(), page.until_id())
        .await?;
    Ok(ApiResponse::ok(posts.into_iter().map(Into::into).collect()))
}

async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreatePostInput>,
) -> AppResult<ApiResponse<PostSummary>> {
    let post = state.post_service.create(&user.id, input).await?;
    Ok(ApiResponse::created(post.into()))
}

async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<PostResponse>> {
    let post = state.post_service.get(&id).await?;
    Ok(ApiResponse::ok(post.into()))
}

async fn update(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdatePostInput>,
) -> AppResult<ApiResponse<PostSummary>> {
    let post = state.post_service.update(&user.id, &id, input).await?;
    Ok(ApiResponse::ok(post.into()))
}

/// Delete a post along with its comments.
async fn delete(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<DeletedResponse>> {
    let summary = state.post_service.delete(&user.id, &id).await?;
    Ok(ApiResponse::ok(summary.into()))
}

/// Comments on a post, oldest first. Pages forward with `sinceId`.
async fn comments(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(page): Query<Pagination>,
) -> AppResult<ApiResponse<Vec<CommentResponse>>> {
    let comments = state
        .comment_service
        .for_post(&id, page.limit(), page.since_id())
        .await?;
    Ok(ApiResponse::ok(comments.into_iter().map(Into::into).collect()))
}

async fn comment(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<CommentInput>,
) -> AppResult<ApiResponse<CommentResponse>> {
    let comment = state.comment_service.create(&user.id, &id, input).await?;
    Ok(ApiResponse::created((comment, Some(user)).into()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(feed).post(create))
        .route("/{id}", get(show).patch(update).delete(delete))
        .route("/{id}/comments", get(comments).post(comment))
}

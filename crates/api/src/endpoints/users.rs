//! User endpoints: profiles, the current account, and follow edges.

use agora_common::AppResult;
use agora_core::UpdateUserInput;
use agora_db::{entities::user, id_list};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use serde::Serialize;

use super::{DeletedResponse, posts::PostSummary};
use crate::{
    extractors::{AuthUser, Pagination},
    middleware::AppState,
    response::ApiResponse,
};

/// Compact user embedded in other resources.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub name: String,
    pub headline: Option<String>,
    pub avatar_url: Option<String>,
}

impl From<user::Model> for UserSummary {
    fn from(u: user::Model) -> Self {
        Self {
            id: u.id,
            name: u.name,
            headline: u.headline,
            avatar_url: u.avatar_url,
        }
    }
}

/// Public profile.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub headline: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub followers: Vec<String>,
    pub following: Vec<String>,
    pub posts_count: usize,
    pub jobs_count: usize,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl From<&user::Model> for UserResponse {
    fn from(u: &user::Model) -> Self {
        Self {
            id: u.id.clone(),
            name: u.name.clone(),
            headline: u.headline.clone(),
            bio: u.bio.clone(),
            avatar_url: u.avatar_url.clone(),
            followers: id_list::ids(&u.followers),
            following: id_list::ids(&u.following),
            posts_count: id_list::ids(&u.posts).len(),
            jobs_count: id_list::ids(&u.jobs).len(),
            created_at: u.created_at.to_rfc3339(),
            updated_at: u.updated_at.map(|d| d.to_rfc3339()),
        }
    }
}

/// The signed-in user's own account, with every relation list.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    #[serde(flatten)]
    pub profile: UserResponse,
    pub email: String,
    pub is_verified: bool,
    pub posts: Vec<String>,
    pub comments: Vec<String>,
    pub jobs: Vec<String>,
    pub applications: Vec<String>,
    pub connections: Vec<String>,
    pub conversations: Vec<String>,
}

impl From<user::Model> for MeResponse {
    fn from(u: user::Model) -> Self {
        Self {
            profile: UserResponse::from(&u),
            is_verified: u.is_verified(),
            posts: id_list::ids(&u.posts),
            comments: id_list::ids(&u.comments),
            jobs: id_list::ids(&u.jobs),
            applications: id_list::ids(&u.applications),
            connections: id_list::ids(&u.connections),
            conversations: id_list::ids(&u.conversations),
            email: u.email,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FollowStateResponse {
    following: bool,
}

/// List users, newest first.
async fn list(
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> AppResult<ApiResponse<Vec<UserResponse>>> {
    let users = state
        .user_service
        .list(page.limit(), page.until_id())
        .await?;
    Ok(ApiResponse::ok(users.iter().map(Into::into).collect()))
}

async fn me(AuthUser(user): AuthUser) -> AppResult<ApiResponse<MeResponse>> {
    Ok(ApiResponse::ok(user.into()))
}

async fn update_me(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<UpdateUserInput>,
) -> AppResult<ApiResponse<MeResponse>> {
    let updated = state.user_service.update(&user.id, input).await?;
    Ok(ApiResponse::ok(updated.into()))
}

/// Delete the caller's account and everything it owns.
async fn delete_me(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<DeletedResponse>> {
    let summary = state.user_service.delete(&user.id).await?;
    Ok(ApiResponse::ok(summary.into()))
}

async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<UserResponse>> {
    let user = state.user_service.get(&id).await?;
    Ok(ApiResponse::ok((&user).into()))
}

async fn posts(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(page): Query<Pagination>,
) -> AppResult<ApiResponse<Vec<PostSummary>>> {
    state.user_service.get(&id).await?;
    let posts = state
        .post_service
        .by_user(&id, page.limit(), page.until_id())
        .await?;
    Ok(ApiResponse::ok(posts.into_iter().map(Into::into).collect()))
}

async fn follow(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<FollowStateResponse>> {
    state.following_service.follow(&user.id, &id).await?;
    Ok(ApiResponse::ok(FollowStateResponse { following: true }))
}

async fn unfollow(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<FollowStateResponse>> {
    state.following_service.unfollow(&user.id, &id).await?;
    Ok(ApiResponse::ok(FollowStateResponse { following: false }))
}

async fn toggle_follow(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<FollowStateResponse>> {
    let following = state.following_service.toggle(&user.id, &id).await?;
    Ok(ApiResponse::ok(FollowStateResponse { following }))
}

async fn followers(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Vec<UserSummary>>> {
    let users = state.following_service.followers(&id).await?;
    Ok(ApiResponse::ok(users.into_iter().map(Into::into).collect()))
}

async fn following(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Vec<UserSummary>>> {
    let users = state.following_service.following(&id).await?;
    Ok(ApiResponse::ok(users.into_iter().map(Into::into).collect()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/me", get(me).patch(update_me).delete(delete_me))
        .route("/{id}", get(show))
        .route("/{id}/posts", get(posts))
        .route("/{id}/follow", post(follow).delete(unfollow))
        .route("/{id}/follow/toggle", post(toggle_follow))
        .route("/{id}/followers", get(followers))
        .route("/{id}/following", get(following))
}

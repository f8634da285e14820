//! API endpoints.

mod applications;
mod auth;
mod comments;
mod connections;
mod conversations;
mod health;
mod jobs;
mod messages;
mod posts;
mod users;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .nest("/auth", auth::router())
        .nest("/users", users::router())
        .nest("/posts", posts::router())
        .nest("/comments", comments::router())
        .nest("/jobs", jobs::router())
        .nest("/applications", applications::router())
        .nest("/connections", connections::router())
        .nest("/conversations", conversations::router())
        .nest("/messages", messages::router())
}

/// Response body for delete endpoints.
#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedResponse {
    pub deleted: usize,
    pub documents_updated: usize,
}

impl From<agora_core::CascadeSummary> for DeletedResponse {
    fn from(summary: agora_core::CascadeSummary) -> Self {
        Self {
            deleted: summary.deleted,
            documents_updated: summary.documents_updated,
        }
    }
}

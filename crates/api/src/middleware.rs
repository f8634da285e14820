//! API middleware.

#![allow(missing_docs)]

use std::sync::Arc;

use agora_common::config::AuthConfig;
use agora_core::{
    ApplicationService, AuthService, CommentService, ConnectionService, FollowingService,
    IntegrityService, JobService, MessagingService, NotifierService, PostService,
    SessionService, UserService,
};
use agora_db::repositories::{
    ApplicationRepository, CommentRepository, ConnectionRepository, JobRepository,
    MessagingRepository, PostRepository, UserRepository,
};
use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use sea_orm::DatabaseConnection;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub auth_service: AuthService,
    pub user_service: UserService,
    pub following_service: FollowingService,
    pub post_service: PostService,
    pub comment_service: CommentService,
    pub job_service: JobService,
    pub application_service: ApplicationService,
    pub connection_service: ConnectionService,
    pub messaging_service: MessagingService,
}

impl AppState {
    /// Wire every service onto one connection pool.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>, auth: &AuthConfig, notifier: NotifierService) -> Self {
        let user_repo = UserRepository::new(Arc::clone(&db));
        let post_repo = PostRepository::new(Arc::clone(&db));
        let job_repo = JobRepository::new(Arc::clone(&db));
        let integrity = IntegrityService::new(Arc::clone(&db));

        Self {
            auth_service: AuthService::new(
                user_repo.clone(),
                SessionService::new(auth),
                notifier,
                auth,
            ),
            user_service: UserService::new(user_repo.clone(), integrity.clone()),
            following_service: FollowingService::new(user_repo.clone(), integrity.clone()),
            post_service: PostService::new(post_repo.clone(), integrity.clone()),
            comment_service: CommentService::new(
                CommentRepository::new(Arc::clone(&db)),
                post_repo,
                integrity.clone(),
            ),
            job_service: JobService::new(job_repo.clone(), integrity.clone()),
            application_service: ApplicationService::new(
                ApplicationRepository::new(Arc::clone(&db)),
                job_repo,
                integrity.clone(),
            ),
            connection_service: ConnectionService::new(
                ConnectionRepository::new(Arc::clone(&db)),
                user_repo.clone(),
                integrity.clone(),
            ),
            messaging_service: MessagingService::new(
                MessagingRepository::new(Arc::clone(&db)),
                user_repo,
                integrity,
            ),
            db,
        }
    }
}

/// Authentication middleware.
///
/// A valid bearer token attaches its user to the request. Anything else
/// passes through anonymously and is rejected later by
/// [`crate::extractors::AuthUser`] on routes that need a user.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get(header::AUTHORIZATION)
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        match state.auth_service.authenticate(token.trim()).await {
            Ok(user) => {
                req.extensions_mut().insert(user);
            }
            Err(e) => tracing::debug!(error = %e, "Bearer token rejected"),
        }
    }

    next.run(req).await
}

//! HTTP API layer for agora.
//!
//! - **Endpoints**: REST routes for accounts, posts, jobs, connections and messaging
//! - **Extractors**: authenticated user, pagination
//! - **Middleware**: bearer-token authentication
//!
//! Built on Axum 0.8. Tracing and CORS layers are added by the server binary.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

use axum::{Router, middleware::from_fn_with_state};

pub use endpoints::router;
pub use middleware::{AppState, auth_middleware};

/// The API router with authentication applied and state attached.
pub fn app(state: AppState) -> Router {
    router()
        .layer(from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}

//! Request extractors.

use agora_common::AppError;
use agora_db::{entities::user, repositories::MAX_PAGE_SIZE};
use axum::{extract::FromRequestParts, http::request::Parts};
use serde::Deserialize;

/// Authenticated user extractor.
///
/// The user is placed in the request extensions by
/// [`crate::middleware::auth_middleware`].
#[derive(Debug, Clone)]
pub struct AuthUser(pub user::Model);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<user::Model>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| AppError::Unauthorized("authentication required".to_string()))
    }
}

const DEFAULT_LIMIT: u64 = 20;

/// Cursor pagination query: `?limit=&untilId=&sinceId=`.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub limit: Option<u64>,
    pub until_id: Option<String>,
    pub since_id: Option<String>,
}

impl Pagination {
    /// Requested page size, clamped to `1..=MAX_PAGE_SIZE`.
    #[must_use]
    pub fn limit(&self) -> u64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_PAGE_SIZE)
    }

    #[must_use]
    pub fn until_id(&self) -> Option<&str> {
        self.until_id.as_deref()
    }

    #[must_use]
    pub fn since_id(&self) -> Option<&str> {
        self.since_id.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_defaults_and_clamps() {
        assert_eq!(Pagination::default().limit(), 20);

        let page = Pagination {
            limit: Some(500),
            ..Default::default()
        };
        assert_eq!(page.limit(), 100);

        let page = Pagination {
            limit: Some(0),
            ..Default::default()
        };
        assert_eq!(page.limit(), 1);
    }
}

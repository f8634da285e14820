//! Application endpoints.

use agora_common::AppResult;
use agora_core::ApplicationWithApplicant;
use axum::{
    Router,
    extract::{Path, State},
    routing::delete,
};
use serde::Serialize;

use super::{DeletedResponse, users::UserSummary};
use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Application response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationResponse {
    pub id: String,
    pub job_id: String,
    pub applicant_id: String,
    pub cover_letter: Option<String>,
    pub resume_url: Option<String>,
    pub created_at: String,
    pub applicant: Option<UserSummary>,
}

impl From<ApplicationWithApplicant> for ApplicationResponse {
    fn from((a, applicant): ApplicationWithApplicant) -> Self {
        Self {
            id: a.id,
            job_id: a.job_id,
            applicant_id: a.applicant_id,
            cover_letter: a.cover_letter,
            resume_url: a.resume_url,
            created_at: a.created_at.to_rfc3339(),
            applicant: applicant.map(Into::into),
        }
    }
}

/// Withdraw (applicant) or dismiss (job poster) an application.
async fn remove(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<DeletedResponse>> {
    let summary = state.application_service.delete(&user.id, &id).await?;
    Ok(ApiResponse::ok(summary.into()))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/{id}", delete(remove))
}

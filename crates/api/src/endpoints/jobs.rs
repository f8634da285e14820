//! Job endpoints, including applications to a job.

use agora_common::AppResult;
use agora_core::{ApplyInput, CreateJobInput, UpdateJobInput};
use agora_db::{entities::job, id_list};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use serde::Serialize;

use super::{DeletedResponse, applications::ApplicationResponse};
use crate::{
    extractors::{AuthUser, Pagination},
    middleware::AppState,
    response::ApiResponse,
};

/// Job response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResponse {
    pub id: String,
    pub creator_id: String,
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub description: String,
    pub applicants: Vec<String>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl From<job::Model> for JobResponse {
    fn from(j: job::Model) -> Self {
        Self {
            applicants: id_list::ids(&j.applicants),
            id: j.id,
            creator_id: j.creator_id,
            title: j.title,
            company: j.company,
            location: j.location,
            description: j.description,
            created_at: j.created_at.to_rfc3339(),
            updated_at: j.updated_at.map(|d| d.to_rfc3339()),
        }
    }
}

async fn list(
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> AppResult<ApiResponse<Vec<JobResponse>>> {
    let jobs = state
        .job_service
        .list(page.limit(), page.until_id())
        .await?;
    Ok(ApiResponse::ok(jobs.into_iter().map(Into::into).collect()))
}

async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateJobInput>,
) -> AppResult<ApiResponse<JobResponse>> {
    let job = state.job_service.create(&user.id, input).await?;
    Ok(ApiResponse::created(job.into()))
}

async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<JobResponse>> {
    let job = state.job_service.get(&id).await?;
    Ok(ApiResponse::ok(job.into()))
}

async fn update(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdateJobInput>,
) -> AppResult<ApiResponse<JobResponse>> {
    let job = state.job_service.update(&user.id, &id, input).await?;
    Ok(ApiResponse::ok(job.into()))
}

/// Delete a job along with every application to it.
async fn delete(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<DeletedResponse>> {
    let summary = state.job_service.delete(&user.id, &id).await?;
    Ok(ApiResponse::ok(summary.into()))
}

/// Applications to a job. Only the poster may list them.
async fn applications(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(page): Query<Pagination>,
) -> AppResult<ApiResponse<Vec<ApplicationResponse>>> {
    let applications = state
        .application_service
        .for_job(&user.id, &id, page.limit(), page.until_id())
        .await?;
    Ok(ApiResponse::ok(
        applications.into_iter().map(Into::into).collect(),
    ))
}

async fn apply(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<ApplyInput>,
) -> AppResult<ApiResponse<ApplicationResponse>> {
    let application = state
        .application_service
        .apply(&user.id, &id, input)
        .await?;
    Ok(ApiResponse::created((application, Some(user)).into()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(show).patch(update).delete(delete))
        .route("/{id}/applications", get(applications).post(apply))
}

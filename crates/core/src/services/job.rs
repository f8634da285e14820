//! Job service.

use agora_common::{AppError, AppResult, IdGenerator};
use agora_db::{entities::job, id_list, repositories::JobRepository};
use chrono::Utc;
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

use crate::services::integrity::{CascadeSummary, IntegrityService, Root};

/// Job service for business logic.
#[derive(Clone)]
pub struct JobService {
    job_repo: JobRepository,
    integrity: IntegrityService,
    id_gen: IdGenerator,
}

/// Input for posting a job.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateJobInput {
    #[validate(length(min = 1, max = 256))]
    pub title: String,

    #[validate(length(min = 1, max = 256))]
    pub company: String,

    #[validate(length(max = 256))]
    pub location: Option<String>,

    #[validate(length(min = 1, max = 10000))]
    pub description: String,
}

/// Input for editing a job. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateJobInput {
    #[validate(length(min = 1, max = 256))]
    pub title: Option<String>,

    #[validate(length(min = 1, max = 256))]
    pub company: Option<String>,

    #[validate(length(max = 256))]
    pub location: Option<String>,

    #[validate(length(min = 1, max = 10000))]
    pub description: Option<String>,
}

impl JobService {
    /// Create a new job service.
    #[must_use]
    pub const fn new(job_repo: JobRepository, integrity: IntegrityService) -> Self {
        Self {
            job_repo,
            integrity,
            id_gen: IdGenerator::new(),
        }
    }

    /// Post a job.
    pub async fn create(&self, creator_id: &str, input: CreateJobInput) -> AppResult<job::Model> {
        input.validate()?;

        let model = job::ActiveModel {
            id: Set(self.id_gen.generate()),
            creator_id: Set(creator_id.to_string()),
            title: Set(input.title),
            company: Set(input.company),
            location: Set(input.location),
            description: Set(input.description),
            applicants: Set(id_list::empty()),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        self.integrity.create_job(model).await
    }

    /// Get a job by ID.
    pub async fn get(&self, id: &str) -> AppResult<job::Model> {
        self.job_repo.get_by_id(id).await
    }

    /// List jobs, newest first.
    pub async fn list(&self, limit: u64, until_id: Option<&str>) -> AppResult<Vec<job::Model>> {
        self.job_repo.list(limit, until_id).await
    }

    /// Edit a job. Only the creator may edit.
    pub async fn update(
        &self,
        actor_id: &str,
        id: &str,
        input: UpdateJobInput,
    ) -> AppResult<job::Model> {
        input.validate()?;

        let job = self.owned(actor_id, id).await?;
        let mut active: job::ActiveModel = job.into();

        if let Some(title) = input.title {
            active.title = Set(title);
        }
        if let Some(company) = input.company {
            active.company = Set(company);
        }
        if let Some(location) = input.location {
            active.location = Set(Some(location).filter(|l| !l.is_empty()));
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        active.updated_at = Set(Some(Utc::now().into()));

        self.job_repo.update(active).await
    }

    /// Delete a job and its applications. Only the creator may delete.
    pub async fn delete(&self, actor_id: &str, id: &str) -> AppResult<CascadeSummary> {
        let job = self.owned(actor_id, id).await?;
        self.integrity.delete(Root::Job(job.id)).await
    }

    /// Load a job and check that `actor_id` posted it.
    pub async fn owned(&self, actor_id: &str, id: &str) -> AppResult<job::Model> {
        let job = self.job_repo.get_by_id(id).await?;
        if job.creator_id != actor_id {
            return Err(AppError::Forbidden(
                "Only the poster can manage this job".to_string(),
            ));
        }
        Ok(job)
    }
}

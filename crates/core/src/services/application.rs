//! Job application service.

use agora_common::{AppError, AppResult, IdGenerator};
use agora_db::{
    entities::{application, user},
    repositories::{ApplicationRepository, JobRepository},
};
use chrono::Utc;
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

use crate::services::integrity::{CascadeSummary, IntegrityService, Root};

/// An application with its applicant populated.
pub type ApplicationWithApplicant = (application::Model, Option<user::Model>);

/// Application service for business logic.
#[derive(Clone)]
pub struct ApplicationService {
    application_repo: ApplicationRepository,
    job_repo: JobRepository,
    integrity: IntegrityService,
    id_gen: IdGenerator,
}

/// Input for applying to a job.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ApplyInput {
    #[validate(length(max = 5000))]
    pub cover_letter: Option<String>,

    #[validate(url)]
    pub resume_url: Option<String>,
}

impl ApplicationService {
    /// Create a new application service.
    #[must_use]
    pub const fn new(
        application_repo: ApplicationRepository,
        job_repo: JobRepository,
        integrity: IntegrityService,
    ) -> Self {
        Self {
            application_repo,
            job_repo,
            integrity,
            id_gen: IdGenerator::new(),
        }
    }

    /// Apply to a job.
    pub async fn apply(
        &self,
        applicant_id: &str,
        job_id: &str,
        input: ApplyInput,
    ) -> AppResult<application::Model> {
        input.validate()?;

        let job = self.job_repo.get_by_id(job_id).await?;
        if job.creator_id == applicant_id {
            return Err(AppError::BadRequest(
                "Cannot apply to your own job".to_string(),
            ));
        }
        if self
            .application_repo
            .find_by_job_and_applicant(job_id, applicant_id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "Already applied to this job".to_string(),
            ));
        }

        let model = application::ActiveModel {
            id: Set(self.id_gen.generate()),
            job_id: Set(job.id),
            applicant_id: Set(applicant_id.to_string()),
            cover_letter: Set(input.cover_letter),
            resume_url: Set(input.resume_url),
            created_at: Set(Utc::now().into()),
        };

        self.integrity.create_application(model).await
    }

    /// Applications to a job. Only the job's poster may list them.
    pub async fn for_job(
        &self,
        actor_id: &str,
        job_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<ApplicationWithApplicant>> {
        let job = self.job_repo.get_by_id(job_id).await?;
        if job.creator_id != actor_id {
            return Err(AppError::Forbidden(
                "Only the poster can view applications".to_string(),
            ));
        }

        self.application_repo
            .find_by_job_with_applicant(job_id, limit, until_id)
            .await
    }

    /// Withdraw (applicant) or dismiss (job poster) an application.
    pub async fn delete(&self, actor_id: &str, id: &str) -> AppResult<CascadeSummary> {
        let application = self
            .application_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Application {id}")))?;

        if application.applicant_id != actor_id {
            let job_owner = self
                .job_repo
                .find_by_id(&application.job_id)
                .await?
                .map(|j| j.creator_id);
            if job_owner.as_deref() != Some(actor_id) {
                return Err(AppError::Forbidden(
                    "Not allowed to delete this application".to_string(),
                ));
            }
        }

        self.integrity
            .delete(Root::Application(application.id))
            .await
    }
}

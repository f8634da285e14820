//! Job application repository.

use std::sync::Arc;

use crate::entities::{Application, User, application, user};
use agora_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect,
};

/// Application repository for database operations.
#[derive(Clone)]
pub struct ApplicationRepository {
    db: Arc<DatabaseConnection>,
}

impl ApplicationRepository {
    /// Create a new application repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an application by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<application::Model>> {
        Self::find_by_id_in_conn(self.db.as_ref(), id).await
    }

    /// Find the application a user submitted to a job, if any.
    pub async fn find_by_job_and_applicant(
        &self,
        job_id: &str,
        applicant_id: &str,
    ) -> AppResult<Option<application::Model>> {
        Application::find()
            .filter(application::Column::JobId.eq(job_id))
            .filter(application::Column::ApplicantId.eq(applicant_id))
            .one(self.db.as_ref())
            .await
            .map_err(AppError::db)
    }

    /// Applications to a job with applicants populated, newest first.
    pub async fn find_by_job_with_applicant(
        &self,
        job_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<(application::Model, Option<user::Model>)>> {
        let mut query = Application::find()
            .filter(application::Column::JobId.eq(job_id))
            .find_also_related(User)
            .order_by_desc(application::Column::Id);

        if let Some(id) = until_id {
            query = query.filter(application::Column::Id.lt(id));
        }

        query
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(AppError::db)
    }

    /// Find an application by ID on the given connection.
    pub async fn find_by_id_in_conn<C: ConnectionTrait>(
        conn: &C,
        id: &str,
    ) -> AppResult<Option<application::Model>> {
        Application::find_by_id(id)
            .one(conn)
            .await
            .map_err(AppError::db)
    }

    /// All applications to any of `job_ids`.
    pub async fn find_by_job_ids_in_conn<C: ConnectionTrait>(
        conn: &C,
        job_ids: &[String],
    ) -> AppResult<Vec<application::Model>> {
        if job_ids.is_empty() {
            return Ok(vec![]);
        }

        Application::find()
            .filter(application::Column::JobId.is_in(job_ids.to_vec()))
            .all(conn)
            .await
            .map_err(AppError::db)
    }

    /// All applications submitted by any of `applicant_ids`.
    pub async fn find_by_applicant_ids_in_conn<C: ConnectionTrait>(
        conn: &C,
        applicant_ids: &[String],
    ) -> AppResult<Vec<application::Model>> {
        if applicant_ids.is_empty() {
            return Ok(vec![]);
        }

        Application::find()
            .filter(application::Column::ApplicantId.is_in(applicant_ids.to_vec()))
            .all(conn)
            .await
            .map_err(AppError::db)
    }

    /// Insert an application.
    pub async fn create_in_conn<C: ConnectionTrait>(
        conn: &C,
        model: application::ActiveModel,
    ) -> AppResult<application::Model> {
        model.insert(conn).await.map_err(AppError::db)
    }

    /// Hard-delete a single application. Returns whether a row was removed.
    pub async fn delete_by_id_in_conn<C: ConnectionTrait>(conn: &C, id: &str) -> AppResult<bool> {
        Application::delete_by_id(id)
            .exec(conn)
            .await
            .map(|res| res.rows_affected > 0)
            .map_err(AppError::db)
    }
}

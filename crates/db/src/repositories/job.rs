//! Job repository.

use std::sync::Arc;

use crate::entities::{Job, job};
use agora_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect,
};

/// Job repository for database operations.
#[derive(Clone)]
pub struct JobRepository {
    db: Arc<DatabaseConnection>,
}

impl JobRepository {
    /// Create a new job repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a job by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<job::Model>> {
        Self::find_by_id_in_conn(self.db.as_ref(), id).await
    }

    /// Find a job by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<job::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Job {id}")))
    }

    /// Update a job.
    pub async fn update(&self, model: job::ActiveModel) -> AppResult<job::Model> {
        model.update(self.db.as_ref()).await.map_err(AppError::db)
    }

    /// List open jobs, newest first.
    pub async fn list(&self, limit: u64, until_id: Option<&str>) -> AppResult<Vec<job::Model>> {
        let mut query = Job::find().order_by_desc(job::Column::Id);

        if let Some(id) = until_id {
            query = query.filter(job::Column::Id.lt(id));
        }

        query
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(AppError::db)
    }

    /// Find a job by ID on the given connection.
    pub async fn find_by_id_in_conn<C: ConnectionTrait>(
        conn: &C,
        id: &str,
    ) -> AppResult<Option<job::Model>> {
        Job::find_by_id(id).one(conn).await.map_err(AppError::db)
    }

    /// All jobs posted by any of `creator_ids`.
    pub async fn find_by_creator_ids_in_conn<C: ConnectionTrait>(
        conn: &C,
        creator_ids: &[String],
    ) -> AppResult<Vec<job::Model>> {
        if creator_ids.is_empty() {
            return Ok(vec![]);
        }

        Job::find()
            .filter(job::Column::CreatorId.is_in(creator_ids.to_vec()))
            .all(conn)
            .await
            .map_err(AppError::db)
    }

    /// Insert a job.
    pub async fn create_in_conn<C: ConnectionTrait>(
        conn: &C,
        model: job::ActiveModel,
    ) -> AppResult<job::Model> {
        model.insert(conn).await.map_err(AppError::db)
    }

    /// Hard-delete a single job. Returns whether a row was removed.
    pub async fn delete_by_id_in_conn<C: ConnectionTrait>(conn: &C, id: &str) -> AppResult<bool> {
        Job::delete_by_id(id)
            .exec(conn)
            .await
            .map(|res| res.rows_affected > 0)
            .map_err(AppError::db)
    }
}

//! Comment repository.

use std::sync::Arc;

use crate::entities::{Comment, User, comment, user};
use agora_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect,
};

/// Comment repository for database operations.
#[derive(Clone)]
pub struct CommentRepository {
    db: Arc<DatabaseConnection>,
}

impl CommentRepository {
    /// Create a new comment repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a comment by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<comment::Model>> {
        Self::find_by_id_in_conn(self.db.as_ref(), id).await
    }

    /// Update a comment.
    pub async fn update(&self, model: comment::ActiveModel) -> AppResult<comment::Model> {
        model.update(self.db.as_ref()).await.map_err(AppError::db)
    }

    /// Comments on a post, oldest first, with creators populated.
    pub async fn find_by_post_with_creator(
        &self,
        post_id: &str,
        limit: u64,
        since_id: Option<&str>,
    ) -> AppResult<Vec<(comment::Model, Option<user::Model>)>> {
        let mut query = Comment::find()
            .filter(comment::Column::PostId.eq(post_id))
            .find_also_related(User)
            .order_by_asc(comment::Column::Id);

        if let Some(id) = since_id {
            query = query.filter(comment::Column::Id.gt(id));
        }

        query
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(AppError::db)
    }

    /// Find a comment by ID on the given connection.
    pub async fn find_by_id_in_conn<C: ConnectionTrait>(
        conn: &C,
        id: &str,
    ) -> AppResult<Option<comment::Model>> {
        Comment::find_by_id(id).one(conn).await.map_err(AppError::db)
    }

    /// All comments on any of `post_ids`.
    pub async fn find_by_post_ids_in_conn<C: ConnectionTrait>(
        conn: &C,
        post_ids: &[String],
    ) -> AppResult<Vec<comment::Model>> {
        if post_ids.is_empty() {
            return Ok(vec![]);
        }

        Comment::find()
            .filter(comment::Column::PostId.is_in(post_ids.to_vec()))
            .all(conn)
            .await
            .map_err(AppError::db)
    }

    /// All comments written by any of `creator_ids`.
    pub async fn find_by_creator_ids_in_conn<C: ConnectionTrait>(
        conn: &C,
        creator_ids: &[String],
    ) -> AppResult<Vec<comment::Model>> {
        if creator_ids.is_empty() {
            return Ok(vec![]);
        }

        Comment::find()
            .filter(comment::Column::CreatorId.is_in(creator_ids.to_vec()))
            .all(conn)
            .await
            .map_err(AppError::db)
    }

    /// Insert a comment.
    pub async fn create_in_conn<C: ConnectionTrait>(
        conn: &C,
        model: comment::ActiveModel,
    ) -> AppResult<comment::Model> {
        model.insert(conn).await.map_err(AppError::db)
    }

    /// Hard-delete a single comment. Returns whether a row was removed.
    pub async fn delete_by_id_in_conn<C: ConnectionTrait>(conn: &C, id: &str) -> AppResult<bool> {
        Comment::delete_by_id(id)
            .exec(conn)
            .await
            .map(|res| res.rows_affected > 0)
            .map_err(AppError::db)
    }
}

//! Post repository.

use std::sync::Arc;

use crate::entities::{Post, User, post, user};
use agora_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect,
};

/// Post repository for database operations.
#[derive(Clone)]
pub struct PostRepository {
    db: Arc<DatabaseConnection>,
}

impl PostRepository {
    /// Create a new post repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a post by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<post::Model>> {
        Self::find_by_id_in_conn(self.db.as_ref(), id).await
    }

    /// Find a post by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<post::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::PostNotFound(id.to_string()))
    }

    /// Find a post together with its creator.
    pub async fn find_with_creator(
        &self,
        id: &str,
    ) -> AppResult<Option<(post::Model, Option<user::Model>)>> {
        Post::find_by_id(id)
            .find_also_related(User)
            .one(self.db.as_ref())
            .await
            .map_err(AppError::db)
    }

    /// Update a post.
    pub async fn update(&self, model: post::ActiveModel) -> AppResult<post::Model> {
        model.update(self.db.as_ref()).await.map_err(AppError::db)
    }

    /// Global feed, newest first, with creators populated.
    pub async fn list_with_creator(
        &self,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<(post::Model, Option<user::Model>)>> {
        let mut query = Post::find()
            .find_also_related(User)
            .order_by_desc(post::Column::Id);

        if let Some(id) = until_id {
            query = query.filter(post::Column::Id.lt(id));
        }

        query
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(AppError::db)
    }

    /// Posts by one user, newest first.
    pub async fn find_by_creator(
        &self,
        creator_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<post::Model>> {
        let mut query = Post::find()
            .filter(post::Column::CreatorId.eq(creator_id))
            .order_by_desc(post::Column::Id);

        if let Some(id) = until_id {
            query = query.filter(post::Column::Id.lt(id));
        }

        query
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(AppError::db)
    }

    /// Find a post by ID on the given connection.
    pub async fn find_by_id_in_conn<C: ConnectionTrait>(
        conn: &C,
        id: &str,
    ) -> AppResult<Option<post::Model>> {
        Post::find_by_id(id).one(conn).await.map_err(AppError::db)
    }

    /// All posts created by any of `creator_ids`.
    pub async fn find_by_creator_ids_in_conn<C: ConnectionTrait>(
        conn: &C,
        creator_ids: &[String],
    ) -> AppResult<Vec<post::Model>> {
        if creator_ids.is_empty() {
            return Ok(vec![]);
        }

        Post::find()
            .filter(post::Column::CreatorId.is_in(creator_ids.to_vec()))
            .all(conn)
            .await
            .map_err(AppError::db)
    }

    /// Insert a post.
    pub async fn create_in_conn<C: ConnectionTrait>(
        conn: &C,
        model: post::ActiveModel,
    ) -> AppResult<post::Model> {
        model.insert(conn).await.map_err(AppError::db)
    }

    /// Hard-delete a single post. Returns whether a row was removed.
    pub async fn delete_by_id_in_conn<C: ConnectionTrait>(conn: &C, id: &str) -> AppResult<bool> {
        Post::delete_by_id(id)
            .exec(conn)
            .await
            .map(|res| res.rows_affected > 0)
            .map_err(AppError::db)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::id_list;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_post(id: &str, creator_id: &str) -> post::Model {
        post::Model {
            id: id.to_string(),
            creator_id: creator_id.to_string(),
            text: "hello".to_string(),
            image_url: None,
            comments: id_list::empty(),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_get_by_id_not_found_is_post_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<post::Model>::new()])
            .into_connection();

        let repo = PostRepository::new(Arc::new(db));
        let result = repo.get_by_id("nope").await;

        assert!(matches!(result, Err(AppError::PostNotFound(id)) if id == "nope"));
    }

    #[tokio::test]
    async fn test_find_by_creator() {
        let p1 = create_test_post("p2", "u1");
        let p2 = create_test_post("p1", "u1");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[p1, p2]])
            .into_connection();

        let repo = PostRepository::new(Arc::new(db));
        let posts = repo.find_by_creator("u1", 10, None).await.unwrap();

        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].id, "p2");
    }
}

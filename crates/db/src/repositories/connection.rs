//! Connection repository.

use std::sync::Arc;

use crate::entities::{Connection, connection};
use agora_common::{AppError, AppResult};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};

/// Connection repository for database operations.
#[derive(Clone)]
pub struct ConnectionRepository {
    db: Arc<DatabaseConnection>,
}

impl ConnectionRepository {
    /// Create a new connection repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a connection by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<connection::Model>> {
        Self::find_by_id_in_conn(self.db.as_ref(), id).await
    }

    /// Find a connection between two users in either direction.
    pub async fn find_between(
        &self,
        user_a: &str,
        user_b: &str,
    ) -> AppResult<Option<connection::Model>> {
        Connection::find()
            .filter(
                Condition::any()
                    .add(
                        Condition::all()
                            .add(connection::Column::SenderId.eq(user_a))
                            .add(connection::Column::RecipientId.eq(user_b)),
                    )
                    .add(
                        Condition::all()
                            .add(connection::Column::SenderId.eq(user_b))
                            .add(connection::Column::RecipientId.eq(user_a)),
                    ),
            )
            .one(self.db.as_ref())
            .await
            .map_err(AppError::db)
    }

    /// Connections a user is part of, newest first.
    pub async fn find_for_user(
        &self,
        user_id: &str,
        status: Option<connection::ConnectionStatus>,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<connection::Model>> {
        let mut query = Connection::find()
            .filter(
                Condition::any()
                    .add(connection::Column::SenderId.eq(user_id))
                    .add(connection::Column::RecipientId.eq(user_id)),
            )
            .order_by_desc(connection::Column::Id);

        if let Some(status) = status {
            query = query.filter(connection::Column::Status.eq(status));
        }

        if let Some(id) = until_id {
            query = query.filter(connection::Column::Id.lt(id));
        }

        query
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(AppError::db)
    }

    /// Find a connection by ID on the given connection.
    pub async fn find_by_id_in_conn<C: ConnectionTrait>(
        conn: &C,
        id: &str,
    ) -> AppResult<Option<connection::Model>> {
        Connection::find_by_id(id)
            .one(conn)
            .await
            .map_err(AppError::db)
    }

    /// Find a connection and hold its row lock until the transaction ends.
    pub async fn lock_by_id_in_conn<C: ConnectionTrait>(
        conn: &C,
        id: &str,
    ) -> AppResult<Option<connection::Model>> {
        Connection::find_by_id(id)
            .lock_exclusive()
            .one(conn)
            .await
            .map_err(AppError::db)
    }

    /// All connections where any of `user_ids` is sender or recipient.
    pub async fn find_by_user_ids_in_conn<C: ConnectionTrait>(
        conn: &C,
        user_ids: &[String],
    ) -> AppResult<Vec<connection::Model>> {
        if user_ids.is_empty() {
            return Ok(vec![]);
        }

        Connection::find()
            .filter(
                Condition::any()
                    .add(connection::Column::SenderId.is_in(user_ids.to_vec()))
                    .add(connection::Column::RecipientId.is_in(user_ids.to_vec())),
            )
            .all(conn)
            .await
            .map_err(AppError::db)
    }

    /// Insert a connection.
    pub async fn create_in_conn<C: ConnectionTrait>(
        conn: &C,
        model: connection::ActiveModel,
    ) -> AppResult<connection::Model> {
        model.insert(conn).await.map_err(AppError::db)
    }

    /// Move a connection to a new status.
    pub async fn set_status_in_conn<C: ConnectionTrait>(
        conn: &C,
        model: connection::Model,
        status: connection::ConnectionStatus,
    ) -> AppResult<connection::Model> {
        let mut active: connection::ActiveModel = model.into();
        active.status = Set(status);
        active.updated_at = Set(Some(Utc::now().into()));
        active.update(conn).await.map_err(AppError::db)
    }

    /// Hard-delete a single connection. Returns whether a row was removed.
    pub async fn delete_by_id_in_conn<C: ConnectionTrait>(conn: &C, id: &str) -> AppResult<bool> {
        Connection::delete_by_id(id)
            .exec(conn)
            .await
            .map(|res| res.rows_affected > 0)
            .map_err(AppError::db)
    }
}

//! Conversation and message repository.

use std::sync::Arc;

use crate::entities::{Conversation, Message, conversation, message};
use agora_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, prelude::DateTimeWithTimeZone, sea_query::Expr,
};

/// Messaging repository for database operations.
#[derive(Clone)]
pub struct MessagingRepository {
    db: Arc<DatabaseConnection>,
}

impl MessagingRepository {
    /// Create a new messaging repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a conversation by ID.
    pub async fn find_conversation(&self, id: &str) -> AppResult<Option<conversation::Model>> {
        Self::find_conversation_in_conn(self.db.as_ref(), id).await
    }

    /// Find conversations by IDs, most recently active first.
    pub async fn find_conversations_by_ids(
        &self,
        ids: &[String],
    ) -> AppResult<Vec<conversation::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        Conversation::find()
            .filter(conversation::Column::Id.is_in(ids.to_vec()))
            .order_by_desc(conversation::Column::UpdatedAt)
            .order_by_desc(conversation::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(AppError::db)
    }

    /// Find a message by ID.
    pub async fn find_message(&self, id: &str) -> AppResult<Option<message::Model>> {
        Self::find_message_in_conn(self.db.as_ref(), id).await
    }

    /// Messages in a conversation, newest first.
    pub async fn find_messages(
        &self,
        conversation_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<message::Model>> {
        let mut query = Message::find()
            .filter(message::Column::ConversationId.eq(conversation_id))
            .order_by_desc(message::Column::Id);

        if let Some(id) = until_id {
            query = query.filter(message::Column::Id.lt(id));
        }

        query
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(AppError::db)
    }

    /// Find a conversation by ID on the given connection.
    pub async fn find_conversation_in_conn<C: ConnectionTrait>(
        conn: &C,
        id: &str,
    ) -> AppResult<Option<conversation::Model>> {
        Conversation::find_by_id(id)
            .one(conn)
            .await
            .map_err(AppError::db)
    }

    /// Find conversations by IDs on the given connection.
    pub async fn find_conversations_by_ids_in_conn<C: ConnectionTrait>(
        conn: &C,
        ids: &[String],
    ) -> AppResult<Vec<conversation::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        Conversation::find()
            .filter(conversation::Column::Id.is_in(ids.to_vec()))
            .all(conn)
            .await
            .map_err(AppError::db)
    }

    /// Find a message by ID on the given connection.
    pub async fn find_message_in_conn<C: ConnectionTrait>(
        conn: &C,
        id: &str,
    ) -> AppResult<Option<message::Model>> {
        Message::find_by_id(id).one(conn).await.map_err(AppError::db)
    }

    /// All messages in any of `conversation_ids`.
    pub async fn find_messages_by_conversation_ids_in_conn<C: ConnectionTrait>(
        conn: &C,
        conversation_ids: &[String],
    ) -> AppResult<Vec<message::Model>> {
        if conversation_ids.is_empty() {
            return Ok(vec![]);
        }

        Message::find()
            .filter(message::Column::ConversationId.is_in(conversation_ids.to_vec()))
            .all(conn)
            .await
            .map_err(AppError::db)
    }

    /// Insert a conversation.
    pub async fn create_conversation_in_conn<C: ConnectionTrait>(
        conn: &C,
        model: conversation::ActiveModel,
    ) -> AppResult<conversation::Model> {
        model.insert(conn).await.map_err(AppError::db)
    }

    /// Insert a message.
    pub async fn create_message_in_conn<C: ConnectionTrait>(
        conn: &C,
        model: message::ActiveModel,
    ) -> AppResult<message::Model> {
        model.insert(conn).await.map_err(AppError::db)
    }

    /// Bump a conversation's activity time.
    pub async fn touch_conversation_in_conn<C: ConnectionTrait>(
        conn: &C,
        id: &str,
        at: DateTimeWithTimeZone,
    ) -> AppResult<()> {
        Conversation::update_many()
            .col_expr(
                conversation::Column::UpdatedAt,
                Expr::value(at),
            )
            .filter(conversation::Column::Id.eq(id))
            .exec(conn)
            .await
            .map(|_| ())
            .map_err(AppError::db)
    }

    /// Hard-delete a single conversation. Returns whether a row was removed.
    pub async fn delete_conversation_in_conn<C: ConnectionTrait>(
        conn: &C,
        id: &str,
    ) -> AppResult<bool> {
        Conversation::delete_by_id(id)
            .exec(conn)
            .await
            .map(|res| res.rows_affected > 0)
            .map_err(AppError::db)
    }

    /// Hard-delete a single message. Returns whether a row was removed.
    pub async fn delete_message_in_conn<C: ConnectionTrait>(conn: &C, id: &str) -> AppResult<bool> {
        Message::delete_by_id(id)
            .exec(conn)
            .await
            .map(|res| res.rows_affected > 0)
            .map_err(AppError::db)
    }
}

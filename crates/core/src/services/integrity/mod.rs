//! Integrity service.
//!
//! Owns every write that touches a relation on both sides: cascading
//! deletes, follow edges, and inserts that must also be pushed onto their
//! parents' id arrays. Each public operation is one database transaction.

mod plan;

pub use plan::{CascadePlan, CascadeSummary, Root};

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use agora_common::{AppError, AppResult};
use agora_db::{
    entities::{application, comment, connection, conversation, job, message, post},
    id_list,
    refs::{self, DocKind, RefField},
    repositories::{
        ApplicationRepository, CommentRepository, ConnectionRepository, JobRepository,
        MessagingRepository, PostRepository, UserRepository,
    },
};
use sea_orm::{ConnectionTrait, DatabaseConnection, DatabaseTransaction, TransactionTrait};
use tracing::{info, warn};

/// Integrity service for relation-preserving writes.
#[derive(Clone)]
pub struct IntegrityService {
    db: Arc<DatabaseConnection>,
}

impl IntegrityService {
    /// Create a new integrity service.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    async fn begin(&self) -> AppResult<DatabaseTransaction> {
        self.db.begin().await.map_err(AppError::db)
    }

    async fn finish<T>(txn: DatabaseTransaction, result: AppResult<T>) -> AppResult<T> {
        match result {
            Ok(value) => {
                txn.commit().await.map_err(AppError::db)?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = txn.rollback().await {
                    warn!(error = %rollback_err, "Failed to roll back transaction");
                }
                Err(err)
            }
        }
    }

    // === Deletes ===

    /// Delete `root` and everything that depends on it.
    ///
    /// A root that does not exist yields `NotFound` and writes nothing.
    pub async fn delete(&self, root: Root) -> AppResult<CascadeSummary> {
        let txn = self.begin().await?;
        let result = Self::delete_in_conn(&txn, &root).await;
        let summary = Self::finish(txn, result).await?;

        info!(
            root = root.kind(),
            id = root.id(),
            deleted = summary.deleted,
            updated = summary.documents_updated,
            "Cascade delete applied"
        );

        Ok(summary)
    }

    /// Plan and apply a cascade on an existing connection or transaction.
    pub async fn delete_in_conn<C: ConnectionTrait>(
        conn: &C,
        root: &Root,
    ) -> AppResult<CascadeSummary> {
        // Child inserts push onto the parent under its row lock; hold it
        // while planning.
        if let Some(kind) = root.parent_kind() {
            refs::lock_in_conn(conn, kind, &[root.id()]).await?;
        }

        let plan = CascadePlan::build(conn, root)
            .await?
            .ok_or_else(|| not_found(root))?;

        plan.apply(conn).await
    }

    // === Follow edges ===

    /// Make `follower_id` follow `followee_id`. Already following is a no-op.
    pub async fn follow(&self, follower_id: &str, followee_id: &str) -> AppResult<()> {
        reject_self_follow(follower_id, followee_id)?;

        let txn = self.begin().await?;
        let result = Self::follow_in_conn(&txn, follower_id, followee_id).await;
        Self::finish(txn, result).await?;

        info!(follower_id, followee_id, "Followed");
        Ok(())
    }

    /// Remove the follow edge. Not following is a no-op.
    pub async fn unfollow(&self, follower_id: &str, followee_id: &str) -> AppResult<()> {
        reject_self_follow(follower_id, followee_id)?;

        let txn = self.begin().await?;
        let result = Self::unfollow_in_conn(&txn, follower_id, followee_id).await;
        Self::finish(txn, result).await?;

        info!(follower_id, followee_id, "Unfollowed");
        Ok(())
    }

    /// Flip the follow edge. Returns whether `follower_id` now follows.
    pub async fn toggle_follow(&self, follower_id: &str, followee_id: &str) -> AppResult<bool> {
        reject_self_follow(follower_id, followee_id)?;

        let txn = self.begin().await?;
        let result: AppResult<bool> = async {
            lock_users(&txn, follower_id, followee_id).await?;
            let follower = UserRepository::find_by_id_in_conn(&txn, follower_id)
                .await?
                .ok_or_else(|| AppError::UserNotFound(follower_id.to_string()))?;

            if id_list::contains(&follower.following, followee_id) {
                Self::unfollow_in_conn(&txn, follower_id, followee_id).await?;
                Ok(false)
            } else {
                Self::follow_in_conn(&txn, follower_id, followee_id).await?;
                Ok(true)
            }
        }
        .await;
        let following = Self::finish(txn, result).await?;

        info!(follower_id, followee_id, following, "Follow toggled");
        Ok(following)
    }

    async fn follow_in_conn<C: ConnectionTrait>(
        conn: &C,
        follower_id: &str,
        followee_id: &str,
    ) -> AppResult<()> {
        lock_users(conn, follower_id, followee_id).await?;

        refs::push_in_conn(conn, RefField::UserFollowing, follower_id, followee_id).await?;
        refs::push_in_conn(conn, RefField::UserFollowers, followee_id, follower_id).await
    }

    async fn unfollow_in_conn<C: ConnectionTrait>(
        conn: &C,
        follower_id: &str,
        followee_id: &str,
    ) -> AppResult<()> {
        lock_users(conn, follower_id, followee_id).await?;

        refs::pull_in_conn(
            conn,
            DocKind::User,
            follower_id,
            &single_pull(RefField::UserFollowing, followee_id),
        )
        .await?;
        refs::pull_in_conn(
            conn,
            DocKind::User,
            followee_id,
            &single_pull(RefField::UserFollowers, follower_id),
        )
        .await?;
        Ok(())
    }

    // === Reference-creating inserts ===

    /// Insert a post and link it to its creator.
    pub async fn create_post(&self, model: post::ActiveModel) -> AppResult<post::Model> {
        let txn = self.begin().await?;
        let result: AppResult<post::Model> = async {
            let post = PostRepository::create_in_conn(&txn, model).await?;
            refs::push_in_conn(&txn, RefField::UserPosts, &post.creator_id, &post.id).await?;
            Ok(post)
        }
        .await;
        Self::finish(txn, result).await
    }

    /// Insert a comment and link it to its post and creator.
    pub async fn create_comment(&self, model: comment::ActiveModel) -> AppResult<comment::Model> {
        let txn = self.begin().await?;
        let result: AppResult<comment::Model> = async {
            let comment = CommentRepository::create_in_conn(&txn, model).await?;
            refs::push_in_conn(&txn, RefField::PostComments, &comment.post_id, &comment.id)
                .await?;
            refs::push_in_conn(&txn, RefField::UserComments, &comment.creator_id, &comment.id)
                .await?;
            Ok(comment)
        }
        .await;
        Self::finish(txn, result).await
    }

    /// Insert a job and link it to its creator.
    pub async fn create_job(&self, model: job::ActiveModel) -> AppResult<job::Model> {
        let txn = self.begin().await?;
        let result: AppResult<job::Model> = async {
            let job = JobRepository::create_in_conn(&txn, model).await?;
            refs::push_in_conn(&txn, RefField::UserJobs, &job.creator_id, &job.id).await?;
            Ok(job)
        }
        .await;
        Self::finish(txn, result).await
    }

    /// Insert an application and link it to its job and applicant.
    pub async fn create_application(
        &self,
        model: application::ActiveModel,
    ) -> AppResult<application::Model> {
        let txn = self.begin().await?;
        let result: AppResult<application::Model> = async {
            let application = ApplicationRepository::create_in_conn(&txn, model).await?;
            refs::push_in_conn(
                &txn,
                RefField::JobApplicants,
                &application.job_id,
                &application.id,
            )
            .await?;
            refs::push_in_conn(
                &txn,
                RefField::UserApplications,
                &application.applicant_id,
                &application.id,
            )
            .await?;
            Ok(application)
        }
        .await;
        Self::finish(txn, result).await
    }

    /// Insert a connection request and link it to both endpoints.
    pub async fn create_connection(
        &self,
        model: connection::ActiveModel,
    ) -> AppResult<connection::Model> {
        let txn = self.begin().await?;
        let result: AppResult<connection::Model> = async {
            let connection = ConnectionRepository::create_in_conn(&txn, model).await?;
            refs::push_in_conn(
                &txn,
                RefField::UserConnections,
                &connection.sender_id,
                &connection.id,
            )
            .await?;
            refs::push_in_conn(
                &txn,
                RefField::UserConnections,
                &connection.recipient_id,
                &connection.id,
            )
            .await?;
            Ok(connection)
        }
        .await;
        Self::finish(txn, result).await
    }

    /// Accept a pending connection: mark it accepted and make both users
    /// follow each other. Only the recipient may accept.
    ///
    /// The status check runs under the connection's row lock.
    pub async fn accept_connection(
        &self,
        actor_id: &str,
        id: &str,
    ) -> AppResult<connection::Model> {
        let txn = self.begin().await?;
        let result: AppResult<connection::Model> = async {
            let connection = pending_for_recipient_in_conn(&txn, actor_id, id).await?;
            let (sender_id, recipient_id) =
                (connection.sender_id.clone(), connection.recipient_id.clone());
            let accepted = ConnectionRepository::set_status_in_conn(
                &txn,
                connection,
                connection::ConnectionStatus::Accepted,
            )
            .await?;
            Self::follow_in_conn(&txn, &sender_id, &recipient_id).await?;
            Self::follow_in_conn(&txn, &recipient_id, &sender_id).await?;
            Ok(accepted)
        }
        .await;
        let accepted = Self::finish(txn, result).await?;

        info!(
            connection_id = %accepted.id,
            sender_id = %accepted.sender_id,
            recipient_id = %accepted.recipient_id,
            "Connection accepted"
        );
        Ok(accepted)
    }

    /// Reject a pending connection. Only the recipient may reject.
    pub async fn reject_connection(
        &self,
        actor_id: &str,
        id: &str,
    ) -> AppResult<connection::Model> {
        let txn = self.begin().await?;
        let result: AppResult<connection::Model> = async {
            let connection = pending_for_recipient_in_conn(&txn, actor_id, id).await?;
            ConnectionRepository::set_status_in_conn(
                &txn,
                connection,
                connection::ConnectionStatus::Rejected,
            )
            .await
        }
        .await;
        let rejected = Self::finish(txn, result).await?;

        info!(connection_id = %rejected.id, "Connection rejected");
        Ok(rejected)
    }

    /// Insert a conversation and link it to every participant.
    pub async fn create_conversation(
        &self,
        model: conversation::ActiveModel,
    ) -> AppResult<conversation::Model> {
        let txn = self.begin().await?;
        let result: AppResult<conversation::Model> = async {
            let conversation = MessagingRepository::create_conversation_in_conn(&txn, model).await?;
            for participant in id_list::ids(&conversation.participants) {
                refs::push_in_conn(
                    &txn,
                    RefField::UserConversations,
                    &participant,
                    &conversation.id,
                )
                .await?;
            }
            Ok(conversation)
        }
        .await;
        Self::finish(txn, result).await
    }

    /// Insert a message and link it to its conversation.
    pub async fn create_message(&self, model: message::ActiveModel) -> AppResult<message::Model> {
        let txn = self.begin().await?;
        let result: AppResult<message::Model> = async {
            let message = MessagingRepository::create_message_in_conn(&txn, model).await?;
            refs::push_in_conn(
                &txn,
                RefField::ConversationMessages,
                &message.conversation_id,
                &message.id,
            )
            .await?;
            MessagingRepository::touch_conversation_in_conn(
                &txn,
                &message.conversation_id,
                message.created_at,
            )
            .await?;
            Ok(message)
        }
        .await;
        Self::finish(txn, result).await
    }
}

fn not_found(root: &Root) -> AppError {
    match root {
        Root::User(id) => AppError::UserNotFound(id.clone()),
        Root::Post(id) => AppError::PostNotFound(id.clone()),
        other => AppError::NotFound(format!("{} {}", other.kind(), other.id())),
    }
}

fn reject_self_follow(follower_id: &str, followee_id: &str) -> AppResult<()> {
    if follower_id == followee_id {
        return Err(AppError::BadRequest("Cannot follow yourself".to_string()));
    }
    Ok(())
}

/// Lock both ends of a follow edge. A missing followee is reported first.
async fn lock_users<C: ConnectionTrait>(
    conn: &C,
    follower_id: &str,
    followee_id: &str,
) -> AppResult<()> {
    let found = refs::lock_in_conn(conn, DocKind::User, &[follower_id, followee_id]).await?;
    for id in [followee_id, follower_id] {
        if !found.contains(id) {
            return Err(AppError::UserNotFound(id.to_string()));
        }
    }
    Ok(())
}

async fn pending_for_recipient_in_conn<C: ConnectionTrait>(
    conn: &C,
    actor_id: &str,
    id: &str,
) -> AppResult<connection::Model> {
    let connection = ConnectionRepository::lock_by_id_in_conn(conn, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Connection {id}")))?;

    if connection.recipient_id != actor_id {
        return Err(AppError::Forbidden(
            "Only the recipient can answer this request".to_string(),
        ));
    }
    if connection.status != connection::ConnectionStatus::Pending {
        return Err(AppError::Conflict("Connection is not pending".to_string()));
    }
    Ok(connection)
}

fn single_pull(field: RefField, id: &str) -> BTreeMap<RefField, BTreeSet<String>> {
    BTreeMap::from([(field, BTreeSet::from([id.to_string()]))])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_self_follow_rejected() {
        assert!(matches!(
            reject_self_follow("a", "a"),
            Err(AppError::BadRequest(_))
        ));
        assert!(reject_self_follow("a", "b").is_ok());
    }

    #[test]
    fn test_not_found_uses_entity_variant() {
        assert!(matches!(
            not_found(&Root::User("u".into())),
            AppError::UserNotFound(_)
        ));
        assert!(matches!(
            not_found(&Root::Comment("c".into())),
            AppError::NotFound(msg) if msg == "Comment c"
        ));
    }
}

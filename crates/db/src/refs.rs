//! Push/pull primitives for id-array relation columns.
//!
//! Every function takes a generic connection so callers can run it on a
//! pooled connection or inside a transaction. A write rewrites only the
//! columns it touches, so two writers on different columns of the same row
//! do not clobber each other. The owner row is read `FOR UPDATE`, so two
//! writers on the same column serialize instead of losing an id. SQLite has
//! no row locks and ignores the clause; its writers are serialized by the
//! database lock.

use std::collections::{BTreeMap, BTreeSet};

use agora_common::{AppError, AppResult};
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QuerySelect, prelude::Json,
    sea_query::Expr,
};
use serde::{Deserialize, Serialize};

use crate::entities::{Conversation, Job, Post, User, conversation, job, post, user};
use crate::id_list;

/// Kind of document that owns id-array columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DocKind {
    User,
    Post,
    Job,
    Conversation,
}

/// An id-array column, named by owner and field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RefField {
    UserFollowers,
    UserFollowing,
    UserPosts,
    UserComments,
    UserJobs,
    UserApplications,
    UserConnections,
    UserConversations,
    PostComments,
    JobApplicants,
    ConversationParticipants,
    ConversationMessages,
}

impl RefField {
    /// The document kind holding this column.
    #[must_use]
    pub const fn owner(self) -> DocKind {
        match self {
            Self::UserFollowers
            | Self::UserFollowing
            | Self::UserPosts
            | Self::UserComments
            | Self::UserJobs
            | Self::UserApplications
            | Self::UserConnections
            | Self::UserConversations => DocKind::User,
            Self::PostComments => DocKind::Post,
            Self::JobApplicants => DocKind::Job,
            Self::ConversationParticipants | Self::ConversationMessages => DocKind::Conversation,
        }
    }
}

/// Read one id-array column off a user.
#[must_use]
pub fn user_refs(model: &user::Model, field: RefField) -> Vec<String> {
    user_column(model, field).map_or_else(Vec::new, |(_, value)| id_list::ids(value))
}

fn user_column(model: &user::Model, field: RefField) -> Option<(user::Column, &Json)> {
    match field {
        RefField::UserFollowers => Some((user::Column::Followers, &model.followers)),
        RefField::UserFollowing => Some((user::Column::Following, &model.following)),
        RefField::UserPosts => Some((user::Column::Posts, &model.posts)),
        RefField::UserComments => Some((user::Column::Comments, &model.comments)),
        RefField::UserJobs => Some((user::Column::Jobs, &model.jobs)),
        RefField::UserApplications => Some((user::Column::Applications, &model.applications)),
        RefField::UserConnections => Some((user::Column::Connections, &model.connections)),
        RefField::UserConversations => Some((user::Column::Conversations, &model.conversations)),
        _ => None,
    }
}

fn conversation_column(
    model: &conversation::Model,
    field: RefField,
) -> Option<(conversation::Column, &Json)> {
    match field {
        RefField::ConversationParticipants => {
            Some((conversation::Column::Participants, &model.participants))
        }
        RefField::ConversationMessages => Some((conversation::Column::Messages, &model.messages)),
        _ => None,
    }
}

fn mismatch(kind: DocKind, field: RefField) -> AppError {
    AppError::Internal(format!("{field:?} is not a column of {kind:?}"))
}

/// Rewrite the listed columns of one document.
///
/// `edit` receives each column's current value and returns the new one.
/// Returns `false` when the document does not exist.
async fn rewrite_in_conn<C, F>(
    conn: &C,
    kind: DocKind,
    owner_id: &str,
    fields: &[RefField],
    edit: F,
) -> AppResult<bool>
where
    C: ConnectionTrait,
    F: Fn(RefField, &Json) -> Json,
{
    if let Some(field) = fields.iter().find(|f| f.owner() != kind) {
        return Err(mismatch(kind, *field));
    }

    match kind {
        DocKind::User => {
            let Some(model) = User::find_by_id(owner_id)
                .lock_exclusive()
                .one(conn)
                .await
                .map_err(AppError::db)?
            else {
                return Ok(false);
            };
            let mut update = User::update_many().filter(user::Column::Id.eq(owner_id));
            for field in fields {
                let (column, current) =
                    user_column(&model, *field).ok_or_else(|| mismatch(kind, *field))?;
                update = update.col_expr(column, Expr::value(edit(*field, current)));
            }
            update.exec(conn).await.map_err(AppError::db)?;
        }
        DocKind::Post => {
            let Some(model) = Post::find_by_id(owner_id)
                .lock_exclusive()
                .one(conn)
                .await
                .map_err(AppError::db)?
            else {
                return Ok(false);
            };
            Post::update_many()
                .col_expr(
                    post::Column::Comments,
                    Expr::value(edit(RefField::PostComments, &model.comments)),
                )
                .filter(post::Column::Id.eq(owner_id))
                .exec(conn)
                .await
                .map_err(AppError::db)?;
        }
        DocKind::Job => {
            let Some(model) = Job::find_by_id(owner_id)
                .lock_exclusive()
                .one(conn)
                .await
                .map_err(AppError::db)?
            else {
                return Ok(false);
            };
            Job::update_many()
                .col_expr(
                    job::Column::Applicants,
                    Expr::value(edit(RefField::JobApplicants, &model.applicants)),
                )
                .filter(job::Column::Id.eq(owner_id))
                .exec(conn)
                .await
                .map_err(AppError::db)?;
        }
        DocKind::Conversation => {
            let Some(model) = Conversation::find_by_id(owner_id)
                .lock_exclusive()
                .one(conn)
                .await
                .map_err(AppError::db)?
            else {
                return Ok(false);
            };
            let mut update =
                Conversation::update_many().filter(conversation::Column::Id.eq(owner_id));
            for field in fields {
                let (column, current) =
                    conversation_column(&model, *field).ok_or_else(|| mismatch(kind, *field))?;
                update = update.col_expr(column, Expr::value(edit(*field, current)));
            }
            update.exec(conn).await.map_err(AppError::db)?;
        }
    }

    Ok(true)
}

/// Take the row lock on each listed document, in id order.
///
/// Returns the ids that exist. Locking in a fixed order keeps two
/// transactions that touch the same pair of rows from deadlocking.
pub async fn lock_in_conn<C: ConnectionTrait>(
    conn: &C,
    kind: DocKind,
    ids: &[&str],
) -> AppResult<BTreeSet<String>> {
    let ordered: BTreeSet<&str> = ids.iter().copied().collect();
    let mut found = BTreeSet::new();

    for id in ordered {
        let exists = match kind {
            DocKind::User => User::find_by_id(id)
                .lock_exclusive()
                .one(conn)
                .await
                .map_err(AppError::db)?
                .is_some(),
            DocKind::Post => Post::find_by_id(id)
                .lock_exclusive()
                .one(conn)
                .await
                .map_err(AppError::db)?
                .is_some(),
            DocKind::Job => Job::find_by_id(id)
                .lock_exclusive()
                .one(conn)
                .await
                .map_err(AppError::db)?
                .is_some(),
            DocKind::Conversation => Conversation::find_by_id(id)
                .lock_exclusive()
                .one(conn)
                .await
                .map_err(AppError::db)?
                .is_some(),
        };
        if exists {
            found.insert(id.to_string());
        }
    }

    Ok(found)
}

/// Append `id` to one column of the owner document.
///
/// Fails with `NotFound` if the owner does not exist, so a child is never
/// linked to a missing parent.
pub async fn push_in_conn<C: ConnectionTrait>(
    conn: &C,
    field: RefField,
    owner_id: &str,
    id: &str,
) -> AppResult<()> {
    let found = rewrite_in_conn(conn, field.owner(), owner_id, &[field], |_, current| {
        id_list::push(current, id)
    })
    .await?;

    if found {
        Ok(())
    } else {
        Err(AppError::NotFound(format!(
            "{:?} {owner_id}",
            field.owner()
        )))
    }
}

/// Remove ids from several columns of one document in a single write.
///
/// A missing owner is not an error: the document may be part of the same
/// cascade and already gone.
pub async fn pull_in_conn<C: ConnectionTrait>(
    conn: &C,
    kind: DocKind,
    owner_id: &str,
    pulls: &BTreeMap<RefField, BTreeSet<String>>,
) -> AppResult<bool> {
    if pulls.is_empty() {
        return Ok(true);
    }
    let fields: Vec<RefField> = pulls.keys().copied().collect();
    rewrite_in_conn(conn, kind, owner_id, &fields, |field, current| {
        pulls
            .get(&field)
            .map_or_else(|| current.clone(), |remove| id_list::pull(current, remove))
    })
    .await
}

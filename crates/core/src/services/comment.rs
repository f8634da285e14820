//! Comment service.

use agora_common::{AppError, AppResult, IdGenerator};
use agora_db::{
    entities::{comment, user},
    repositories::{CommentRepository, PostRepository},
};
use chrono::Utc;
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

use crate::services::integrity::{CascadeSummary, IntegrityService, Root};

/// A comment with its creator populated.
pub type CommentWithCreator = (comment::Model, Option<user::Model>);

/// Comment service for business logic.
#[derive(Clone)]
pub struct CommentService {
    comment_repo: CommentRepository,
    post_repo: PostRepository,
    integrity: IntegrityService,
    id_gen: IdGenerator,
}

/// Input for writing or editing a comment.
#[derive(Debug, Deserialize, Validate)]
pub struct CommentInput {
    #[validate(length(min = 1, max = 1000))]
    pub text: String,
}

impl CommentService {
    /// Create a new comment service.
    #[must_use]
    pub const fn new(
        comment_repo: CommentRepository,
        post_repo: PostRepository,
        integrity: IntegrityService,
    ) -> Self {
        Self {
            comment_repo,
            post_repo,
            integrity,
            id_gen: IdGenerator::new(),
        }
    }

    /// Comment on a post.
    pub async fn create(
        &self,
        creator_id: &str,
        post_id: &str,
        input: CommentInput,
    ) -> AppResult<comment::Model> {
        input.validate()?;
        let post = self.post_repo.get_by_id(post_id).await?;

        let model = comment::ActiveModel {
            id: Set(self.id_gen.generate()),
            post_id: Set(post.id),
            creator_id: Set(creator_id.to_string()),
            text: Set(input.text),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        self.integrity.create_comment(model).await
    }

    /// Comments on a post, oldest first.
    pub async fn for_post(
        &self,
        post_id: &str,
        limit: u64,
        since_id: Option<&str>,
    ) -> AppResult<Vec<CommentWithCreator>> {
        self.post_repo.get_by_id(post_id).await?;
        self.comment_repo
            .find_by_post_with_creator(post_id, limit, since_id)
            .await
    }

    /// Edit a comment. Only the creator may edit.
    pub async fn update(
        &self,
        actor_id: &str,
        id: &str,
        input: CommentInput,
    ) -> AppResult<comment::Model> {
        input.validate()?;

        let comment = self.get(id).await?;
        if comment.creator_id != actor_id {
            return Err(AppError::Forbidden(
                "Only the author can edit this comment".to_string(),
            ));
        }

        let mut active: comment::ActiveModel = comment.into();
        active.text = Set(input.text);
        active.updated_at = Set(Some(Utc::now().into()));

        self.comment_repo.update(active).await
    }

    /// Delete a comment. The comment's author or the post's author may delete.
    pub async fn delete(&self, actor_id: &str, id: &str) -> AppResult<CascadeSummary> {
        let comment = self.get(id).await?;

        if comment.creator_id != actor_id {
            let post_owner = self
                .post_repo
                .find_by_id(&comment.post_id)
                .await?
                .map(|p| p.creator_id);
            if post_owner.as_deref() != Some(actor_id) {
                return Err(AppError::Forbidden(
                    "Not allowed to delete this comment".to_string(),
                ));
            }
        }

        self.integrity.delete(Root::Comment(comment.id)).await
    }

    async fn get(&self, id: &str) -> AppResult<comment::Model> {
        self.comment_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Comment {id}")))
    }
}

//! Post service.

use agora_common::{AppError, AppResult, IdGenerator};
use agora_db::{
    entities::{post, user},
    id_list,
    repositories::PostRepository,
};
use chrono::Utc;
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

use crate::services::integrity::{CascadeSummary, IntegrityService, Root};
use crate::services::user::{non_empty, url_or_blank};

/// Maximum post length in characters.
pub const MAX_POST_TEXT_LENGTH: u64 = 3000;

/// A post with its creator populated.
pub type PostWithCreator = (post::Model, Option<user::Model>);

/// Post service for business logic.
#[derive(Clone)]
pub struct PostService {
    post_repo: PostRepository,
    integrity: IntegrityService,
    id_gen: IdGenerator,
}

/// Input for creating a post.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostInput {
    #[validate(length(min = 1, max = 3000))]
    pub text: String,

    #[validate(custom(function = "url_or_blank"))]
    pub image_url: Option<String>,
}

/// Input for editing a post.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostInput {
    #[validate(length(min = 1, max = 3000))]
    pub text: Option<String>,

    /// A blank value removes the image.
    #[validate(custom(function = "url_or_blank"))]
    pub image_url: Option<String>,
}

impl PostService {
    /// Create a new post service.
    #[must_use]
    pub const fn new(post_repo: PostRepository, integrity: IntegrityService) -> Self {
        Self {
            post_repo,
            integrity,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a post.
    pub async fn create(&self, creator_id: &str, input: CreatePostInput) -> AppResult<post::Model> {
        input.validate()?;

        let model = post::ActiveModel {
            id: Set(self.id_gen.generate()),
            creator_id: Set(creator_id.to_string()),
            text: Set(input.text),
            image_url: Set(input.image_url.and_then(non_empty)),
            comments: Set(id_list::empty()),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        let post = self.integrity.create_post(model).await?;
        tracing::debug!(post_id = %post.id, creator_id, "Post created");
        Ok(post)
    }

    /// Get a post with its creator.
    pub async fn get(&self, id: &str) -> AppResult<PostWithCreator> {
        self.post_repo
            .find_with_creator(id)
            .await?
            .ok_or_else(|| AppError::PostNotFound(id.to_string()))
    }

    /// Global feed, newest first.
    pub async fn feed(&self, limit: u64, until_id: Option<&str>) -> AppResult<Vec<PostWithCreator>> {
        self.post_repo.list_with_creator(limit, until_id).await
    }

    /// Posts by one user, newest first.
    pub async fn by_user(
        &self,
        user_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<post::Model>> {
        self.post_repo.find_by_creator(user_id, limit, until_id).await
    }

    /// Edit a post. Only the creator may edit.
    pub async fn update(
        &self,
        actor_id: &str,
        id: &str,
        input: UpdatePostInput,
    ) -> AppResult<post::Model> {
        input.validate()?;

        let post = self.post_repo.get_by_id(id).await?;
        if post.creator_id != actor_id {
            return Err(AppError::Forbidden(
                "Only the author can edit this post".to_string(),
            ));
        }

        let mut active: post::ActiveModel = post.into();
        if let Some(text) = input.text {
            active.text = Set(text);
        }
        if let Some(image_url) = input.image_url {
            active.image_url = Set(non_empty(image_url));
        }
        active.updated_at = Set(Some(Utc::now().into()));

        self.post_repo.update(active).await
    }

    /// Delete a post and its comments. Only the creator may delete.
    pub async fn delete(&self, actor_id: &str, id: &str) -> AppResult<CascadeSummary> {
        let post = self.post_repo.get_by_id(id).await?;
        if post.creator_id != actor_id {
            return Err(AppError::Forbidden(
                "Only the author can delete this post".to_string(),
            ));
        }

        self.integrity.delete(Root::Post(post.id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_post_is_invalid() {
        let input = CreatePostInput {
            text: String::new(),
            image_url: None,
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_blank_image_url_passes_validation() {
        let input = UpdatePostInput {
            image_url: Some(String::new()),
            ..Default::default()
        };
        assert!(input.validate().is_ok());

        let input = UpdatePostInput {
            image_url: Some("not a url".to_string()),
            ..Default::default()
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_max_length_constant_matches_validation() {
        let input = CreatePostInput {
            text: "x".repeat(MAX_POST_TEXT_LENGTH as usize + 1),
            image_url: None,
        };
        assert!(input.validate().is_err());
    }
}

//! User service.

use agora_common::AppResult;
use agora_db::{entities::user, repositories::UserRepository};
use chrono::Utc;
use sea_orm::Set;
use serde::Deserialize;
use validator::{Validate, ValidateUrl, ValidationError};

use crate::services::integrity::{CascadeSummary, IntegrityService, Root};

/// User service for business logic.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    integrity: IntegrityService,
}

/// Input for updating a profile. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserInput {
    #[validate(length(min = 1, max = 128))]
    pub name: Option<String>,

    #[validate(length(max = 256))]
    pub headline: Option<String>,

    #[validate(length(max = 2048))]
    pub bio: Option<String>,

    /// A blank value clears the avatar.
    #[validate(custom(function = "url_or_blank"))]
    pub avatar_url: Option<String>,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub const fn new(user_repo: UserRepository, integrity: IntegrityService) -> Self {
        Self {
            user_repo,
            integrity,
        }
    }

    /// Get a user by ID.
    pub async fn get(&self, id: &str) -> AppResult<user::Model> {
        self.user_repo.get_by_id(id).await
    }

    /// List users, newest first.
    pub async fn list(&self, limit: u64, until_id: Option<&str>) -> AppResult<Vec<user::Model>> {
        self.user_repo.list(limit, until_id).await
    }

    /// Update profile fields.
    pub async fn update(&self, id: &str, input: UpdateUserInput) -> AppResult<user::Model> {
        input.validate()?;

        let user = self.user_repo.get_by_id(id).await?;
        let mut active: user::ActiveModel = user.into();

        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(headline) = input.headline {
            active.headline = Set(non_empty(headline));
        }
        if let Some(bio) = input.bio {
            active.bio = Set(non_empty(bio));
        }
        if let Some(avatar_url) = input.avatar_url {
            active.avatar_url = Set(non_empty(avatar_url));
        }
        active.updated_at = Set(Some(Utc::now().into()));

        self.user_repo.update(active).await
    }

    /// Delete an account and everything it owns.
    pub async fn delete(&self, id: &str) -> AppResult<CascadeSummary> {
        self.integrity.delete(Root::User(id.to_string())).await
    }
}

/// Accept a URL, or a blank string that clears the stored one.
pub(crate) fn url_or_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() || value.validate_url() {
        Ok(())
    } else {
        Err(ValidationError::new("url"))
    }
}

pub(crate) fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_fields_clear_the_value() {
        assert_eq!(non_empty("  ".to_string()), None);
        assert_eq!(non_empty("Engineer".to_string()), Some("Engineer".to_string()));
    }

    #[test]
    fn test_update_input_rejects_bad_avatar_url() {
        let input = UpdateUserInput {
            avatar_url: Some("not a url".to_string()),
            ..Default::default()
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_update_input_accepts_blank_avatar_url() {
        for blank in ["", "  "] {
            let input = UpdateUserInput {
                avatar_url: Some(blank.to_string()),
                ..Default::default()
            };
            assert!(input.validate().is_ok(), "{blank:?}");
        }

        let input = UpdateUserInput {
            avatar_url: Some("https://cdn.example.com/a.png".to_string()),
            ..Default::default()
        };
        assert!(input.validate().is_ok());
    }
}

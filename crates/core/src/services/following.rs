//! Following service.

use agora_common::AppResult;
use agora_db::{entities::user, id_list, repositories::UserRepository};

use crate::services::integrity::IntegrityService;

/// Following service for business logic.
#[derive(Clone)]
pub struct FollowingService {
    user_repo: UserRepository,
    integrity: IntegrityService,
}

impl FollowingService {
    /// Create a new following service.
    #[must_use]
    pub const fn new(user_repo: UserRepository, integrity: IntegrityService) -> Self {
        Self {
            user_repo,
            integrity,
        }
    }

    /// Follow a user.
    pub async fn follow(&self, follower_id: &str, followee_id: &str) -> AppResult<()> {
        self.integrity.follow(follower_id, followee_id).await
    }

    /// Unfollow a user.
    pub async fn unfollow(&self, follower_id: &str, followee_id: &str) -> AppResult<()> {
        self.integrity.unfollow(follower_id, followee_id).await
    }

    /// Follow if not following, unfollow otherwise. Returns the new state.
    pub async fn toggle(&self, follower_id: &str, followee_id: &str) -> AppResult<bool> {
        self.integrity.toggle_follow(follower_id, followee_id).await
    }

    /// Check if `follower_id` follows `followee_id`.
    pub async fn is_following(&self, follower_id: &str, followee_id: &str) -> AppResult<bool> {
        let follower = self.user_repo.get_by_id(follower_id).await?;
        Ok(id_list::contains(&follower.following, followee_id))
    }

    /// Users following `user_id`, in follow order.
    pub async fn followers(&self, user_id: &str) -> AppResult<Vec<user::Model>> {
        let user = self.user_repo.get_by_id(user_id).await?;
        self.populate(id_list::ids(&user.followers)).await
    }

    /// Users `user_id` follows, in follow order.
    pub async fn following(&self, user_id: &str) -> AppResult<Vec<user::Model>> {
        let user = self.user_repo.get_by_id(user_id).await?;
        self.populate(id_list::ids(&user.following)).await
    }

    async fn populate(&self, ids: Vec<String>) -> AppResult<Vec<user::Model>> {
        let mut users = self.user_repo.find_by_ids(&ids).await?;
        users.sort_by_key(|u| ids.iter().position(|id| *id == u.id));
        Ok(users)
    }
}

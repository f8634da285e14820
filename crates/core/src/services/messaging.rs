//! Messaging service.

use std::collections::BTreeSet;

use agora_common::{AppError, AppResult, IdGenerator};
use agora_db::{
    entities::{conversation, message},
    id_list,
    repositories::{MessagingRepository, UserRepository},
};
use chrono::Utc;
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

use crate::services::integrity::{CascadeSummary, IntegrityService, Root};

/// Maximum participants in one conversation, including the creator.
pub const MAX_PARTICIPANTS: usize = 32;

/// Messaging service for business logic.
#[derive(Clone)]
pub struct MessagingService {
    messaging_repo: MessagingRepository,
    user_repo: UserRepository,
    integrity: IntegrityService,
    id_gen: IdGenerator,
}

/// Input for sending a message.
#[derive(Debug, Deserialize, Validate)]
pub struct SendMessageInput {
    #[validate(length(min = 1, max = 3000))]
    pub text: String,
}

impl MessagingService {
    /// Create a new messaging service.
    #[must_use]
    pub const fn new(
        messaging_repo: MessagingRepository,
        user_repo: UserRepository,
        integrity: IntegrityService,
    ) -> Self {
        Self {
            messaging_repo,
            user_repo,
            integrity,
            id_gen: IdGenerator::new(),
        }
    }

    /// Open a conversation between the creator and `participant_ids`.
    ///
    /// An existing conversation with exactly the same participants is
    /// returned instead of creating a duplicate.
    pub async fn open(
        &self,
        creator_id: &str,
        participant_ids: &[String],
    ) -> AppResult<conversation::Model> {
        let mut participants: BTreeSet<String> = participant_ids.iter().cloned().collect();
        participants.insert(creator_id.to_string());

        if participants.len() < 2 {
            return Err(AppError::BadRequest(
                "A conversation needs at least one other participant".to_string(),
            ));
        }
        if participants.len() > MAX_PARTICIPANTS {
            return Err(AppError::BadRequest(format!(
                "A conversation can have at most {MAX_PARTICIPANTS} participants"
            )));
        }

        let ids: Vec<String> = participants.iter().cloned().collect();
        let found = self.user_repo.find_by_ids(&ids).await?;
        if let Some(missing) = ids.iter().find(|id| !found.iter().any(|u| &u.id == *id)) {
            return Err(AppError::UserNotFound(missing.clone()));
        }

        for existing in self.list(creator_id).await? {
            let members: BTreeSet<String> =
                id_list::ids(&existing.participants).into_iter().collect();
            if members == participants {
                return Ok(existing);
            }
        }

        let model = conversation::ActiveModel {
            id: Set(self.id_gen.generate()),
            participants: Set(id_list::to_json(&ids)),
            messages: Set(id_list::empty()),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        self.integrity.create_conversation(model).await
    }

    /// Conversations the user takes part in, most recently active first.
    pub async fn list(&self, user_id: &str) -> AppResult<Vec<conversation::Model>> {
        let user = self.user_repo.get_by_id(user_id).await?;
        self.messaging_repo
            .find_conversations_by_ids(&id_list::ids(&user.conversations))
            .await
    }

    /// Get a conversation. Only participants may read it.
    pub async fn get(&self, actor_id: &str, id: &str) -> AppResult<conversation::Model> {
        let conversation = self
            .messaging_repo
            .find_conversation(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Conversation {id}")))?;

        if !id_list::contains(&conversation.participants, actor_id) {
            return Err(AppError::Forbidden(
                "Not a participant in this conversation".to_string(),
            ));
        }
        Ok(conversation)
    }

    /// Delete a conversation and its messages. Any participant may delete.
    pub async fn delete(&self, actor_id: &str, id: &str) -> AppResult<CascadeSummary> {
        let conversation = self.get(actor_id, id).await?;
        self.integrity
            .delete(Root::Conversation(conversation.id))
            .await
    }

    /// Messages in a conversation, newest first.
    pub async fn messages(
        &self,
        actor_id: &str,
        conversation_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<message::Model>> {
        let conversation = self.get(actor_id, conversation_id).await?;
        self.messaging_repo
            .find_messages(&conversation.id, limit, until_id)
            .await
    }

    /// Send a message to a conversation.
    pub async fn send(
        &self,
        sender_id: &str,
        conversation_id: &str,
        input: SendMessageInput,
    ) -> AppResult<message::Model> {
        input.validate()?;
        let conversation = self.get(sender_id, conversation_id).await?;

        let model = message::ActiveModel {
            id: Set(self.id_gen.generate()),
            conversation_id: Set(conversation.id),
            sender_id: Set(sender_id.to_string()),
            text: Set(input.text),
            created_at: Set(Utc::now().into()),
        };

        self.integrity.create_message(model).await
    }

    /// Delete a message. Only the sender may delete.
    pub async fn delete_message(&self, actor_id: &str, id: &str) -> AppResult<CascadeSummary> {
        let message = self
            .messaging_repo
            .find_message(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Message {id}")))?;

        if message.sender_id != actor_id {
            return Err(AppError::Forbidden(
                "Only the sender can delete this message".to_string(),
            ));
        }

        self.integrity.delete(Root::Message(message.id)).await
    }
}

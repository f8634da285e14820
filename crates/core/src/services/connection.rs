//! Connection service.

use agora_common::{AppError, AppResult, IdGenerator};
use agora_db::{
    entities::connection::{self, ConnectionStatus},
    repositories::{ConnectionRepository, UserRepository},
};
use chrono::Utc;
use sea_orm::Set;

use crate::services::integrity::{CascadeSummary, IntegrityService, Root};

/// Connection service for business logic.
#[derive(Clone)]
pub struct ConnectionService {
    connection_repo: ConnectionRepository,
    user_repo: UserRepository,
    integrity: IntegrityService,
    id_gen: IdGenerator,
}

impl ConnectionService {
    /// Create a new connection service.
    #[must_use]
    pub const fn new(
        connection_repo: ConnectionRepository,
        user_repo: UserRepository,
        integrity: IntegrityService,
    ) -> Self {
        Self {
            connection_repo,
            user_repo,
            integrity,
            id_gen: IdGenerator::new(),
        }
    }

    /// Send a connection request.
    ///
    /// A previously rejected request between the same two users is replaced.
    pub async fn request(
        &self,
        sender_id: &str,
        recipient_id: &str,
    ) -> AppResult<connection::Model> {
        if sender_id == recipient_id {
            return Err(AppError::BadRequest(
                "Cannot connect with yourself".to_string(),
            ));
        }
        self.user_repo.get_by_id(recipient_id).await?;

        if let Some(existing) = self
            .connection_repo
            .find_between(sender_id, recipient_id)
            .await?
        {
            if existing.status != ConnectionStatus::Rejected {
                return Err(AppError::Conflict("Connection already exists".to_string()));
            }
            self.integrity.delete(Root::Connection(existing.id)).await?;
        }

        let model = connection::ActiveModel {
            id: Set(self.id_gen.generate()),
            sender_id: Set(sender_id.to_string()),
            recipient_id: Set(recipient_id.to_string()),
            status: Set(ConnectionStatus::Pending),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        let connection = self.integrity.create_connection(model).await?;
        tracing::debug!(connection_id = %connection.id, sender_id, recipient_id, "Connection requested");
        Ok(connection)
    }

    /// Accept a pending request. Only the recipient may accept.
    pub async fn accept(&self, actor_id: &str, id: &str) -> AppResult<connection::Model> {
        self.integrity.accept_connection(actor_id, id).await
    }

    /// Reject a pending request. Only the recipient may reject.
    pub async fn reject(&self, actor_id: &str, id: &str) -> AppResult<connection::Model> {
        self.integrity.reject_connection(actor_id, id).await
    }

    /// Remove a connection. Either endpoint may remove it.
    pub async fn delete(&self, actor_id: &str, id: &str) -> AppResult<CascadeSummary> {
        let connection = self.get(id).await?;
        if !connection.involves(actor_id) {
            return Err(AppError::Forbidden(
                "Not a party to this connection".to_string(),
            ));
        }

        self.integrity.delete(Root::Connection(connection.id)).await
    }

    /// Connections the user is part of.
    pub async fn list(
        &self,
        user_id: &str,
        status: Option<ConnectionStatus>,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<connection::Model>> {
        self.connection_repo
            .find_for_user(user_id, status, limit, until_id)
            .await
    }

    async fn get(&self, id: &str) -> AppResult<connection::Model> {
        self.connection_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Connection {id}")))
    }
}

//! Verification notifier.
//!
//! Signup and resend hand the fresh verification token to a notifier. The
//! transport lives outside this crate; the default implementation only logs.

use agora_common::AppResult;
use agora_db::entities::user;
use async_trait::async_trait;
use std::sync::Arc;

/// Delivers e-mail verification tokens to users.
#[async_trait]
pub trait VerificationNotifier: Send + Sync {
    /// Deliver `token` to `user`.
    async fn send_verification(&self, user: &user::Model, token: &str) -> AppResult<()>;
}

/// Notifier that writes the token to the log instead of sending it.
#[derive(Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl VerificationNotifier for LogNotifier {
    async fn send_verification(&self, user: &user::Model, token: &str) -> AppResult<()> {
        tracing::info!(
            user_id = %user.id,
            email = %user.email,
            token,
            "Verification token issued"
        );
        Ok(())
    }
}

/// Wrapper for a shared notifier trait object.
pub type NotifierService = Arc<dyn VerificationNotifier>;

//! Authentication service.

use agora_common::{AppError, AppResult, IdGenerator, config::AuthConfig};
use agora_db::{entities::user, id_list, repositories::UserRepository};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::services::notifier::NotifierService;
use crate::services::session::SessionService;

/// Authentication service: signup, e-mail verification, login.
#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    sessions: SessionService,
    notifier: NotifierService,
    id_gen: IdGenerator,
    verification_ttl: Duration,
}

/// Input for creating an account.
#[derive(Debug, Deserialize, Validate)]
pub struct SignupInput {
    #[validate(length(min = 1, max = 128))]
    pub name: String,

    #[validate(email)]
    pub email: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

/// Input for logging in.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginInput {
    #[validate(email)]
    pub email: String,

    #[validate(length(min = 1))]
    pub password: String,
}

/// A freshly issued session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginOutput {
    pub token: String,
    pub expires_in: i64,
    pub user: user::Model,
}

impl AuthService {
    /// Create a new authentication service.
    #[must_use]
    pub fn new(
        user_repo: UserRepository,
        sessions: SessionService,
        notifier: NotifierService,
        config: &AuthConfig,
    ) -> Self {
        Self {
            user_repo,
            sessions,
            notifier,
            id_gen: IdGenerator::new(),
            verification_ttl: Duration::seconds(config.verification_ttl_secs),
        }
    }

    /// Create an unverified account and send its verification token.
    ///
    /// The account is kept when delivery fails; the user can ask for a new
    /// token through [`Self::resend_verification`].
    pub async fn signup(&self, input: SignupInput) -> AppResult<user::Model> {
        input.validate()?;

        let email = input.email.trim().to_lowercase();
        if self.user_repo.find_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict(
                "an account with this email already exists".to_string(),
            ));
        }

        let password_hash = hash_password(&input.password)?;
        let token = self.id_gen.generate_token();
        let now = Utc::now();

        let model = user::ActiveModel {
            id: Set(self.id_gen.generate()),
            name: Set(input.name),
            email: Set(email),
            password_hash: Set(password_hash),
            headline: Set(None),
            bio: Set(None),
            avatar_url: Set(None),
            verification_token: Set(Some(token.clone())),
            verification_expires_at: Set(Some((now + self.verification_ttl).into())),
            followers: Set(id_list::empty()),
            following: Set(id_list::empty()),
            posts: Set(id_list::empty()),
            comments: Set(id_list::empty()),
            jobs: Set(id_list::empty()),
            applications: Set(id_list::empty()),
            connections: Set(id_list::empty()),
            conversations: Set(id_list::empty()),
            created_at: Set(now.into()),
            updated_at: Set(None),
        };

        let user = self.user_repo.create(model).await?;
        tracing::info!(user_id = %user.id, "Account created");

        if let Err(e) = self.notifier.send_verification(&user, &token).await {
            tracing::warn!(user_id = %user.id, error = %e, "Failed to send verification token");
        }
        Ok(user)
    }

    /// Check credentials and issue a session token.
    pub async fn login(&self, input: LoginInput) -> AppResult<LoginOutput> {
        input.validate()?;

        let user = self
            .user_repo
            .find_by_email(input.email.trim())
            .await?
            .ok_or_else(|| {
                AppError::Unauthorized("no account registered with this email".to_string())
            })?;

        if !user.is_verified() {
            return Err(AppError::Forbidden(
                "email address has not been verified".to_string(),
            ));
        }

        if !verify_password(&input.password, &user.password_hash)? {
            return Err(AppError::Unauthorized("incorrect password".to_string()));
        }

        let token = self.sessions.issue(&user.id, &user.email)?;
        tracing::debug!(user_id = %user.id, "Session issued");

        Ok(LoginOutput {
            token,
            expires_in: self.sessions.ttl_secs(),
            user,
        })
    }

    /// Consume a verification token.
    pub async fn verify_email(&self, token: &str) -> AppResult<user::Model> {
        let user = self
            .user_repo
            .find_by_verification_token(token)
            .await?
            .ok_or_else(|| AppError::NotFound("verification token".to_string()))?;

        if user
            .verification_expires_at
            .is_some_and(|expires_at| expires_at < Utc::now())
        {
            return Err(AppError::BadRequest(
                "verification token has expired".to_string(),
            ));
        }

        let mut active: user::ActiveModel = user.into();
        active.verification_token = Set(None);
        active.verification_expires_at = Set(None);
        active.updated_at = Set(Some(Utc::now().into()));

        let user = self.user_repo.update(active).await?;
        tracing::info!(user_id = %user.id, "E-mail verified");
        Ok(user)
    }

    /// Issue a new verification token for an unverified account.
    pub async fn resend_verification(&self, email: &str) -> AppResult<()> {
        let user = self
            .user_repo
            .find_by_email(email.trim())
            .await?
            .ok_or_else(|| AppError::UserNotFound(email.to_string()))?;

        if user.is_verified() {
            return Err(AppError::BadRequest(
                "email address is already verified".to_string(),
            ));
        }

        let token = self.id_gen.generate_token();
        let now = Utc::now();

        let mut active: user::ActiveModel = user.into();
        active.verification_token = Set(Some(token.clone()));
        active.verification_expires_at = Set(Some((now + self.verification_ttl).into()));
        active.updated_at = Set(Some(now.into()));

        let user = self.user_repo.update(active).await?;
        self.notifier.send_verification(&user, &token).await
    }

    /// Resolve a bearer token to its user.
    pub async fn authenticate(&self, token: &str) -> AppResult<user::Model> {
        let claims = self.sessions.verify(token)?;

        self.user_repo
            .find_by_id(&claims.sub)
            .await?
            .ok_or_else(|| AppError::Unauthorized("account no longer exists".to_string()))
    }
}

/// Hash a password using Argon2.
fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a stored hash.
fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_then_verify() {
        let hash = hash_password("correct horse").unwrap();

        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse", &hash).unwrap());
        assert!(!verify_password("battery staple", &hash).unwrap());
    }

    #[test]
    fn test_salts_differ() {
        let a = hash_password("same").unwrap();
        let b = hash_password("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_invalid_hash_is_internal_error() {
        assert!(matches!(
            verify_password("x", "not-a-phc-string"),
            Err(AppError::Internal(_))
        ));
    }

    #[test]
    fn test_signup_input_validation() {
        let input = SignupInput {
            name: String::new(),
            email: "not-an-email".to_string(),
            password: "short".to_string(),
        };
        let errors = input.validate().unwrap_err();
        let fields = errors.field_errors();

        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
    }
}

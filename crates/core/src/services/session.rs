//! Session tokens.
//!
//! Sessions are stateless HS256 JWTs. The token carries the user id and
//! e-mail; every request re-loads the user so a deleted account cannot keep
//! using an old token.

use agora_common::{AppError, AppResult, config::AuthConfig};
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// JWT claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User ID.
    pub sub: String,
    pub email: String,
    /// Issued at (unix seconds).
    pub iat: i64,
    /// Expires at (unix seconds).
    pub exp: i64,
}

/// Issues and validates session tokens.
#[derive(Clone)]
pub struct SessionService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: i64,
}

impl SessionService {
    /// Create a session service from the auth configuration.
    #[must_use]
    pub fn new(config: &AuthConfig) -> Self {
        Self::with_secret(config.jwt_secret.as_bytes(), config.session_ttl_secs)
    }

    /// Create a session service with an explicit secret and lifetime.
    #[must_use]
    pub fn with_secret(secret: &[u8], ttl_secs: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl_secs,
        }
    }

    /// Token lifetime in seconds.
    #[must_use]
    pub const fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    /// Issue a token for a user.
    pub fn issue(&self, user_id: &str, email: &str) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            iat: now,
            exp: now + self.ttl_secs,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("Failed to sign session token: {e}")))
    }

    /// Validate a token and return its claims.
    pub fn verify(&self, token: &str) -> AppResult<Claims> {
        decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims)
            .map_err(|e| AppError::Unauthorized(format!("Invalid session token: {e}")))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_then_verify() {
        let sessions = SessionService::with_secret(b"secret", 3600);
        let token = sessions.issue("u1", "a@example.com").unwrap();

        let claims = sessions.verify(&token).unwrap();
        assert_eq!(claims.sub, "u1");
        assert_eq!(claims.email, "a@example.com");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_wrong_secret_is_unauthorized() {
        let token = SessionService::with_secret(b"one", 3600)
            .issue("u1", "a@example.com")
            .unwrap();

        let result = SessionService::with_secret(b"two", 3600).verify(&token);
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn test_expired_token_is_unauthorized() {
        // Well past the default validation leeway.
        let sessions = SessionService::with_secret(b"secret", -3600);
        let token = sessions.issue("u1", "a@example.com").unwrap();

        assert!(matches!(
            sessions.verify(&token),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_garbage_is_unauthorized() {
        let sessions = SessionService::with_secret(b"secret", 3600);
        assert!(sessions.verify("not.a.jwt").is_err());
    }
}

//! ID and token generation.

use ulid::Ulid;
use uuid::Uuid;

/// ID generator for entities.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    _private: (),
}

impl IdGenerator {
    /// Create a new ID generator.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Generate a new entity ID.
    ///
    /// IDs are lower-cased ULIDs, so sorting by ID sorts by creation time
    /// (to millisecond precision). Cursor pagination relies on this.
    #[must_use]
    pub fn generate(&self) -> String {
        Ulid::new().to_string().to_lowercase()
    }

    /// Generate an unguessable single-use token (e-mail verification).
    #[must_use]
    pub fn generate_token(&self) -> String {
        // v4 only: no time component leaks into the token
        Uuid::new_v4().simple().to_string()
    }
}

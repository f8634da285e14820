//! Repository layer.
//!
//! Each repository wraps a shared connection for plain reads and writes.
//! Methods ending in `_in_conn` take the connection explicitly so the
//! integrity service can run them inside one transaction.

pub mod application;
pub mod comment;
pub mod connection;
pub mod job;
pub mod messaging;
pub mod post;
pub mod user;

pub use application::ApplicationRepository;
pub use comment::CommentRepository;
pub use connection::ConnectionRepository;
pub use job::JobRepository;
pub use messaging::MessagingRepository;
pub use post::PostRepository;
pub use user::UserRepository;

/// Hard cap for paginated listings.
pub const MAX_PAGE_SIZE: u64 = 100;

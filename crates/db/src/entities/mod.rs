//! Database entities.
//!
//! Relations between documents are stored twice: as a single id on the
//! child (`creator_id`, `post_id`, ...) and as a JSON array of ids on the
//! parent (`comments`, `applicants`, ...). Nothing in the schema enforces
//! either side; `agora-core`'s integrity service keeps them in step.

pub mod application;
pub mod comment;
pub mod connection;
pub mod conversation;
pub mod job;
pub mod message;
pub mod post;
pub mod user;

pub use application::Entity as Application;
pub use comment::Entity as Comment;
pub use connection::Entity as Connection;
pub use conversation::Entity as Conversation;
pub use job::Entity as Job;
pub use message::Entity as Message;
pub use post::Entity as Post;
pub use user::Entity as User;

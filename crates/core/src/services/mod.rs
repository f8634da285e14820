//! Business logic services.

#![allow(missing_docs)]

pub mod application;
pub mod auth;
pub mod comment;
pub mod connection;
pub mod following;
pub mod integrity;
pub mod job;
pub mod messaging;
pub mod notifier;
pub mod post;
pub mod session;
pub mod user;

pub use application::{ApplicationService, ApplicationWithApplicant, ApplyInput};
pub use auth::{AuthService, LoginInput, LoginOutput, SignupInput};
pub use comment::{CommentInput, CommentService, CommentWithCreator};
pub use connection::ConnectionService;
pub use following::FollowingService;
pub use integrity::{CascadePlan, CascadeSummary, IntegrityService, Root};
pub use job::{CreateJobInput, JobService, UpdateJobInput};
pub use messaging::{MessagingService, SendMessageInput};
pub use notifier::{LogNotifier, NotifierService, VerificationNotifier};
pub use post::{CreatePostInput, PostService, PostWithCreator, UpdatePostInput};
pub use session::{Claims, SessionService};
pub use user::{UpdateUserInput, UserService};

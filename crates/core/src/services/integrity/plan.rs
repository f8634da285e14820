//! Cascade planning.
//!
//! A [`CascadePlan`] is computed in full before anything is written: first
//! the set of documents to delete, then the id pulls every surviving
//! document needs. Applying the plan deletes children before parents and
//! finishes with the pulls, grouped so each document is written once.

use std::collections::{BTreeMap, BTreeSet};

use agora_common::AppResult;
use agora_db::{
    entities::{application, comment, connection, conversation, job, message, post, user},
    id_list,
    refs::{self, DocKind, RefField},
    repositories::{
        ApplicationRepository, CommentRepository, ConnectionRepository, JobRepository,
        MessagingRepository, PostRepository, UserRepository,
    },
};
use futures::future::try_join_all;
use sea_orm::ConnectionTrait;

/// The document a cascade starts from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Root {
    User(String),
    Post(String),
    Comment(String),
    Job(String),
    Application(String),
    Connection(String),
    Conversation(String),
    Message(String),
}

impl Root {
    /// Entity name, for logs and error messages.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::User(_) => "User",
            Self::Post(_) => "Post",
            Self::Comment(_) => "Comment",
            Self::Job(_) => "Job",
            Self::Application(_) => "Application",
            Self::Connection(_) => "Connection",
            Self::Conversation(_) => "Conversation",
            Self::Message(_) => "Message",
        }
    }

    /// Document kind for roots that own id arrays of their own.
    #[must_use]
    pub const fn parent_kind(&self) -> Option<DocKind> {
        match self {
            Self::User(_) => Some(DocKind::User),
            Self::Post(_) => Some(DocKind::Post),
            Self::Job(_) => Some(DocKind::Job),
            Self::Conversation(_) => Some(DocKind::Conversation),
            Self::Comment(_) | Self::Application(_) | Self::Connection(_) | Self::Message(_) => None,
        }
    }

    /// The root document's id.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::User(id)
            | Self::Post(id)
            | Self::Comment(id)
            | Self::Job(id)
            | Self::Application(id)
            | Self::Connection(id)
            | Self::Conversation(id)
            | Self::Message(id) => id,
        }
    }
}

type Pulls = BTreeMap<RefField, BTreeSet<String>>;

/// Every write a cascade performs.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CascadePlan {
    pub users: BTreeSet<String>,
    pub posts: BTreeSet<String>,
    pub comments: BTreeSet<String>,
    pub jobs: BTreeSet<String>,
    pub applications: BTreeSet<String>,
    pub connections: BTreeSet<String>,
    pub conversations: BTreeSet<String>,
    pub messages: BTreeSet<String>,
    pulls: BTreeMap<(DocKind, String), Pulls>,
}

/// Row counts reported after a plan is applied.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CascadeSummary {
    pub deleted: usize,
    pub documents_updated: usize,
}

impl CascadePlan {
    /// Build the plan for deleting `root`.
    ///
    /// Returns `None` when the root does not exist.
    pub async fn build<C: ConnectionTrait>(conn: &C, root: &Root) -> AppResult<Option<Self>> {
        let mut plan = Self::default();

        match root {
            Root::User(id) => {
                let Some(user) = UserRepository::find_by_id_in_conn(conn, id).await? else {
                    return Ok(None);
                };
                plan.expand_user(conn, &user).await?;
            }
            Root::Post(id) => {
                let Some(post) = PostRepository::find_by_id_in_conn(conn, id).await? else {
                    return Ok(None);
                };
                plan.add_posts(conn, vec![post]).await?;
            }
            Root::Comment(id) => {
                let Some(comment) = CommentRepository::find_by_id_in_conn(conn, id).await? else {
                    return Ok(None);
                };
                plan.add_comments(vec![comment]);
            }
            Root::Job(id) => {
                let Some(job) = JobRepository::find_by_id_in_conn(conn, id).await? else {
                    return Ok(None);
                };
                plan.add_jobs(conn, vec![job]).await?;
            }
            Root::Application(id) => {
                let Some(application) =
                    ApplicationRepository::find_by_id_in_conn(conn, id).await?
                else {
                    return Ok(None);
                };
                plan.add_applications(vec![application]);
            }
            Root::Connection(id) => {
                let Some(connection) = ConnectionRepository::find_by_id_in_conn(conn, id).await?
                else {
                    return Ok(None);
                };
                plan.add_connections(vec![connection]);
            }
            Root::Conversation(id) => {
                let Some(conversation) =
                    MessagingRepository::find_conversation_in_conn(conn, id).await?
                else {
                    return Ok(None);
                };
                plan.add_conversations(conn, vec![conversation]).await?;
            }
            Root::Message(id) => {
                let Some(message) = MessagingRepository::find_message_in_conn(conn, id).await?
                else {
                    return Ok(None);
                };
                plan.add_messages(vec![message]);
            }
        }

        plan.drop_pulls_on_deleted();
        Ok(Some(plan))
    }

    /// Number of documents the plan deletes.
    #[must_use]
    pub fn delete_count(&self) -> usize {
        self.users.len()
            + self.posts.len()
            + self.comments.len()
            + self.jobs.len()
            + self.applications.len()
            + self.connections.len()
            + self.conversations.len()
            + self.messages.len()
    }

    /// Ids to pull from one column of one document, if any.
    #[must_use]
    pub fn pulls_for(&self, kind: DocKind, id: &str, field: RefField) -> Option<&BTreeSet<String>> {
        self.pulls
            .get(&(kind, id.to_string()))
            .and_then(|fields| fields.get(&field))
    }

    /// Number of surviving documents the plan rewrites.
    #[must_use]
    pub fn pull_count(&self) -> usize {
        self.pulls.len()
    }

    fn pull(&mut self, field: RefField, owner_id: &str, id: &str) {
        self.pulls
            .entry((field.owner(), owner_id.to_string()))
            .or_default()
            .entry(field)
            .or_default()
            .insert(id.to_string());
    }

    async fn expand_user<C: ConnectionTrait>(
        &mut self,
        conn: &C,
        user: &user::Model,
    ) -> AppResult<()> {
        let owner = std::slice::from_ref(&user.id);
        self.users.insert(user.id.clone());

        for follower in id_list::ids(&user.followers) {
            self.pull(RefField::UserFollowing, &follower, &user.id);
        }
        for followee in id_list::ids(&user.following) {
            self.pull(RefField::UserFollowers, &followee, &user.id);
        }

        let posts = PostRepository::find_by_creator_ids_in_conn(conn, owner).await?;
        self.add_posts(conn, posts).await?;

        let comments = CommentRepository::find_by_creator_ids_in_conn(conn, owner).await?;
        self.add_comments(comments);

        let jobs = JobRepository::find_by_creator_ids_in_conn(conn, owner).await?;
        self.add_jobs(conn, jobs).await?;

        let applications = ApplicationRepository::find_by_applicant_ids_in_conn(conn, owner).await?;
        self.add_applications(applications);

        let connections = ConnectionRepository::find_by_user_ids_in_conn(conn, owner).await?;
        self.add_connections(connections);

        let conversation_ids = id_list::ids(&user.conversations);
        let conversations =
            MessagingRepository::find_conversations_by_ids_in_conn(conn, &conversation_ids).await?;
        self.add_conversations(conn, conversations).await?;

        Ok(())
    }

    async fn add_posts<C: ConnectionTrait>(
        &mut self,
        conn: &C,
        posts: Vec<post::Model>,
    ) -> AppResult<()> {
        let ids: Vec<String> = posts.iter().map(|p| p.id.clone()).collect();
        for post in posts {
            self.pull(RefField::UserPosts, &post.creator_id, &post.id);
            self.posts.insert(post.id);
        }

        let comments = CommentRepository::find_by_post_ids_in_conn(conn, &ids).await?;
        self.add_comments(comments);
        Ok(())
    }

    fn add_comments(&mut self, comments: Vec<comment::Model>) {
        for comment in comments {
            self.pull(RefField::PostComments, &comment.post_id, &comment.id);
            self.pull(RefField::UserComments, &comment.creator_id, &comment.id);
            self.comments.insert(comment.id);
        }
    }

    async fn add_jobs<C: ConnectionTrait>(
        &mut self,
        conn: &C,
        jobs: Vec<job::Model>,
    ) -> AppResult<()> {
        let ids: Vec<String> = jobs.iter().map(|j| j.id.clone()).collect();
        for job in jobs {
            self.pull(RefField::UserJobs, &job.creator_id, &job.id);
            self.jobs.insert(job.id);
        }

        let applications = ApplicationRepository::find_by_job_ids_in_conn(conn, &ids).await?;
        self.add_applications(applications);
        Ok(())
    }

    fn add_applications(&mut self, applications: Vec<application::Model>) {
        for application in applications {
            self.pull(RefField::JobApplicants, &application.job_id, &application.id);
            self.pull(
                RefField::UserApplications,
                &application.applicant_id,
                &application.id,
            );
            self.applications.insert(application.id);
        }
    }

    fn add_connections(&mut self, connections: Vec<connection::Model>) {
        for connection in connections {
            self.pull(RefField::UserConnections, &connection.sender_id, &connection.id);
            self.pull(
                RefField::UserConnections,
                &connection.recipient_id,
                &connection.id,
            );
            self.connections.insert(connection.id);
        }
    }

    async fn add_conversations<C: ConnectionTrait>(
        &mut self,
        conn: &C,
        conversations: Vec<conversation::Model>,
    ) -> AppResult<()> {
        let ids: Vec<String> = conversations.iter().map(|c| c.id.clone()).collect();
        for conversation in conversations {
            for participant in id_list::ids(&conversation.participants) {
                self.pull(RefField::UserConversations, &participant, &conversation.id);
            }
            self.conversations.insert(conversation.id);
        }

        let messages =
            MessagingRepository::find_messages_by_conversation_ids_in_conn(conn, &ids).await?;
        self.add_messages(messages);
        Ok(())
    }

    fn add_messages(&mut self, messages: Vec<message::Model>) {
        for message in messages {
            self.pull(
                RefField::ConversationMessages,
                &message.conversation_id,
                &message.id,
            );
            self.messages.insert(message.id);
        }
    }

    fn is_deleted(&self, kind: DocKind, id: &str) -> bool {
        match kind {
            DocKind::User => self.users.contains(id),
            DocKind::Post => self.posts.contains(id),
            DocKind::Job => self.jobs.contains(id),
            DocKind::Conversation => self.conversations.contains(id),
        }
    }

    fn drop_pulls_on_deleted(&mut self) {
        let pulls = std::mem::take(&mut self.pulls);
        self.pulls = pulls
            .into_iter()
            .filter(|((kind, id), _)| !self.is_deleted(*kind, id))
            .collect();
    }

    /// Apply the plan on `conn`.
    ///
    /// Siblings within a stage are written concurrently; the first failure
    /// aborts the stage and is returned. Callers run this inside a
    /// transaction so a failure leaves nothing behind.
    pub async fn apply<C: ConnectionTrait>(&self, conn: &C) -> AppResult<CascadeSummary> {
        // Leaves: nothing else in the plan points at these.
        let mut deleted = 0;
        deleted += count(try_join_all(
            self.messages
                .iter()
                .map(|id| MessagingRepository::delete_message_in_conn(conn, id)),
        )
        .await?);
        deleted += count(try_join_all(
            self.comments
                .iter()
                .map(|id| CommentRepository::delete_by_id_in_conn(conn, id)),
        )
        .await?);
        deleted += count(try_join_all(
            self.applications
                .iter()
                .map(|id| ApplicationRepository::delete_by_id_in_conn(conn, id)),
        )
        .await?);

        // Parents of the leaves.
        deleted += count(try_join_all(
            self.posts
                .iter()
                .map(|id| PostRepository::delete_by_id_in_conn(conn, id)),
        )
        .await?);
        deleted += count(try_join_all(
            self.jobs
                .iter()
                .map(|id| JobRepository::delete_by_id_in_conn(conn, id)),
        )
        .await?);
        deleted += count(try_join_all(
            self.connections
                .iter()
                .map(|id| ConnectionRepository::delete_by_id_in_conn(conn, id)),
        )
        .await?);
        deleted += count(try_join_all(
            self.conversations
                .iter()
                .map(|id| MessagingRepository::delete_conversation_in_conn(conn, id)),
        )
        .await?);

        deleted += count(try_join_all(
            self.users
                .iter()
                .map(|id| UserRepository::delete_by_id_in_conn(conn, id)),
        )
        .await?);

        let updated = try_join_all(
            self.pulls
                .iter()
                .map(|((kind, id), pulls)| refs::pull_in_conn(conn, *kind, id, pulls)),
        )
        .await?;

        Ok(CascadeSummary {
            deleted,
            documents_updated: count(updated),
        })
    }
}

fn count(results: Vec<bool>) -> usize {
    results.into_iter().filter(|hit| *hit).count()
}

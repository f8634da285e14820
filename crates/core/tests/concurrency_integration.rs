//! Racing writers against a pooled database.
//!
//! Every test here runs its writers on separate pool connections at the
//! same time. A writer may lose the race with a database error, but the
//! writes that report success must all be visible, and both sides of every
//! relation must agree afterwards.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::BTreeSet;

use agora_common::{AppError, AppResult, IdGenerator};
use agora_core::{
    CommentInput, CommentService, ConnectionService, CreatePostInput, FollowingService,
    IntegrityService, PostService,
};
use agora_db::{
    entities::{comment, connection::ConnectionStatus, user},
    id_list,
    repositories::{CommentRepository, ConnectionRepository, PostRepository, UserRepository},
    test_utils::TestDatabase,
};
use chrono::Utc;
use futures::future::join_all;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, Set};

const WRITERS: usize = 12;

struct Harness {
    db: TestDatabase,
    user_repo: UserRepository,
    post_repo: PostRepository,
    following: FollowingService,
    posts: PostService,
    comments: CommentService,
    connections: ConnectionService,
}

impl Harness {
    async fn new() -> Self {
        let db = TestDatabase::pooled(8).await.unwrap();
        let conn = db.shared();

        let user_repo = UserRepository::new(conn.clone());
        let post_repo = PostRepository::new(conn.clone());
        let integrity = IntegrityService::new(conn.clone());

        Self {
            following: FollowingService::new(user_repo.clone(), integrity.clone()),
            posts: PostService::new(post_repo.clone(), integrity.clone()),
            comments: CommentService::new(
                CommentRepository::new(conn.clone()),
                post_repo.clone(),
                integrity.clone(),
            ),
            connections: ConnectionService::new(
                ConnectionRepository::new(conn),
                user_repo.clone(),
                integrity,
            ),
            user_repo,
            post_repo,
            db,
        }
    }

    /// Insert a user directly; password hashing is irrelevant here.
    async fn user(&self, name: &str) -> user::Model {
        let id = IdGenerator::new().generate();
        self.user_repo
            .create(user::ActiveModel {
                id: Set(id.clone()),
                name: Set(name.to_string()),
                email: Set(format!("{name}-{id}@example.com").to_lowercase()),
                password_hash: Set("unused".to_string()),
                headline: Set(None),
                bio: Set(None),
                avatar_url: Set(None),
                verification_token: Set(None),
                verification_expires_at: Set(None),
                followers: Set(id_list::empty()),
                following: Set(id_list::empty()),
                posts: Set(id_list::empty()),
                comments: Set(id_list::empty()),
                jobs: Set(id_list::empty()),
                applications: Set(id_list::empty()),
                connections: Set(id_list::empty()),
                conversations: Set(id_list::empty()),
                created_at: Set(Utc::now().into()),
                updated_at: Set(None),
            })
            .await
            .unwrap()
    }

    async fn users(&self, prefix: &str) -> Vec<user::Model> {
        let mut users = Vec::with_capacity(WRITERS);
        for i in 0..WRITERS {
            users.push(self.user(&format!("{prefix}{i}")).await);
        }
        users
    }

    async fn comment_rows(&self, post_id: &str) -> BTreeSet<String> {
        comment::Entity::find()
            .filter(comment::Column::PostId.eq(post_id))
            .all(self.db.connection())
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect()
    }
}

fn set(ids: Vec<String>) -> BTreeSet<String> {
    ids.into_iter().collect()
}

/// Successful values keyed by writer; failures must be database errors.
fn settle<K, T>(results: Vec<(K, AppResult<T>)>, allowed: fn(&AppError) -> bool) -> Vec<(K, T)> {
    results
        .into_iter()
        .filter_map(|(key, result)| match result {
            Ok(value) => Some((key, value)),
            Err(err) => {
                assert!(allowed(&err), "unexpected error: {err:?}");
                None
            }
        })
        .collect()
}

const fn database_only(err: &AppError) -> bool {
    matches!(err, AppError::Database(_))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_follows_keep_both_sides_in_step() {
    let h = Harness::new().await;
    let target = h.user("target").await;
    let followers = h.users("fan").await;

    let tasks = followers.iter().map(|f| {
        let following = h.following.clone();
        let (follower_id, target_id) = (f.id.clone(), target.id.clone());
        tokio::spawn(async move {
            let result = following.follow(&follower_id, &target_id).await;
            (follower_id, result)
        })
    });
    let results = join_all(tasks)
        .await
        .into_iter()
        .map(Result::unwrap)
        .collect();

    let followed: BTreeSet<String> = settle(results, database_only)
        .into_iter()
        .map(|(id, ())| id)
        .collect();
    assert!(!followed.is_empty());

    let target_now = h.user_repo.get_by_id(&target.id).await.unwrap();
    assert_eq!(set(id_list::ids(&target_now.followers)), followed);

    for f in &followers {
        let now = h.user_repo.get_by_id(&f.id).await.unwrap();
        assert_eq!(
            id_list::contains(&now.following, &target.id),
            followed.contains(&f.id),
            "follower {}",
            f.name
        );
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_comments_are_all_listed_on_the_post() {
    let h = Harness::new().await;
    let author = h.user("author").await;
    let commenters = h.users("reader").await;
    let post = h
        .posts
        .create(
            &author.id,
            CreatePostInput {
                text: "busy thread".to_string(),
                image_url: None,
            },
        )
        .await
        .unwrap();

    let tasks = commenters.iter().map(|c| {
        let comments = h.comments.clone();
        let (creator_id, post_id) = (c.id.clone(), post.id.clone());
        tokio::spawn(async move {
            let result = comments
                .create(
                    &creator_id,
                    &post_id,
                    CommentInput {
                        text: "me too".to_string(),
                    },
                )
                .await
                .map(|comment| comment.id);
            (creator_id, result)
        })
    });
    let results = join_all(tasks)
        .await
        .into_iter()
        .map(Result::unwrap)
        .collect();

    let created = settle(results, database_only);
    assert!(!created.is_empty());
    let created_ids: BTreeSet<String> = created.iter().map(|(_, id)| id.clone()).collect();

    let post_now = h.post_repo.get_by_id(&post.id).await.unwrap();
    assert_eq!(set(id_list::ids(&post_now.comments)), created_ids);
    assert_eq!(h.comment_rows(&post.id).await, created_ids);

    for (creator_id, comment_id) in &created {
        let creator = h.user_repo.get_by_id(creator_id).await.unwrap();
        assert_eq!(id_list::ids(&creator.comments), vec![comment_id.clone()]);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_comment_racing_post_delete_leaves_no_orphan() {
    let h = Harness::new().await;
    let author = h.user("author").await;
    let commenters = h.users("reader").await;
    let post = h
        .posts
        .create(
            &author.id,
            CreatePostInput {
                text: "short lived".to_string(),
                image_url: None,
            },
        )
        .await
        .unwrap();

    let delete = {
        let posts = h.posts.clone();
        let (actor_id, post_id) = (author.id.clone(), post.id.clone());
        tokio::spawn(async move { posts.delete(&actor_id, &post_id).await })
    };
    let tasks = commenters.iter().map(|c| {
        let comments = h.comments.clone();
        let (creator_id, post_id) = (c.id.clone(), post.id.clone());
        tokio::spawn(async move {
            let result = comments
                .create(
                    &creator_id,
                    &post_id,
                    CommentInput {
                        text: "first".to_string(),
                    },
                )
                .await
                .map(|comment| comment.id);
            (creator_id, result)
        })
    });
    let results = join_all(tasks)
        .await
        .into_iter()
        .map(Result::unwrap)
        .collect();
    let deleted = delete.await.unwrap();

    let created = settle(results, |err| {
        matches!(
            err,
            AppError::Database(_) | AppError::NotFound(_) | AppError::PostNotFound(_)
        )
    });

    let rows = h.comment_rows(&post.id).await;
    match h.post_repo.find_by_id(&post.id).await.unwrap() {
        Some(post_now) => {
            assert!(matches!(deleted, Err(AppError::Database(_))));
            assert_eq!(set(id_list::ids(&post_now.comments)), rows);
        }
        None => {
            assert!(deleted.is_ok());
            assert!(rows.is_empty(), "orphaned comments: {rows:?}");
        }
    }

    for c in &commenters {
        let now = h.user_repo.get_by_id(&c.id).await.unwrap();
        let listed = set(id_list::ids(&now.comments));
        assert!(listed.is_subset(&rows), "{} lists a deleted comment", c.name);
        let owned: BTreeSet<String> = created
            .iter()
            .filter(|(creator_id, id)| *creator_id == c.id && rows.contains(id))
            .map(|(_, id)| id.clone())
            .collect();
        assert_eq!(listed, owned);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_accept_and_reject_settle_on_one_answer() {
    let h = Harness::new().await;
    let sender = h.user("sender").await;
    let recipient = h.user("recipient").await;
    let request = h
        .connections
        .request(&sender.id, &recipient.id)
        .await
        .unwrap();

    let tasks = (0..WRITERS).map(|i| {
        let connections = h.connections.clone();
        let (actor_id, id) = (recipient.id.clone(), request.id.clone());
        tokio::spawn(async move {
            let result = if i % 2 == 0 {
                connections.accept(&actor_id, &id).await
            } else {
                connections.reject(&actor_id, &id).await
            };
            (i, result.map(|c| c.status))
        })
    });
    let results = join_all(tasks)
        .await
        .into_iter()
        .map(Result::unwrap)
        .collect();

    let answered = settle(results, |err| {
        matches!(err, AppError::Database(_) | AppError::Conflict(_))
    });
    assert!(answered.len() <= 1, "answered twice: {answered:?}");

    let sender_now = h.user_repo.get_by_id(&sender.id).await.unwrap();
    let recipient_now = h.user_repo.get_by_id(&recipient.id).await.unwrap();
    let mutual = id_list::contains(&sender_now.following, &recipient.id)
        && id_list::contains(&recipient_now.following, &sender.id);
    let any_edge = !id_list::ids(&sender_now.following).is_empty()
        || !id_list::ids(&recipient_now.following).is_empty();

    let final_status = h
        .connections
        .list(&sender.id, None, 10, None)
        .await
        .unwrap()
        .into_iter()
        .find(|c| c.id == request.id)
        .map(|c| c.status);

    match answered.first() {
        Some((_, ConnectionStatus::Accepted)) => {
            assert_eq!(final_status, Some(ConnectionStatus::Accepted));
            assert!(mutual);
        }
        Some((_, status)) => {
            assert_eq!(final_status.as_ref(), Some(status));
            assert!(!any_edge);
        }
        None => {
            assert_eq!(final_status, Some(ConnectionStatus::Pending));
            assert!(!any_edge);
        }
    }
}

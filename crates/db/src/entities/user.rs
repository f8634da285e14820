//! User entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Display name
    pub name: String,

    /// Login e-mail, stored lower-cased
    #[sea_orm(unique)]
    pub email: String,

    /// Argon2 PHC string
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// One-line professional headline
    #[sea_orm(nullable)]
    pub headline: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub bio: Option<String>,

    #[sea_orm(nullable)]
    pub avatar_url: Option<String>,

    /// Pending e-mail verification token. `Some` means the account is not verified yet.
    #[sea_orm(unique, nullable)]
    #[serde(skip_serializing)]
    pub verification_token: Option<String>,

    #[sea_orm(nullable)]
    #[serde(skip_serializing)]
    pub verification_expires_at: Option<DateTimeWithTimeZone>,

    /// IDs of users following this user
    #[sea_orm(column_type = "Json")]
    pub followers: Json,

    /// IDs of users this user follows
    #[sea_orm(column_type = "Json")]
    pub following: Json,

    #[sea_orm(column_type = "Json")]
    pub posts: Json,

    #[sea_orm(column_type = "Json")]
    pub comments: Json,

    #[sea_orm(column_type = "Json")]
    pub jobs: Json,

    /// IDs of job applications this user submitted
    #[sea_orm(column_type = "Json")]
    pub applications: Json,

    /// IDs of connections where this user is sender or recipient
    #[sea_orm(column_type = "Json")]
    pub connections: Json,

    #[sea_orm(column_type = "Json")]
    pub conversations: Json,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

impl Model {
    /// Whether the account has completed e-mail verification.
    #[must_use]
    pub const fn is_verified(&self) -> bool {
        self.verification_token.is_none()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::post::Entity")]
    Posts,

    #[sea_orm(has_many = "super::job::Entity")]
    Jobs,
}

impl Related<super::post::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Posts.def()
    }
}

impl Related<super::job::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Jobs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

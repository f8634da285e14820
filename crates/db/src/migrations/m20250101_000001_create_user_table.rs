//! Create user table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(User::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(User::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(User::Name).string_len(128).not_null())
                    .col(
                        ColumnDef::new(User::Email)
                            .string_len(320)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(User::PasswordHash).string_len(256).not_null())
                    .col(ColumnDef::new(User::Headline).string_len(256))
                    .col(ColumnDef::new(User::Bio).text())
                    .col(ColumnDef::new(User::AvatarUrl).string_len(1024))
                    .col(
                        ColumnDef::new(User::VerificationToken)
                            .string_len(64)
                            .unique_key(),
                    )
                    .col(ColumnDef::new(User::VerificationExpiresAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(User::Followers).json().not_null())
                    .col(ColumnDef::new(User::Following).json().not_null())
                    .col(ColumnDef::new(User::Posts).json().not_null())
                    .col(ColumnDef::new(User::Comments).json().not_null())
                    .col(ColumnDef::new(User::Jobs).json().not_null())
                    .col(ColumnDef::new(User::Applications).json().not_null())
                    .col(ColumnDef::new(User::Connections).json().not_null())
                    .col(ColumnDef::new(User::Conversations).json().not_null())
                    .col(
                        ColumnDef::new(User::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(User::UpdatedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        // Index: created_at (for listing)
        manager
            .create_index(
                Index::create()
                    .name("idx_user_created_at")
                    .table(User::Table)
                    .col(User::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(User::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum User {
    Table,
    Id,
    Name,
    Email,
    PasswordHash,
    Headline,
    Bio,
    AvatarUrl,
    VerificationToken,
    VerificationExpiresAt,
    Followers,
    Following,
    Posts,
    Comments,
    Jobs,
    Applications,
    Connections,
    Conversations,
    CreatedAt,
    UpdatedAt,
}

//! Create job table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Job::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Job::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Job::CreatorId).string_len(32).not_null())
                    .col(ColumnDef::new(Job::Title).string_len(256).not_null())
                    .col(ColumnDef::new(Job::Company).string_len(256).not_null())
                    .col(ColumnDef::new(Job::Location).string_len(256))
                    .col(ColumnDef::new(Job::Description).text().not_null())
                    .col(ColumnDef::new(Job::Applicants).json().not_null())
                    .col(
                        ColumnDef::new(Job::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Job::UpdatedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_job_creator_id")
                    .table(Job::Table)
                    .col(Job::CreatorId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Job::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Job {
    Table,
    Id,
    CreatorId,
    Title,
    Company,
    Location,
    Description,
    Applicants,
    CreatedAt,
    UpdatedAt,
}

//! Create application table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Application::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Application::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Application::JobId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Application::ApplicantId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Application::CoverLetter).text())
                    .col(ColumnDef::new(Application::ResumeUrl).string_len(1024))
                    .col(
                        ColumnDef::new(Application::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: one application per user per job
        manager
            .create_index(
                Index::create()
                    .name("idx_application_job_applicant")
                    .table(Application::Table)
                    .col(Application::JobId)
                    .col(Application::ApplicantId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_application_applicant_id")
                    .table(Application::Table)
                    .col(Application::ApplicantId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Application::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Application {
    Table,
    Id,
    JobId,
    ApplicantId,
    CoverLetter,
    ResumeUrl,
    CreatedAt,
}

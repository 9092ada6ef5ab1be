//! Create user_enrolment table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UserEnrolment::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserEnrolment::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(UserEnrolment::UserId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserEnrolment::EnrolId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserEnrolment::Status)
                            .string_len(16)
                            .not_null()
                            .default("active"),
                    )
                    .col(
                        ColumnDef::new(UserEnrolment::TimeStart)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(UserEnrolment::TimeEnd).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(UserEnrolment::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_enrolment_user")
                            .from(UserEnrolment::Table, UserEnrolment::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_enrolment_instance")
                            .from(UserEnrolment::Table, UserEnrolment::EnrolId)
                            .to(EnrolInstance::Table, EnrolInstance::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (enrol_id, user_id) - one enrolment per user and instance
        manager
            .create_index(
                Index::create()
                    .name("idx_user_enrolment_enrol_user")
                    .table(UserEnrolment::Table)
                    .col(UserEnrolment::EnrolId)
                    .col(UserEnrolment::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: user_id (for course access checks)
        manager
            .create_index(
                Index::create()
                    .name("idx_user_enrolment_user_id")
                    .table(UserEnrolment::Table)
                    .col(UserEnrolment::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserEnrolment::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum UserEnrolment {
    Table,
    Id,
    UserId,
    EnrolId,
    Status,
    TimeStart,
    TimeEnd,
    CreatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}

#[derive(Iden)]
enum EnrolInstance {
    Table,
    Id,
}

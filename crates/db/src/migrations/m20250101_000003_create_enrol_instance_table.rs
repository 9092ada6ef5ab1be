//! Create enrol_instance table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(EnrolInstance::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EnrolInstance::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(EnrolInstance::CourseId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(EnrolInstance::Method).string_len(20).not_null())
                    .col(ColumnDef::new(EnrolInstance::Name).string_len(255))
                    .col(
                        ColumnDef::new(EnrolInstance::Status)
                            .string_len(16)
                            .not_null()
                            .default("enabled"),
                    )
                    .col(ColumnDef::new(EnrolInstance::Password).string_len(50))
                    .col(
                        ColumnDef::new(EnrolInstance::UseGroupKey)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(EnrolInstance::ShowHint).boolean())
                    .col(ColumnDef::new(EnrolInstance::EnrolStart).timestamp_with_time_zone())
                    .col(ColumnDef::new(EnrolInstance::EnrolEnd).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(EnrolInstance::MaxEnrolled)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(EnrolInstance::AllowNewEnrols)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(EnrolInstance::SortOrder)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(EnrolInstance::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_enrol_instance_course")
                            .from(EnrolInstance::Table, EnrolInstance::CourseId)
                            .to(Course::Table, Course::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (course_id, method) - instances of one method in a course
        manager
            .create_index(
                Index::create()
                    .name("idx_enrol_instance_course_method")
                    .table(EnrolInstance::Table)
                    .col(EnrolInstance::CourseId)
                    .col(EnrolInstance::Method)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(EnrolInstance::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum EnrolInstance {
    Table,
    Id,
    CourseId,
    Method,
    Name,
    Status,
    Password,
    UseGroupKey,
    ShowHint,
    EnrolStart,
    EnrolEnd,
    MaxEnrolled,
    AllowNewEnrols,
    SortOrder,
    CreatedAt,
}

#[derive(Iden)]
enum Course {
    Table,
    Id,
}

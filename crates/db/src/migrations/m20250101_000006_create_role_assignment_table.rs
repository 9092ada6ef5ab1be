//! Create role_assignment table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RoleAssignment::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RoleAssignment::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(RoleAssignment::CourseId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RoleAssignment::UserId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(RoleAssignment::Role).string_len(16).not_null())
                    .col(
                        ColumnDef::new(RoleAssignment::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_role_assignment_course")
                            .from(RoleAssignment::Table, RoleAssignment::CourseId)
                            .to(Course::Table, Course::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_role_assignment_user")
                            .from(RoleAssignment::Table, RoleAssignment::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (course_id, user_id, role)
        manager
            .create_index(
                Index::create()
                    .name("idx_role_assignment_course_user_role")
                    .table(RoleAssignment::Table)
                    .col(RoleAssignment::CourseId)
                    .col(RoleAssignment::UserId)
                    .col(RoleAssignment::Role)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RoleAssignment::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum RoleAssignment {
    Table,
    Id,
    CourseId,
    UserId,
    Role,
    CreatedAt,
}

#[derive(Iden)]
enum Course {
    Table,
    Id,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}

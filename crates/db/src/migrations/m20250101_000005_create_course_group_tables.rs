//! Create course_group and course_group_member tables migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CourseGroup::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CourseGroup::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CourseGroup::CourseId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(CourseGroup::Name).string_len(254).not_null())
                    .col(ColumnDef::new(CourseGroup::EnrolmentKey).string_len(50))
                    .col(
                        ColumnDef::new(CourseGroup::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_course_group_course")
                            .from(CourseGroup::Table, CourseGroup::CourseId)
                            .to(Course::Table, Course::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_course_group_course_id")
                    .table(CourseGroup::Table)
                    .col(CourseGroup::CourseId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CourseGroupMember::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CourseGroupMember::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CourseGroupMember::GroupId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CourseGroupMember::UserId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CourseGroupMember::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_course_group_member_group")
                            .from(CourseGroupMember::Table, CourseGroupMember::GroupId)
                            .to(CourseGroup::Table, CourseGroup::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_course_group_member_user")
                            .from(CourseGroupMember::Table, CourseGroupMember::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (group_id, user_id) - no duplicate memberships
        manager
            .create_index(
                Index::create()
                    .name("idx_course_group_member_group_user")
                    .table(CourseGroupMember::Table)
                    .col(CourseGroupMember::GroupId)
                    .col(CourseGroupMember::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CourseGroupMember::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CourseGroup::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum CourseGroup {
    Table,
    Id,
    CourseId,
    Name,
    EnrolmentKey,
    CreatedAt,
}

#[derive(Iden)]
enum CourseGroupMember {
    Table,
    Id,
    GroupId,
    UserId,
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

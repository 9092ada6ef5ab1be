//! Course group repository.

use std::sync::Arc;

use crate::entities::{course_group, course_group_member, CourseGroup, CourseGroupMember};
use enrol_common::{AppError, AppResult};
use sea_orm::sea_query::Query;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};

/// Course group repository for database operations.
#[derive(Clone)]
pub struct CourseGroupRepository {
    db: Arc<DatabaseConnection>,
}

impl CourseGroupRepository {
    /// Create a new course group repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Groups of a course that carry an enrolment key.
    pub async fn find_keyed_by_course(
        &self,
        course_id: &str,
    ) -> AppResult<Vec<course_group::Model>> {
        CourseGroup::find()
            .filter(course_group::Column::CourseId.eq(course_id))
            .filter(course_group::Column::EnrolmentKey.is_not_null())
            .order_by_asc(course_group::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a membership.
    pub async fn find_member(
        &self,
        group_id: &str,
        user_id: &str,
    ) -> AppResult<Option<course_group_member::Model>> {
        CourseGroupMember::find()
            .filter(course_group_member::Column::GroupId.eq(group_id))
            .filter(course_group_member::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Add a member to a group.
    pub async fn add_member(
        &self,
        model: course_group_member::ActiveModel,
    ) -> AppResult<course_group_member::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Remove a user from every group of a course. Returns the number removed.
    pub async fn remove_user_from_course(&self, course_id: &str, user_id: &str) -> AppResult<u64> {
        let course_groups = Query::select()
            .column(course_group::Column::Id)
            .from(CourseGroup)
            .and_where(course_group::Column::CourseId.eq(course_id))
            .to_owned();

        let result = CourseGroupMember::delete_many()
            .filter(course_group_member::Column::UserId.eq(user_id))
            .filter(course_group_member::Column::GroupId.in_subquery(course_groups))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_group(id: &str, key: Option<&str>) -> course_group::Model {
        course_group::Model {
            id: id.to_string(),
            course_id: "c1".to_string(),
            name: format!("Group {id}"),
            enrolment_key: key.map(str::to_string),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_find_keyed_by_course() {
        let g1 = create_test_group("g1", Some("red"));
        let g2 = create_test_group("g2", Some("blue"));

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[g1, g2]])
                .into_connection(),
        );

        let repo = CourseGroupRepository::new(db);
        let groups = repo.find_keyed_by_course("c1").await.unwrap();

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[1].enrolment_key.as_deref(), Some("blue"));
    }

    #[tokio::test]
    async fn test_remove_user_from_course() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 2,
                }])
                .into_connection(),
        );

        let repo = CourseGroupRepository::new(db);
        assert_eq!(repo.remove_user_from_course("c1", "user1").await.unwrap(), 2);
    }
}

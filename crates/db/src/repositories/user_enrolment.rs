//! User enrolment repository.

use std::sync::Arc;

use crate::entities::enrol_instance::InstanceStatus;
use crate::entities::user_enrolment::EnrolmentStatus;
use crate::entities::{enrol_instance, user_enrolment, UserEnrolment};
use enrol_common::{AppError, AppResult};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, JoinType, ModelTrait, PaginatorTrait,
    QueryFilter, QuerySelect, RelationTrait,
};

/// User enrolment repository for database operations.
#[derive(Clone)]
pub struct UserEnrolmentRepository {
    db: Arc<DatabaseConnection>,
}

impl UserEnrolmentRepository {
    /// Create a new user enrolment repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an enrolment by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<user_enrolment::Model>> {
        UserEnrolment::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find the enrolment of a user through one instance.
    pub async fn find_by_instance_and_user(
        &self,
        enrol_id: &str,
        user_id: &str,
    ) -> AppResult<Option<user_enrolment::Model>> {
        UserEnrolment::find()
            .filter(user_enrolment::Column::EnrolId.eq(enrol_id))
            .filter(user_enrolment::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count enrolments through one instance.
    pub async fn count_by_instance(&self, enrol_id: &str) -> AppResult<u64> {
        UserEnrolment::find()
            .filter(user_enrolment::Column::EnrolId.eq(enrol_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Enrolments of a user across all instances of a course.
    pub async fn find_by_course_and_user(
        &self,
        course_id: &str,
        user_id: &str,
    ) -> AppResult<Vec<user_enrolment::Model>> {
        UserEnrolment::find()
            .join(
                JoinType::InnerJoin,
                user_enrolment::Relation::EnrolInstance.def(),
            )
            .filter(enrol_instance::Column::CourseId.eq(course_id))
            .filter(user_enrolment::Column::UserId.eq(user_id))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Whether a user holds an active enrolment in an enabled instance of a course.
    pub async fn has_active_in_course(&self, course_id: &str, user_id: &str) -> AppResult<bool> {
        let count = UserEnrolment::find()
            .join(
                JoinType::InnerJoin,
                user_enrolment::Relation::EnrolInstance.def(),
            )
            .filter(enrol_instance::Column::CourseId.eq(course_id))
            .filter(enrol_instance::Column::Status.eq(InstanceStatus::Enabled))
            .filter(user_enrolment::Column::UserId.eq(user_id))
            .filter(user_enrolment::Column::Status.eq(EnrolmentStatus::Active))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(count > 0)
    }

    /// Insert an enrolment unless the (instance, user) pair already has one.
    ///
    /// Returns whether a row was inserted.
    pub async fn insert_if_absent(&self, model: user_enrolment::ActiveModel) -> AppResult<bool> {
        let inserted = UserEnrolment::insert(model)
            .on_conflict(
                OnConflict::columns([user_enrolment::Column::EnrolId, user_enrolment::Column::UserId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(inserted > 0)
    }

    /// Delete an enrolment.
    pub async fn delete(&self, enrolment: user_enrolment::Model) -> AppResult<()> {
        enrolment
            .delete(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

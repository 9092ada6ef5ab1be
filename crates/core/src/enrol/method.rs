//! The capability interface every enrolment method implements.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use enrol_common::{AppError, AppResult, IdGenerator};
use enrol_db::entities::user_enrolment::EnrolmentStatus;
use enrol_db::entities::{course_group_member, enrol_instance, user_enrolment};
use enrol_db::repositories::{CourseGroupRepository, UserEnrolmentRepository};
use sea_orm::Set;
use serde::Serialize;

use super::policy::Ineligibility;
use crate::context::RequestContext;

/// Label shown in place of the secret when an instance requires a key.
pub const ENROL_PASSWORD_LABEL: &str = "Enrolment key";

/// Read-only projection of one instance, as seen by the acting user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrolInfo {
    pub id: String,
    pub course_id: String,
    #[serde(rename = "type")]
    pub method: String,
    pub name: String,
    /// `"true"` when the user can enrol now, else the reason why not.
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrol_password: Option<String>,
}

/// Severity of one settings-test finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

/// One finding of a settings test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettingsCheck {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
}

impl SettingsCheck {
    pub fn ok(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(name, CheckStatus::Ok, message)
    }

    pub fn warning(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(name, CheckStatus::Warning, message)
    }

    pub fn error(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(name, CheckStatus::Error, message)
    }

    fn new(name: impl Into<String>, status: CheckStatus, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status,
            message: message.into(),
        }
    }
}

/// Result of running a method's settings test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettingsReport {
    pub method: String,
    pub enabled: bool,
    pub checks: Vec<SettingsCheck>,
}

impl SettingsReport {
    /// Whether any check failed outright.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.checks.iter().any(|c| c.status == CheckStatus::Error)
    }
}

/// An enrolment method, dispatched by its tag through the registry.
#[async_trait]
pub trait EnrolMethod: Send + Sync {
    /// Method tag, e.g. `"self"`.
    fn name(&self) -> &'static str;

    /// Human-readable method name.
    fn display_name(&self) -> &'static str;

    /// Name of an instance; falls back to the method's display name.
    fn instance_name(&self, instance: &enrol_instance::Model) -> String {
        instance
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map_or_else(|| self.display_name().to_string(), str::to_string)
    }

    /// Whether the acting user could enrol themselves through `instance` now.
    ///
    /// The outer result carries storage failures; the inner one the policy
    /// answer.
    async fn can_self_enrol(
        &self,
        _ctx: &RequestContext,
        _instance: &enrol_instance::Model,
    ) -> AppResult<Result<(), Ineligibility>> {
        Ok(Err(Ineligibility::NotSelfService))
    }

    /// Create an active enrolment of `user_id` through `instance`.
    ///
    /// Enrolling a user who is already enrolled through the instance returns
    /// the existing row.
    async fn enrol_user(
        &self,
        ctx: &RequestContext,
        instance: &enrol_instance::Model,
        user_id: &str,
        group_id: Option<&str>,
    ) -> AppResult<user_enrolment::Model>;

    /// Remove the enrolment of `user_id` through `instance`, if any.
    async fn unenrol_user(&self, instance: &enrol_instance::Model, user_id: &str) -> AppResult<()>;

    /// Whether staff may remove this particular enrolment.
    fn allow_unenrol_user(
        &self,
        instance: &enrol_instance::Model,
        enrolment: &user_enrolment::Model,
    ) -> bool;

    /// Describe an instance for the acting user.
    async fn enrol_info(
        &self,
        ctx: &RequestContext,
        instance: &enrol_instance::Model,
    ) -> AppResult<EnrolInfo> {
        let status = match self.can_self_enrol(ctx, instance).await? {
            Ok(()) => "true".to_string(),
            Err(reason) => reason.to_string(),
        };

        Ok(EnrolInfo {
            id: instance.id.clone(),
            course_id: instance.course_id.clone(),
            method: self.name().to_string(),
            name: self.instance_name(instance),
            status,
            enrol_password: instance
                .requires_password()
                .then(|| ENROL_PASSWORD_LABEL.to_string()),
        })
    }

    /// Whether the method ships an admin settings test.
    fn supports_settings_test(&self) -> bool {
        false
    }

    /// Run the admin settings test.
    async fn test_settings(&self, _enabled: bool) -> AppResult<SettingsReport> {
        Err(AppError::Unsupported(format!(
            "{} has no settings test",
            self.name()
        )))
    }
}

/// Enrolment storage shared by the built-in methods.
#[derive(Clone)]
pub struct EnrolmentStore {
    enrolments: UserEnrolmentRepository,
    groups: CourseGroupRepository,
    id_gen: IdGenerator,
}

impl EnrolmentStore {
    #[must_use]
    pub const fn new(enrolments: UserEnrolmentRepository, groups: CourseGroupRepository) -> Self {
        Self {
            enrolments,
            groups,
            id_gen: IdGenerator::new(),
        }
    }

    pub(crate) const fn enrolments(&self) -> &UserEnrolmentRepository {
        &self.enrolments
    }

    /// Enrol a user through `instance`, or return the enrolment they hold.
    ///
    /// Two concurrent calls for the same pair end up with the same row.
    pub async fn add(
        &self,
        instance: &enrol_instance::Model,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> AppResult<user_enrolment::Model> {
        if let Some(existing) = self
            .enrolments
            .find_by_instance_and_user(&instance.id, user_id)
            .await?
        {
            return Ok(existing);
        }

        let model = user_enrolment::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            enrol_id: Set(instance.id.clone()),
            status: Set(EnrolmentStatus::Active),
            time_start: Set(now),
            time_end: Set(None),
            created_at: Set(now),
        };
        if !self.enrolments.insert_if_absent(model).await? {
            tracing::debug!(
                user_id = %user_id,
                instance_id = %instance.id,
                "Enrolment was created by a concurrent request"
            );
        }

        self.enrolments
            .find_by_instance_and_user(&instance.id, user_id)
            .await?
            .ok_or_else(|| {
                AppError::Internal(format!(
                    "enrolment of {user_id} through {} missing after insert",
                    instance.id
                ))
            })
    }

    /// Add a user to a course group unless they are already a member.
    pub async fn join_group(
        &self,
        group_id: &str,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        if self.groups.find_member(group_id, user_id).await?.is_some() {
            return Ok(());
        }

        let model = course_group_member::ActiveModel {
            id: Set(self.id_gen.generate()),
            group_id: Set(group_id.to_string()),
            user_id: Set(user_id.to_string()),
            created_at: Set(now),
        };
        self.groups.add_member(model).await?;
        Ok(())
    }

    /// Delete a user's enrolment through `instance`.
    ///
    /// Missing enrolments are ignored. Once the user holds no enrolment left in
    /// the course, their course group memberships go too.
    pub async fn remove(&self, instance: &enrol_instance::Model, user_id: &str) -> AppResult<()> {
        let Some(enrolment) = self
            .enrolments
            .find_by_instance_and_user(&instance.id, user_id)
            .await?
        else {
            return Ok(());
        };

        self.enrolments.delete(enrolment).await?;

        let remaining = self
            .enrolments
            .find_by_course_and_user(&instance.course_id, user_id)
            .await?;
        if remaining.is_empty() {
            let removed = self
                .groups
                .remove_user_from_course(&instance.course_id, user_id)
                .await?;
            tracing::debug!(
                user_id = %user_id,
                course_id = %instance.course_id,
                groups = removed,
                "Removed group memberships after last enrolment"
            );
        }

        Ok(())
    }
}

//! Self enrolment service.

use std::sync::Arc;

use enrol_common::{AppError, AppResult};
use enrol_db::repositories::{CourseGroupRepository, CourseRepository, EnrolInstanceRepository};
use serde::Deserialize;
use tracing::{debug, info};
use validator::Validate;

use super::access::AccessService;
use crate::context::RequestContext;
use crate::enrol::{
    EnrolInfo, EnrolMethod, EnrolRegistry, EnrolmentAttempt, EnrolmentPolicyEvaluator,
    EnrolmentResult, GroupKeys, SELF_METHOD, SelfEnrolMethod,
};

/// Input for enrolling the acting user into a course.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EnrolUserInput {
    #[validate(length(min = 1, max = 32))]
    pub course_id: String,
    /// Enrolment key; empty when none is supplied.
    #[serde(default)]
    #[validate(length(max = 255))]
    pub password: String,
    /// Restrict the attempt to one instance. Empty or `"0"` means all.
    #[serde(default)]
    pub instance_id: Option<String>,
}

impl EnrolUserInput {
    fn target_instance(&self) -> Option<&str> {
        self.instance_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty() && *id != "0")
    }
}

/// Instance lookup and self enrolment for the acting user.
#[derive(Clone)]
pub struct SelfEnrolmentService {
    course_repo: CourseRepository,
    instance_repo: EnrolInstanceRepository,
    group_repo: CourseGroupRepository,
    access: AccessService,
    registry: Arc<EnrolRegistry>,
    self_method: Arc<SelfEnrolMethod>,
}

impl SelfEnrolmentService {
    /// Create a new self enrolment service.
    #[must_use]
    pub const fn new(
        course_repo: CourseRepository,
        instance_repo: EnrolInstanceRepository,
        group_repo: CourseGroupRepository,
        access: AccessService,
        registry: Arc<EnrolRegistry>,
        self_method: Arc<SelfEnrolMethod>,
    ) -> Self {
        Self {
            course_repo,
            instance_repo,
            group_repo,
            access,
            registry,
            self_method,
        }
    }

    /// Describe one self enrolment instance.
    ///
    /// The instance's key is never disclosed; only whether one is required.
    pub async fn instance_info(&self, ctx: &RequestContext, instance_id: &str) -> AppResult<EnrolInfo> {
        if instance_id.trim().is_empty() {
            return Err(AppError::Validation("instanceId is required".to_string()));
        }

        let method = self
            .registry
            .get(SELF_METHOD)
            .ok_or_else(|| AppError::Unsupported("self enrolment is not installed".to_string()))?;

        let instance = self.instance_repo.get_by_id(instance_id).await?;
        if instance.method != SELF_METHOD {
            return Err(AppError::InstanceNotFound(instance_id.to_string()));
        }

        let course = self.course_repo.get_by_id(&instance.course_id).await?;
        if !self.access.can_view_course_info(ctx, &course).await?
            && !self.access.can_access_course(ctx, &course).await?
        {
            return Err(AppError::Forbidden("coursehidden".to_string()));
        }

        method.enrol_info(ctx, &instance).await
    }

    /// Try to enrol the acting user through the course's self enrolment
    /// instances, or through the one named in the input.
    ///
    /// Policy rejections come back as warnings in the result. Errors are
    /// reserved for bad input, missing records, hidden courses and a missing
    /// or disabled method.
    pub async fn enrol_user(
        &self,
        ctx: &RequestContext,
        input: EnrolUserInput,
    ) -> AppResult<EnrolmentResult> {
        input.validate()?;

        let course = self.course_repo.get_by_id(&input.course_id).await?;
        if !self.access.can_view_course_info(ctx, &course).await? {
            return Err(AppError::Forbidden("coursehidden".to_string()));
        }

        if self.registry.get_enabled(SELF_METHOD).is_none() {
            return Err(AppError::Unsupported("canntenrol".to_string()));
        }

        let target = input.target_instance();
        let instances: Vec<_> = self
            .instance_repo
            .find_by_course(&course.id, true)
            .await?
            .into_iter()
            .filter(|i| i.method == SELF_METHOD)
            .filter(|i| target.is_none_or(|id| i.id == id))
            .collect();

        if instances.is_empty() {
            return Err(AppError::Unsupported("canntenrol".to_string()));
        }

        let needs_group_keys = instances
            .iter()
            .any(|i| i.use_group_key && i.requires_password());
        let group_keys = if needs_group_keys {
            GroupKeys::from_groups(&course.id, self.group_repo.find_keyed_by_course(&course.id).await?)
        } else {
            GroupKeys::default()
        };

        let mut candidates = Vec::with_capacity(instances.len());
        for instance in instances {
            candidates.push(self.self_method.candidate(ctx, instance, true).await?);
        }

        let attempt = EnrolmentAttempt {
            user_id: ctx.user_id().to_string(),
            course_id: course.id.clone(),
            password: input.password,
        };
        let decision = EnrolmentPolicyEvaluator::new(&group_keys, ctx.now)
            .with_show_hint_default(self.self_method.config().show_hint)
            .evaluate(&attempt, candidates);

        for warning in &decision.warnings {
            debug!(
                user_id = %attempt.user_id,
                course_id = %attempt.course_id,
                instance_id = %warning.item_id,
                code = warning.code.as_str(),
                "Self enrolment rejected by instance"
            );
        }

        if let Some(accepted) = &decision.accepted {
            let enrolment = self
                .self_method
                .enrol_user(ctx, &accepted.instance, &attempt.user_id, accepted.group_id.as_deref())
                .await?;
            info!(
                user_id = %attempt.user_id,
                course_id = %attempt.course_id,
                instance_id = %accepted.instance.id,
                enrolment_id = %enrolment.id,
                group_id = ?accepted.group_id,
                "User self-enrolled"
            );
        }

        Ok(decision.into_result())
    }
}

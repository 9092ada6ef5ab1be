//! Self-enrolment policy evaluation.
//!
//! [`EnrolmentPolicyEvaluator`] decides, for one attempt against an ordered
//! list of candidate instances, which instance (if any) the user may enrol
//! through. It is pure: all facts it needs (enrolled counts, existing
//! enrolments, group keys) are loaded by the caller beforehand, and the
//! enrolment itself is performed by the caller on the accepted instance.
//!
//! Rejections are never errors. Each rejected instance contributes exactly one
//! [`EnrolmentWarning`], in iteration order, and evaluation stops at the first
//! accepted instance.

use chrono::{DateTime, Utc};
use enrol_db::entities::{course_group, enrol_instance};
use thiserror::Error;

/// Item tag carried by every enrolment warning.
pub const WARNING_ITEM_INSTANCE: &str = "instance";

const KEY_INVALID_MESSAGE: &str = "Incorrect enrolment key, please try again";

/// Why a candidate instance rejected an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningCode {
    /// Instance not open for enrolment (disabled, window, capacity, ...).
    Ineligible,
    /// Key matched neither the instance nor any group of the course.
    GroupKeyMismatch,
    /// Key mismatch; the message reveals the first character.
    KeyMismatchHinted,
    /// Key mismatch without a hint.
    KeyMismatch,
}

impl WarningCode {
    /// Wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ineligible => "1",
            Self::GroupKeyMismatch => "2",
            Self::KeyMismatchHinted => "3",
            Self::KeyMismatch => "4",
        }
    }
}

/// One rejection recorded while evaluating an attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrolmentWarning {
    pub item: &'static str,
    pub item_id: String,
    pub code: WarningCode,
    pub message: String,
}

impl EnrolmentWarning {
    fn for_instance(instance: &enrol_instance::Model, code: WarningCode, message: String) -> Self {
        Self {
            item: WARNING_ITEM_INSTANCE,
            item_id: instance.id.clone(),
            code,
            message,
        }
    }
}

/// Reason an instance is not open for enrolment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Ineligibility {
    #[error("Enrolment is disabled or inactive")]
    Disabled,
    #[error("You are already enrolled in this course")]
    AlreadyEnrolled,
    #[error("New enrolments are disabled")]
    NewEnrolsDisabled,
    #[error("Enrolment starts from {}", format_date(.0))]
    NotYetOpen(DateTime<Utc>),
    #[error("Enrolment ended on {}", format_date(.0))]
    Closed(DateTime<Utc>),
    #[error("Maximum number of users already enrolled")]
    Full,
    #[error("This enrolment method does not allow self enrolment")]
    NotSelfService,
}

fn format_date(at: &DateTime<Utc>) -> String {
    at.format("%-d %B %Y, %H:%M").to_string()
}

/// A request to self-enrol with an optional key.
#[derive(Debug, Clone)]
pub struct EnrolmentAttempt {
    pub user_id: String,
    pub course_id: String,
    /// Supplied key; empty when none was given.
    pub password: String,
}

/// An instance together with the facts needed to judge eligibility.
#[derive(Debug, Clone)]
pub struct CandidateInstance {
    pub instance: enrol_instance::Model,
    /// Users currently enrolled through the instance. Only meaningful when
    /// `max_enrolled > 0`.
    pub enrolled_count: u64,
    /// Whether the attempting user already holds an enrolment here.
    pub already_enrolled: bool,
}

impl CandidateInstance {
    /// Candidate with no enrolments at all.
    #[must_use]
    pub const fn fresh(instance: enrol_instance::Model) -> Self {
        Self {
            instance,
            enrolled_count: 0,
            already_enrolled: false,
        }
    }
}

/// Check whether a candidate is open for enrolment at `now`.
pub fn check_eligibility(
    candidate: &CandidateInstance,
    now: DateTime<Utc>,
) -> Result<(), Ineligibility> {
    let instance = &candidate.instance;

    if !instance.is_enabled() {
        return Err(Ineligibility::Disabled);
    }
    if candidate.already_enrolled {
        return Err(Ineligibility::AlreadyEnrolled);
    }
    if !instance.allow_new_enrols {
        return Err(Ineligibility::NewEnrolsDisabled);
    }
    if let Some(start) = instance.enrol_start {
        if now < start {
            return Err(Ineligibility::NotYetOpen(start));
        }
    }
    if let Some(end) = instance.enrol_end {
        if now > end {
            return Err(Ineligibility::Closed(end));
        }
    }
    if let Ok(max) = u64::try_from(instance.max_enrolled) {
        if max > 0 && candidate.enrolled_count >= max {
            return Err(Ineligibility::Full);
        }
    }

    Ok(())
}

/// Group-key membership check for instances in group-key mode.
pub trait GroupKeyCheck {
    /// ID of the group of `course_id` whose enrolment key is exactly `key`.
    fn find_group(&self, course_id: &str, key: &str) -> Option<String>;
}

/// Group keys of one course, loaded up front.
#[derive(Debug, Clone, Default)]
pub struct GroupKeys {
    course_id: String,
    keys: Vec<(String, String)>,
}

impl GroupKeys {
    /// Collect the non-empty group keys of a course.
    #[must_use]
    pub fn from_groups(course_id: &str, groups: Vec<course_group::Model>) -> Self {
        let keys = groups
            .into_iter()
            .filter(|g| g.course_id == course_id)
            .filter_map(|g| {
                g.enrolment_key
                    .filter(|k| !k.is_empty())
                    .map(|k| (g.id, k))
            })
            .collect();

        Self {
            course_id: course_id.to_string(),
            keys,
        }
    }

    /// Number of keyed groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl GroupKeyCheck for GroupKeys {
    fn find_group(&self, course_id: &str, key: &str) -> Option<String> {
        if course_id != self.course_id || key.is_empty() {
            return None;
        }
        self.keys
            .iter()
            .find(|(_, k)| k == key)
            .map(|(id, _)| id.clone())
    }
}

/// The instance an attempt was accepted by.
#[derive(Debug, Clone)]
pub struct Acceptance {
    pub instance: enrol_instance::Model,
    /// Group whose key was used, when accepted through a group key.
    pub group_id: Option<String>,
}

/// Outcome of evaluating one attempt.
#[derive(Debug, Clone)]
pub struct PolicyDecision {
    pub accepted: Option<Acceptance>,
    pub warnings: Vec<EnrolmentWarning>,
}

/// Final answer returned to the caller of the enrol web service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrolmentResult {
    pub status: bool,
    pub warnings: Vec<EnrolmentWarning>,
}

impl PolicyDecision {
    /// Whether an instance accepted the attempt.
    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        self.accepted.is_some()
    }

    /// Convert into the result reported to the user.
    #[must_use]
    pub fn into_result(self) -> EnrolmentResult {
        EnrolmentResult {
            status: self.accepted.is_some(),
            warnings: self.warnings,
        }
    }
}

/// Evaluates attempts against candidate instances.
pub struct EnrolmentPolicyEvaluator<'a, G: GroupKeyCheck> {
    group_keys: &'a G,
    now: DateTime<Utc>,
    show_hint_default: bool,
}

impl<'a, G: GroupKeyCheck> EnrolmentPolicyEvaluator<'a, G> {
    #[must_use]
    pub const fn new(group_keys: &'a G, now: DateTime<Utc>) -> Self {
        Self {
            group_keys,
            now,
            show_hint_default: false,
        }
    }

    /// Hint setting for instances that leave `show_hint` unset.
    #[must_use]
    pub fn with_show_hint_default(mut self, show_hint: bool) -> Self {
        self.show_hint_default = show_hint;
        self
    }

    /// Evaluate `attempt` against `candidates` in order.
    ///
    /// Stops at the first accepted candidate; later candidates contribute
    /// nothing to the decision.
    #[must_use]
    pub fn evaluate(
        &self,
        attempt: &EnrolmentAttempt,
        candidates: Vec<CandidateInstance>,
    ) -> PolicyDecision {
        let mut warnings = Vec::new();

        for candidate in candidates {
            if let Err(reason) = check_eligibility(&candidate, self.now) {
                warnings.push(EnrolmentWarning::for_instance(
                    &candidate.instance,
                    WarningCode::Ineligible,
                    reason.to_string(),
                ));
                continue;
            }

            match self.check_key(attempt, &candidate.instance) {
                Ok(group_id) => {
                    return PolicyDecision {
                        accepted: Some(Acceptance {
                            instance: candidate.instance,
                            group_id,
                        }),
                        warnings,
                    };
                }
                Err(warning) => warnings.push(warning),
            }
        }

        PolicyDecision {
            accepted: None,
            warnings,
        }
    }

    /// Ok carries the matched group when a group key was used.
    fn check_key(
        &self,
        attempt: &EnrolmentAttempt,
        instance: &enrol_instance::Model,
    ) -> Result<Option<String>, EnrolmentWarning> {
        let Some(secret) = instance.password.as_deref().filter(|p| !p.is_empty()) else {
            return Ok(None);
        };
        if attempt.password == secret {
            return Ok(None);
        }

        if instance.use_group_key {
            return self
                .group_keys
                .find_group(&instance.course_id, &attempt.password)
                .map(Some)
                .ok_or_else(|| {
                    EnrolmentWarning::for_instance(
                        instance,
                        WarningCode::GroupKeyMismatch,
                        KEY_INVALID_MESSAGE.to_string(),
                    )
                });
        }

        if instance.show_hint_or(self.show_hint_default) {
            let hint: String = secret.chars().take(1).collect();
            return Err(EnrolmentWarning::for_instance(
                instance,
                WarningCode::KeyMismatchHinted,
                format!("{KEY_INVALID_MESSAGE} (hint: it starts with '{hint}')"),
            ));
        }

        Err(EnrolmentWarning::for_instance(
            instance,
            WarningCode::KeyMismatch,
            KEY_INVALID_MESSAGE.to_string(),
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use enrol_db::entities::enrol_instance::InstanceStatus;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    fn instance(id: &str, password: Option<&str>) -> enrol_instance::Model {
        enrol_instance::Model {
            id: id.to_string(),
            course_id: "c7".to_string(),
            method: "self".to_string(),
            name: None,
            status: InstanceStatus::Enabled,
            password: password.map(str::to_string),
            use_group_key: false,
            show_hint: None,
            enrol_start: None,
            enrol_end: None,
            max_enrolled: 0,
            allow_new_enrols: true,
            sort_order: 0,
            created_at: now(),
        }
    }

    fn attempt(password: &str) -> EnrolmentAttempt {
        EnrolmentAttempt {
            user_id: "u1".to_string(),
            course_id: "c7".to_string(),
            password: password.to_string(),
        }
    }

    fn evaluate(password: &str, instances: Vec<enrol_instance::Model>) -> PolicyDecision {
        evaluate_with_groups(password, instances, &GroupKeys::default())
    }

    fn evaluate_with_groups(
        password: &str,
        instances: Vec<enrol_instance::Model>,
        groups: &GroupKeys,
    ) -> PolicyDecision {
        let candidates = instances.into_iter().map(CandidateInstance::fresh).collect();
        EnrolmentPolicyEvaluator::new(groups, now()).evaluate(&attempt(password), candidates)
    }

    fn group(id: &str, key: Option<&str>) -> course_group::Model {
        course_group::Model {
            id: id.to_string(),
            course_id: "c7".to_string(),
            name: id.to_uppercase(),
            enrolment_key: key.map(str::to_string),
            created_at: now(),
        }
    }

    #[test]
    fn test_empty_secret_accepts_any_code() {
        for supplied in ["", "anything", "abc123"] {
            let decision = evaluate(supplied, vec![instance("i1", None)]);
            assert!(decision.is_accepted(), "rejected {supplied:?}");
            assert!(decision.warnings.is_empty());

            let decision = evaluate(supplied, vec![instance("i1", Some(""))]);
            assert!(decision.is_accepted());
        }
    }

    #[test]
    fn test_exact_secret_succeeds() {
        let decision = evaluate("abc123", vec![instance("i1", Some("abc123"))]);
        let accepted = decision.accepted.unwrap();
        assert_eq!(accepted.instance.id, "i1");
        assert!(accepted.group_id.is_none());
    }

    #[test]
    fn test_comparison_is_case_sensitive() {
        let decision = evaluate("ABC123", vec![instance("i1", Some("abc123"))]);
        assert!(!decision.is_accepted());
        assert_eq!(decision.warnings[0].code, WarningCode::KeyMismatch);
    }

    #[test]
    fn test_hinted_mismatch() {
        let mut i = instance("i1", Some("abc123"));
        i.show_hint = Some(true);

        let result = evaluate("xyz", vec![i]).into_result();

        assert!(!result.status);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].code.as_str(), "3");
        assert_eq!(result.warnings[0].item, "instance");
        assert_eq!(result.warnings[0].item_id, "i1");
        assert!(result.warnings[0].message.contains("'a'"));
    }

    #[test]
    fn test_hint_default_applies_to_unset_instances_only() {
        let unset = instance("i1", Some("abc123"));
        let mut opted_out = instance("i2", Some("abc123"));
        opted_out.show_hint = Some(false);
        let candidates = vec![CandidateInstance::fresh(unset), CandidateInstance::fresh(opted_out)];

        let decision = EnrolmentPolicyEvaluator::new(&GroupKeys::default(), now())
            .with_show_hint_default(true)
            .evaluate(&attempt("xyz"), candidates);

        let codes: Vec<_> = decision.warnings.iter().map(|w| w.code).collect();
        assert_eq!(codes, [WarningCode::KeyMismatchHinted, WarningCode::KeyMismatch]);
    }

    #[test]
    fn test_hint_uses_first_character_not_byte() {
        let mut i = instance("i1", Some("école"));
        i.show_hint = Some(true);

        let decision = evaluate("x", vec![i]);
        assert!(decision.warnings[0].message.contains("'é'"));
    }

    #[test]
    fn test_plain_mismatch_without_hint() {
        let decision = evaluate("xyz", vec![instance("i1", Some("abc123"))]);

        assert_eq!(decision.warnings.len(), 1);
        assert_eq!(decision.warnings[0].code.as_str(), "4");
        assert!(!decision.warnings[0].message.contains("hint"));
    }

    #[test]
    fn test_exact_secret_wins_over_hint_and_group_settings() {
        let mut i = instance("i1", Some("abc123"));
        i.show_hint = Some(true);
        i.use_group_key = true;

        let decision = evaluate("abc123", vec![i]);
        assert!(decision.is_accepted());
        assert!(decision.accepted.unwrap().group_id.is_none());
    }

    #[test]
    fn test_group_key_match() {
        let mut i = instance("i1", Some("instance-key"));
        i.use_group_key = true;
        let groups = GroupKeys::from_groups("c7", vec![group("g1", Some("red")), group("g2", Some("blue"))]);

        let decision = evaluate_with_groups("blue", vec![i], &groups);

        let accepted = decision.accepted.unwrap();
        assert_eq!(accepted.group_id.as_deref(), Some("g2"));
        assert!(decision.warnings.is_empty());
    }

    #[test]
    fn test_group_key_mismatch_ignores_hint() {
        let mut i = instance("i1", Some("instance-key"));
        i.use_group_key = true;
        i.show_hint = Some(true);
        let groups = GroupKeys::from_groups("c7", vec![group("g1", Some("red"))]);

        let decision = evaluate_with_groups("green", vec![i], &groups);

        assert!(!decision.is_accepted());
        assert_eq!(decision.warnings.len(), 1);
        assert_eq!(decision.warnings[0].code, WarningCode::GroupKeyMismatch);
        assert!(!decision.warnings[0].message.contains("hint"));
    }

    #[test]
    fn test_group_keys_skip_empty_and_foreign_groups() {
        let mut foreign = group("g9", Some("blue"));
        foreign.course_id = "other".to_string();
        let groups = GroupKeys::from_groups("c7", vec![group("g1", Some("")), group("g2", None), foreign]);

        assert!(groups.is_empty());
        assert_eq!(groups.find_group("c7", ""), None);
        assert_eq!(groups.find_group("c7", "blue"), None);
    }

    #[test]
    fn test_disabled_instance_never_succeeds() {
        let mut i = instance("i1", None);
        i.status = InstanceStatus::Disabled;

        let decision = evaluate("", vec![i]);

        assert!(!decision.is_accepted());
        assert_eq!(decision.warnings[0].code, WarningCode::Ineligible);
        assert_eq!(decision.warnings[0].message, "Enrolment is disabled or inactive");
    }

    #[test]
    fn test_window_not_open_and_closed() {
        let mut early = instance("i1", None);
        early.enrol_start = Some(now() + Duration::days(1));
        let mut late = instance("i2", None);
        late.enrol_end = Some(now() - Duration::days(1));

        let decision = evaluate("", vec![early, late]);

        assert!(!decision.is_accepted());
        assert_eq!(decision.warnings.len(), 2);
        assert!(decision.warnings[0].message.starts_with("Enrolment starts from 2 March 2025"));
        assert!(decision.warnings[1].message.starts_with("Enrolment ended on 28 February 2025"));
    }

    #[test]
    fn test_window_boundaries_are_inclusive() {
        let mut i = instance("i1", None);
        i.enrol_start = Some(now());
        i.enrol_end = Some(now());

        assert!(evaluate("", vec![i]).is_accepted());
    }

    #[test]
    fn test_capacity() {
        let mut i = instance("i1", None);
        i.max_enrolled = 2;

        let full = CandidateInstance {
            instance: i.clone(),
            enrolled_count: 2,
            already_enrolled: false,
        };
        assert_eq!(check_eligibility(&full, now()), Err(Ineligibility::Full));

        let room = CandidateInstance {
            instance: i,
            enrolled_count: 1,
            already_enrolled: false,
        };
        assert_eq!(check_eligibility(&room, now()), Ok(()));
    }

    #[test]
    fn test_already_enrolled_and_new_enrols_disabled() {
        let enrolled = CandidateInstance {
            instance: instance("i1", None),
            enrolled_count: 0,
            already_enrolled: true,
        };
        assert_eq!(
            check_eligibility(&enrolled, now()),
            Err(Ineligibility::AlreadyEnrolled)
        );

        let mut closed = instance("i2", None);
        closed.allow_new_enrols = false;
        assert_eq!(
            check_eligibility(&CandidateInstance::fresh(closed), now()),
            Err(Ineligibility::NewEnrolsDisabled)
        );
    }

    #[test]
    fn test_stops_at_first_success() {
        let mut ineligible = instance("a", Some("abc123"));
        ineligible.status = InstanceStatus::Disabled;
        let matching = instance("b", Some("abc123"));
        let never_seen = instance("c", Some("zzz"));

        let decision = evaluate("abc123", vec![ineligible, matching, never_seen]);

        assert_eq!(decision.accepted.as_ref().unwrap().instance.id, "b");
        assert_eq!(decision.warnings.len(), 1);
        assert_eq!(decision.warnings[0].item_id, "a");
        assert_eq!(decision.warnings[0].code.as_str(), "1");
    }

    #[test]
    fn test_warnings_follow_iteration_order() {
        let mut hinted = instance("first", Some("k1"));
        hinted.show_hint = Some(true);
        let mut disabled = instance("second", None);
        disabled.status = InstanceStatus::Disabled;
        let plain = instance("third", Some("k3"));

        let decision = evaluate("nope", vec![hinted, disabled, plain]);

        let codes: Vec<_> = decision.warnings.iter().map(|w| w.code.as_str()).collect();
        let ids: Vec<_> = decision.warnings.iter().map(|w| w.item_id.as_str()).collect();
        assert_eq!(codes, ["3", "1", "4"]);
        assert_eq!(ids, ["first", "second", "third"]);
    }

    #[test]
    fn test_evaluation_is_idempotent() {
        let mut i = instance("i1", Some("abc123"));
        i.show_hint = Some(true);

        let first = evaluate("xyz", vec![i.clone()]).into_result();
        let second = evaluate("xyz", vec![i]).into_result();
        assert_eq!(first, second);
    }

    #[test]
    fn test_no_candidates() {
        let result = evaluate("x", Vec::new()).into_result();
        assert!(!result.status);
        assert!(result.warnings.is_empty());
    }
}

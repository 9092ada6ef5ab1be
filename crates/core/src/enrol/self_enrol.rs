//! Self enrolment: users join a course themselves, optionally with a key.

use async_trait::async_trait;
use enrol_common::{AppResult, config::SelfEnrolConfig};
use enrol_db::entities::{enrol_instance, user_enrolment};
use enrol_db::repositories::EnrolInstanceRepository;

use super::method::{EnrolMethod, EnrolmentStore, SettingsCheck, SettingsReport};
use super::policy::{CandidateInstance, Ineligibility, check_eligibility};
use crate::context::RequestContext;

/// Tag of the self enrolment method.
pub const SELF_METHOD: &str = "self";

/// The `self` enrolment method.
#[derive(Clone)]
pub struct SelfEnrolMethod {
    instance_repo: EnrolInstanceRepository,
    store: EnrolmentStore,
    config: SelfEnrolConfig,
}

impl SelfEnrolMethod {
    #[must_use]
    pub const fn new(
        instance_repo: EnrolInstanceRepository,
        store: EnrolmentStore,
        config: SelfEnrolConfig,
    ) -> Self {
        Self {
            instance_repo,
            store,
            config,
        }
    }

    /// Method-level settings.
    #[must_use]
    pub const fn config(&self) -> &SelfEnrolConfig {
        &self.config
    }

    /// Load the facts the policy evaluator needs about one instance.
    ///
    /// The enrolled count is only queried for capped instances, the user's
    /// own enrolment only when `check_user_enrolment` is set.
    pub async fn candidate(
        &self,
        ctx: &RequestContext,
        instance: enrol_instance::Model,
        check_user_enrolment: bool,
    ) -> AppResult<CandidateInstance> {
        let enrolled_count = if instance.max_enrolled > 0 {
            self.store
                .enrolments()
                .count_by_instance(&instance.id)
                .await?
        } else {
            0
        };

        let already_enrolled = if check_user_enrolment {
            self.store
                .enrolments()
                .find_by_instance_and_user(&instance.id, ctx.user_id())
                .await?
                .is_some()
        } else {
            false
        };

        Ok(CandidateInstance {
            instance,
            enrolled_count,
            already_enrolled,
        })
    }
}

#[async_trait]
impl EnrolMethod for SelfEnrolMethod {
    fn name(&self) -> &'static str {
        SELF_METHOD
    }

    fn display_name(&self) -> &'static str {
        "Self enrolment"
    }

    async fn can_self_enrol(
        &self,
        ctx: &RequestContext,
        instance: &enrol_instance::Model,
    ) -> AppResult<Result<(), Ineligibility>> {
        let candidate = self.candidate(ctx, instance.clone(), false).await?;
        Ok(check_eligibility(&candidate, ctx.now))
    }

    async fn enrol_user(
        &self,
        ctx: &RequestContext,
        instance: &enrol_instance::Model,
        user_id: &str,
        group_id: Option<&str>,
    ) -> AppResult<user_enrolment::Model> {
        let enrolment = self.store.add(instance, user_id, ctx.now).await?;

        if let Some(group_id) = group_id {
            self.store.join_group(group_id, user_id, ctx.now).await?;
        }

        Ok(enrolment)
    }

    async fn unenrol_user(&self, instance: &enrol_instance::Model, user_id: &str) -> AppResult<()> {
        self.store.remove(instance, user_id).await
    }

    fn allow_unenrol_user(
        &self,
        _instance: &enrol_instance::Model,
        _enrolment: &user_enrolment::Model,
    ) -> bool {
        self.config.allow_unenrol
    }

    fn supports_settings_test(&self) -> bool {
        true
    }

    async fn test_settings(&self, enabled: bool) -> AppResult<SettingsReport> {
        let mut checks = Vec::new();

        checks.push(if enabled {
            SettingsCheck::ok("enabled", "Self enrolment is enabled")
        } else {
            SettingsCheck::warning(
                "enabled",
                "Self enrolment is installed but not enabled in enrol.enabled_methods",
            )
        });

        checks.push(SettingsCheck::ok(
            "settings",
            format!(
                "show_hint = {}, allow_unenrol = {}",
                self.config.show_hint, self.config.allow_unenrol
            ),
        ));

        let instances = self.instance_repo.find_by_method(SELF_METHOD).await?;
        checks.push(SettingsCheck::ok(
            "instances",
            format!("{} self enrolment instance(s) configured", instances.len()),
        ));

        for instance in &instances {
            if instance.use_group_key && instance.show_hint_or(self.config.show_hint) {
                checks.push(SettingsCheck::warning(
                    format!("instance {}", instance.id),
                    "Group enrolment keys and hints are both enabled; the hint is never shown",
                ));
            }
            if instance.use_group_key && !instance.requires_password() {
                checks.push(SettingsCheck::warning(
                    format!("instance {}", instance.id),
                    "Group enrolment keys are enabled but the instance has no key, so any key is accepted",
                ));
            }
            if let (Some(start), Some(end)) = (instance.enrol_start, instance.enrol_end) {
                if end < start {
                    checks.push(SettingsCheck::error(
                        format!("instance {}", instance.id),
                        "Enrolment ends before it starts; nobody can enrol",
                    ));
                }
            }
        }

        Ok(SettingsReport {
            method: SELF_METHOD.to_string(),
            enabled,
            checks,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::enrol::method::CheckStatus;
    use crate::test_support::{context, instance, mock_store, user};
    use chrono::Duration;
    use enrol_db::entities::course_group_member;
    use enrol_db::entities::user_enrolment::EnrolmentStatus;
    use enrol_db::repositories::{CourseGroupRepository, UserEnrolmentRepository};
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn method_with(
        instance_db: MockDatabase,
        enrolment_db: MockDatabase,
        group_db: MockDatabase,
        config: SelfEnrolConfig,
    ) -> SelfEnrolMethod {
        SelfEnrolMethod::new(
            EnrolInstanceRepository::new(Arc::new(instance_db.into_connection())),
            mock_store(enrolment_db, group_db),
            config,
        )
    }

    fn empty() -> MockDatabase {
        MockDatabase::new(DatabaseBackend::Postgres)
    }

    fn enrolment(id: &str, user_id: &str, enrol_id: &str) -> user_enrolment::Model {
        user_enrolment::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            enrol_id: enrol_id.to_string(),
            status: EnrolmentStatus::Active,
            time_start: chrono::Utc::now(),
            time_end: None,
            created_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_candidate_skips_count_for_uncapped_instance() {
        // No query results queued: any query would fail.
        let method = method_with(empty(), empty(), empty(), SelfEnrolConfig::default());
        let ctx = context(user("u1"));

        let candidate = method.candidate(&ctx, instance("i1", "c1"), false).await.unwrap();

        assert_eq!(candidate.enrolled_count, 0);
        assert!(!candidate.already_enrolled);
    }

    #[tokio::test]
    async fn test_candidate_counts_capped_instance_and_user_enrolment() {
        let mut capped = instance("i1", "c1");
        capped.max_enrolled = 10;

        let enrolment_db = empty()
            .append_query_results([[maplit::btreemap! {
                "num_items" => sea_orm::Value::BigInt(Some(10)),
            }]])
            .append_query_results([[enrolment("ue1", "u1", "i1")]]);
        let method = method_with(empty(), enrolment_db, empty(), SelfEnrolConfig::default());
        let ctx = context(user("u1"));

        let candidate = method.candidate(&ctx, capped, true).await.unwrap();

        assert_eq!(candidate.enrolled_count, 10);
        assert!(candidate.already_enrolled);
        assert_eq!(
            check_eligibility(&candidate, ctx.now),
            Err(Ineligibility::AlreadyEnrolled)
        );
    }

    #[tokio::test]
    async fn test_can_self_enrol_reports_closed_window() {
        let mut closed = instance("i1", "c1");
        let ctx = context(user("u1"));
        closed.enrol_end = Some(ctx.now - Duration::hours(1));

        let method = method_with(empty(), empty(), empty(), SelfEnrolConfig::default());
        let answer = method.can_self_enrol(&ctx, &closed).await.unwrap();

        assert!(matches!(answer, Err(Ineligibility::Closed(_))));
    }

    #[tokio::test]
    async fn test_enrol_info_hides_secret() {
        let mut keyed = instance("i1", "c1");
        keyed.password = Some("abc123".to_string());
        keyed.name = Some("  ".to_string());

        let method = method_with(empty(), empty(), empty(), SelfEnrolConfig::default());
        let info = method.enrol_info(&context(user("u1")), &keyed).await.unwrap();

        assert_eq!(info.status, "true");
        assert_eq!(info.method, "self");
        assert_eq!(info.name, "Self enrolment");
        assert_eq!(info.enrol_password.as_deref(), Some("Enrolment key"));

        let json = serde_json::to_string(&info).unwrap();
        assert!(!json.contains("abc123"));
        assert!(json.contains("\"type\":\"self\""));
    }

    fn inserted(rows_affected: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected,
        }
    }

    #[tokio::test]
    async fn test_enrol_user_creates_enrolment_and_joins_group() {
        let ctx = context(user("u1"));
        let member = course_group_member::Model {
            id: "m1".to_string(),
            group_id: "g1".to_string(),
            user_id: "u1".to_string(),
            created_at: ctx.now,
        };

        let enrolment_conn: Arc<DatabaseConnection> = Arc::new(
            empty()
                .append_query_results([Vec::<user_enrolment::Model>::new()])
                .append_exec_results([inserted(1)])
                .append_query_results([[enrolment("ue1", "u1", "i1")]])
                .into_connection(),
        );
        let group_conn: Arc<DatabaseConnection> = Arc::new(
            empty()
                .append_query_results([Vec::<course_group_member::Model>::new()])
                .append_query_results([[member]])
                .into_connection(),
        );
        let method = SelfEnrolMethod::new(
            EnrolInstanceRepository::new(Arc::new(empty().into_connection())),
            EnrolmentStore::new(
                UserEnrolmentRepository::new(enrolment_conn.clone()),
                CourseGroupRepository::new(group_conn.clone()),
            ),
            SelfEnrolConfig::default(),
        );

        let result = method
            .enrol_user(&ctx, &instance("i1", "c1"), "u1", Some("g1"))
            .await
            .unwrap();
        assert_eq!(result.id, "ue1");
        drop(method);

        // Both rows carry the request time.
        let stamp = format!("{:?}", ctx.now);
        for conn in [enrolment_conn, group_conn] {
            let log = Arc::try_unwrap(conn).unwrap().into_transaction_log();
            assert!(
                log.iter().any(|t| format!("{t:?}").contains(&stamp)),
                "no statement stamped with {stamp}"
            );
        }
    }

    #[tokio::test]
    async fn test_enrol_user_concurrent_insert_returns_existing_row() {
        // Another request inserted the pair between the lookup and the insert.
        let enrolment_db = empty()
            .append_query_results([Vec::<user_enrolment::Model>::new()])
            .append_exec_results([inserted(0)])
            .append_query_results([[enrolment("ue-first", "u1", "i1")]]);
        let method = method_with(empty(), enrolment_db, empty(), SelfEnrolConfig::default());

        let result = method
            .enrol_user(&context(user("u1")), &instance("i1", "c1"), "u1", None)
            .await
            .unwrap();

        assert_eq!(result.id, "ue-first");
    }

    #[tokio::test]
    async fn test_enrol_user_returns_existing_enrolment() {
        let existing = enrolment("ue9", "u1", "i1");
        let enrolment_db = empty().append_query_results([[existing]]);
        let method = method_with(empty(), enrolment_db, empty(), SelfEnrolConfig::default());

        let result = method
            .enrol_user(&context(user("u1")), &instance("i1", "c1"), "u1", None)
            .await
            .unwrap();

        assert_eq!(result.id, "ue9");
    }

    #[tokio::test]
    async fn test_unenrol_removes_groups_after_last_enrolment() {
        let enrolment_db = empty()
            .append_query_results([[enrolment("ue1", "u1", "i1")]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .append_query_results([Vec::<user_enrolment::Model>::new()]);
        let group_db = empty().append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 2,
        }]);
        let method = method_with(empty(), enrolment_db, group_db, SelfEnrolConfig::default());

        method
            .unenrol_user(&instance("i1", "c1"), "u1")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_unenrol_missing_enrolment_is_noop() {
        let enrolment_db = empty().append_query_results([Vec::<user_enrolment::Model>::new()]);
        let method = method_with(empty(), enrolment_db, empty(), SelfEnrolConfig::default());

        method
            .unenrol_user(&instance("i1", "c1"), "u1")
            .await
            .unwrap();
    }

    #[test]
    fn test_allow_unenrol_follows_config() {
        let ue = enrolment("ue1", "u1", "i1");
        let allowed = method_with(empty(), empty(), empty(), SelfEnrolConfig::default());
        assert!(allowed.allow_unenrol_user(&instance("i1", "c1"), &ue));

        let denied = method_with(
            empty(),
            empty(),
            empty(),
            SelfEnrolConfig {
                show_hint: false,
                allow_unenrol: false,
            },
        );
        assert!(!denied.allow_unenrol_user(&instance("i1", "c1"), &ue));
    }

    #[tokio::test]
    async fn test_settings_flags_misconfigured_instances() {
        let fine = instance("i1", "c1");
        let mut hinted_group = instance("i2", "c1");
        hinted_group.use_group_key = true;
        hinted_group.show_hint = Some(true);
        hinted_group.password = Some("k".to_string());
        let mut inverted = instance("i3", "c2");
        let now = chrono::Utc::now();
        inverted.enrol_start = Some(now);
        inverted.enrol_end = Some(now - Duration::days(1));

        let instance_db = empty().append_query_results([[fine, hinted_group, inverted]]);
        let method = method_with(instance_db, empty(), empty(), SelfEnrolConfig::default());

        let report = method.test_settings(true).await.unwrap();

        assert_eq!(report.method, "self");
        assert!(report.enabled);
        assert!(report.has_errors());
        let flagged: Vec<_> = report
            .checks
            .iter()
            .filter(|c| c.status != CheckStatus::Ok)
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(flagged, ["instance i2", "instance i3"]);
    }

    #[tokio::test]
    async fn test_settings_warns_when_disabled() {
        let instance_db = empty().append_query_results([Vec::<enrol_instance::Model>::new()]);
        let method = method_with(instance_db, empty(), empty(), SelfEnrolConfig::default());

        let report = method.test_settings(false).await.unwrap();

        assert_eq!(report.checks[0].status, CheckStatus::Warning);
        assert!(!report.has_errors());
    }
}

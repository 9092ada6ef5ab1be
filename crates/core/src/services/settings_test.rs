//! Admin page that runs an enrolment method's settings test.

use std::sync::Arc;

use enrol_common::{AppError, AppResult};
use serde::Serialize;
use tracing::info;

use crate::context::RequestContext;
use crate::enrol::{EnrolRegistry, SettingsReport, is_valid_method_name};

/// Where the page returns to.
pub const MANAGE_METHODS_URL: &str = "/admin/enrol/manage";

/// A method offered on the selection list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestableMethod {
    pub name: String,
    #[serde(rename = "displayName")]
    pub display_name: String,
}

/// What the page shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SettingsTestOutcome {
    /// No method chosen: pick one of these.
    Select { methods: Vec<TestableMethod> },
    /// The chosen method's test report.
    #[serde(rename_all = "camelCase")]
    Report {
        report: SettingsReport,
        continue_url: String,
    },
    /// Nothing to show; go back.
    #[serde(skip)]
    Redirect(String),
}

/// Runs settings tests for administrators.
#[derive(Clone)]
pub struct SettingsTestService {
    registry: Arc<EnrolRegistry>,
}

impl SettingsTestService {
    #[must_use]
    pub const fn new(registry: Arc<EnrolRegistry>) -> Self {
        Self { registry }
    }

    /// Handle one visit of the settings test page.
    ///
    /// Malformed or unknown method names count as no choice.
    pub async fn test_settings(
        &self,
        ctx: &RequestContext,
        enrol: Option<&str>,
    ) -> AppResult<SettingsTestOutcome> {
        if !ctx.is_admin() {
            return Err(AppError::Forbidden("admin only".to_string()));
        }

        let chosen = enrol
            .map(str::trim)
            .filter(|name| is_valid_method_name(name))
            .and_then(|name| self.registry.get(name));

        let Some(method) = chosen else {
            let methods: Vec<_> = self
                .registry
                .installed()
                .filter(|m| m.supports_settings_test())
                .map(|m| TestableMethod {
                    name: m.name().to_string(),
                    display_name: m.display_name().to_string(),
                })
                .collect();

            if methods.is_empty() {
                return Ok(SettingsTestOutcome::Redirect(MANAGE_METHODS_URL.to_string()));
            }
            return Ok(SettingsTestOutcome::Select { methods });
        };

        if !method.supports_settings_test() {
            return Ok(SettingsTestOutcome::Redirect(MANAGE_METHODS_URL.to_string()));
        }

        let report = method
            .test_settings(self.registry.is_enabled(method.name()))
            .await?;
        info!(
            admin_id = %ctx.user_id(),
            method = method.name(),
            errors = report.has_errors(),
            "Ran enrolment settings test"
        );

        Ok(SettingsTestOutcome::Report {
            report,
            continue_url: MANAGE_METHODS_URL.to_string(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::enrol::{ManualEnrolMethod, SelfEnrolMethod};
    use crate::test_support::{context, instance, mock_store, user};
    use enrol_common::config::SelfEnrolConfig;
    use enrol_db::repositories::EnrolInstanceRepository;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn empty() -> MockDatabase {
        MockDatabase::new(DatabaseBackend::Postgres)
    }

    fn admin() -> RequestContext {
        let mut u = user("admin");
        u.is_admin = true;
        context(u)
    }

    fn manual() -> Arc<ManualEnrolMethod> {
        Arc::new(ManualEnrolMethod::new(mock_store(empty(), empty())))
    }

    fn service(instance_db: MockDatabase, enabled: &[&str]) -> SettingsTestService {
        let self_method = SelfEnrolMethod::new(
            EnrolInstanceRepository::new(Arc::new(instance_db.into_connection())),
            mock_store(empty(), empty()),
            SelfEnrolConfig::default(),
        );
        let registry = EnrolRegistry::new(enabled.iter().map(ToString::to_string).collect())
            .with(Arc::new(self_method))
            .with(manual());
        SettingsTestService::new(Arc::new(registry))
    }

    #[tokio::test]
    async fn test_non_admin_is_forbidden() {
        let err = service(empty(), &["self"])
            .test_settings(&context(user("u1")), Some("self"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_no_choice_lists_testable_methods() {
        let outcome = service(empty(), &["self"])
            .test_settings(&admin(), None)
            .await
            .unwrap();

        let SettingsTestOutcome::Select { methods } = outcome else {
            panic!("expected selection, got {outcome:?}");
        };
        let names: Vec<_> = methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["self"]);
    }

    #[tokio::test]
    async fn test_unknown_and_malformed_names_fall_back_to_selection() {
        let svc = service(empty(), &["self"]);

        for name in ["nosuch", "../self", "Self", ""] {
            let outcome = svc.test_settings(&admin(), Some(name)).await.unwrap();
            assert!(
                matches!(outcome, SettingsTestOutcome::Select { .. }),
                "{name:?} gave {outcome:?}"
            );
        }
    }

    #[tokio::test]
    async fn test_method_without_test_redirects() {
        let outcome = service(empty(), &["self"])
            .test_settings(&admin(), Some("manual"))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            SettingsTestOutcome::Redirect("/admin/enrol/manage".to_string())
        );
    }

    #[tokio::test]
    async fn test_nothing_testable_redirects() {
        let registry = EnrolRegistry::new(vec!["manual".to_string()]).with(manual());
        let svc = SettingsTestService::new(Arc::new(registry));

        let outcome = svc.test_settings(&admin(), None).await.unwrap();

        assert!(matches!(outcome, SettingsTestOutcome::Redirect(_)));
    }

    #[tokio::test]
    async fn test_report_for_self_method() {
        let instance_db = empty().append_query_results([[instance("i1", "c1")]]);

        let outcome = service(instance_db, &["manual"])
            .test_settings(&admin(), Some("self"))
            .await
            .unwrap();

        let SettingsTestOutcome::Report { report, continue_url } = outcome else {
            panic!("expected report, got {outcome:?}");
        };
        assert_eq!(report.method, "self");
        assert!(!report.enabled);
        assert_eq!(continue_url, "/admin/enrol/manage");
    }
}

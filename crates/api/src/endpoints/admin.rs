//! Admin endpoints.

use axum::{
    Router,
    extract::{Query, State},
    routing::get,
};
use enrol_common::AppResult;
use enrol_core::SettingsTestOutcome;
use serde::Deserialize;

use crate::{
    extractors::Ctx,
    middleware::AppState,
    response::{ApiResponse, PageResponse},
};

/// Settings test query.
#[derive(Debug, Deserialize)]
pub struct TestSettingsQuery {
    /// Method tag to test.
    pub enrol: Option<String>,
}

/// Run an enrolment method's settings test.
async fn test_settings(
    Ctx(ctx): Ctx,
    State(state): State<AppState>,
    Query(query): Query<TestSettingsQuery>,
) -> AppResult<PageResponse<SettingsTestOutcome>> {
    let outcome = state
        .settings_test_service
        .test_settings(&ctx, query.enrol.as_deref())
        .await?;
    Ok(match outcome {
        SettingsTestOutcome::Redirect(to) => PageResponse::Redirect(to),
        page => PageResponse::Render(ApiResponse::ok(page)),
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/enrol/test-settings", get(test_settings))
}

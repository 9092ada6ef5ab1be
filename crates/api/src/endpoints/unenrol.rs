//! Unenrol confirmation page.

use axum::{
    Router,
    extract::{Query, State},
    routing::get,
};
use enrol_common::AppResult;
use enrol_core::{UnenrolConfirmation, UnenrolOutcome, UnenrolRequest};

use crate::{
    extractors::Ctx,
    middleware::AppState,
    response::{ApiResponse, PageResponse},
};

/// Show the confirmation, or unenrol and redirect once confirmed.
async fn unenrol_page(
    Ctx(ctx): Ctx,
    State(state): State<AppState>,
    Query(req): Query<UnenrolRequest>,
) -> AppResult<PageResponse<UnenrolConfirmation>> {
    let outcome = state.unenrolment_service.unenrol_page(&ctx, req).await?;
    Ok(match outcome {
        UnenrolOutcome::Confirm(page) => PageResponse::Render(ApiResponse::ok(page)),
        UnenrolOutcome::Redirect(to) => PageResponse::Redirect(to),
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/enrol/unenrol", get(unenrol_page))
}

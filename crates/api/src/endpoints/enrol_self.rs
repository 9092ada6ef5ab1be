//! Self enrolment web service endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use enrol_common::AppResult;
use enrol_core::EnrolUserInput;
use enrol_core::enrol::{EnrolInfo, EnrolmentResult, EnrolmentWarning};
use serde::Serialize;

use crate::{extractors::Ctx, middleware::AppState, response::ApiResponse};

/// Warning entry of an enrolment response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WarningResponse {
    pub item: String,
    pub item_id: String,
    pub warning_code: String,
    pub message: String,
}

impl From<EnrolmentWarning> for WarningResponse {
    fn from(w: EnrolmentWarning) -> Self {
        Self {
            item: w.item.to_string(),
            item_id: w.item_id,
            warning_code: w.code.as_str().to_string(),
            message: w.message,
        }
    }
}

/// Enrolment response.
#[derive(Serialize)]
pub struct EnrolResponse {
    pub status: bool,
    pub warnings: Vec<WarningResponse>,
}

impl From<EnrolmentResult> for EnrolResponse {
    fn from(r: EnrolmentResult) -> Self {
        Self {
            status: r.status,
            warnings: r.warnings.into_iter().map(Into::into).collect(),
        }
    }
}

/// Describe a self enrolment instance.
async fn instance_info(
    Ctx(ctx): Ctx,
    State(state): State<AppState>,
    Path(instance_id): Path<String>,
) -> AppResult<ApiResponse<EnrolInfo>> {
    let info = state
        .self_enrolment_service
        .instance_info(&ctx, &instance_id)
        .await?;
    Ok(ApiResponse::ok(info))
}

/// Enrol the calling user.
async fn enrol(
    Ctx(ctx): Ctx,
    State(state): State<AppState>,
    Json(req): Json<EnrolUserInput>,
) -> AppResult<ApiResponse<EnrolResponse>> {
    let result = state.self_enrolment_service.enrol_user(&ctx, req).await?;
    Ok(ApiResponse::ok(result.into()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/instances/{instance_id}", get(instance_info))
        .route("/enrol", post(enrol))
}

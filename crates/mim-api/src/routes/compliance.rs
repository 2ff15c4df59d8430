//! Probe-by-URL route

use crate::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use mim_core::{ComplianceResult, ComplianceStatus, RequestContext};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct ComplianceQuery {
    pub service_url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ComplianceResponse {
    pub service_url: String,
    pub status: ComplianceStatus,
    pub details: String,
}

impl From<ComplianceResult> for ComplianceResponse {
    fn from(result: ComplianceResult) -> Self {
        Self {
            service_url: result.target,
            status: result.status,
            details: result.details,
        }
    }
}

/// 200 compliant, 422 non-compliant, 400 unreachable
pub async fn check_service(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Query(query): Query<ComplianceQuery>,
) -> (StatusCode, Json<ComplianceResponse>) {
    info!(request_id = %ctx.request_id, "Checking service {}", query.service_url);

    let outcome = state
        .dispatcher
        .verify_service(&query.service_url, &ctx)
        .await;

    match outcome.into_result() {
        Ok(result) => {
            let code = match result.status {
                ComplianceStatus::Error => StatusCode::BAD_REQUEST,
                _ => StatusCode::OK,
            };
            (code, Json(result.into()))
        }
        Err(exception) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ComplianceResult::from(exception).into()),
        ),
    }
}

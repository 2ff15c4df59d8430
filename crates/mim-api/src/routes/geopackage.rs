//! Probe-by-artifact route

use crate::AppState;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Extension, Json,
};
use mim_core::{GeospatialCheckResult, RequestContext, VerificationRequest, Verdict};
use std::sync::Arc;
use tracing::{info, warn};

/// Multipart upload with a `file` field; verdict errors stay inside the 200 body
pub async fn check_geopackage(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    mut multipart: Multipart,
) -> Result<Json<GeospatialCheckResult>, StatusCode> {
    let mut file_data = Vec::new();
    let mut file_name = String::new();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        warn!(request_id = %ctx.request_id, "Malformed upload: {}", e);
        StatusCode::BAD_REQUEST
    })? {
        if field.name() == Some("file") {
            file_name = field.file_name().unwrap_or("upload.gpkg").to_string();
            file_data = field
                .bytes()
                .await
                .map_err(|_| StatusCode::BAD_REQUEST)?
                .to_vec();
        }
    }

    if file_data.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    info!(
        request_id = %ctx.request_id,
        "Checking GeoPackage {} ({} bytes)",
        file_name,
        file_data.len()
    );

    match state
        .dispatcher
        .dispatch(VerificationRequest::Artifact(file_data), &ctx)
        .await
    {
        Verdict::Artifact(result) => Ok(Json(result)),
        Verdict::Service(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

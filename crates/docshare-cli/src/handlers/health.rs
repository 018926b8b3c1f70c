//! Health check handler

use crate::AppState;
use axum::{extract::State, Json};
use docshare_storage::BackendKind;
use serde::Serialize;
use std::sync::Arc;

/// Health response body
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub storage: BackendKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s3_bucket: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s3_status: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s3_error: Option<String>,
}

/// GET /api/health - Service and backend status
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let health = state.service.health().await;

    let mut response = HealthResponse {
        status: "healthy",
        storage: health.kind,
        s3_bucket: None,
        s3_status: None,
        s3_error: None,
    };

    if health.kind == BackendKind::S3 {
        if health.connected {
            response.s3_bucket = health.bucket;
            response.s3_status = Some("connected");
        } else {
            response.s3_status = Some("error");
            response.s3_error = health.error;
        }
    }

    Json(response)
}

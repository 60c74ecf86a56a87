//! Health check handlers.

use std::time::Instant;

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use snapclean_models::ProviderMode;

use crate::state::AppState;

/// Health response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}

/// Health check endpoint (liveness probe).
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Readiness check response.
#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub mode: ProviderMode,
    pub checks: ReadinessChecks,
}

#[derive(Serialize)]
pub struct ReadinessChecks {
    pub inference: CheckStatus,
}

#[derive(Serialize)]
pub struct CheckStatus {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

impl CheckStatus {
    fn ok(latency_ms: u64) -> Self {
        Self {
            status: "ok".to_string(),
            error: None,
            latency_ms: Some(latency_ms),
        }
    }

    fn error(msg: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            error: Some(msg.into()),
            latency_ms: None,
        }
    }
}

/// Readiness check endpoint (readiness probe).
///
/// An unreachable live provider degrades the service to demo answers but
/// never makes it unready.
pub async fn ready(State(state): State<AppState>) -> Json<ReadinessResponse> {
    let start = Instant::now();
    let inference = if state.detection.provider().health_check().await {
        CheckStatus::ok(start.elapsed().as_millis() as u64)
    } else {
        CheckStatus::error("inference provider unreachable; serving demo results")
    };

    let status = if inference.status == "ok" {
        "ready"
    } else {
        "degraded"
    };

    Json(ReadinessResponse {
        status: status.to_string(),
        mode: state.mode(),
        checks: ReadinessChecks { inference },
    })
}

//! Health check handlers

use axum::{extract::State, Json};
use serde::Serialize;
use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Serialize)]
pub struct ReadyResponse {
    pub status: String,
    pub checks: HealthChecks,
}

#[derive(Serialize)]
pub struct HealthChecks {
    pub account_store: CheckResult,
    pub paper_data: CheckResult,
}

#[derive(Serialize)]
pub struct CheckResult {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl CheckResult {
    fn up(latency_ms: Option<u64>, detail: Option<String>) -> Self {
        Self { status: "up".to_string(), latency_ms, detail }
    }

    fn down(detail: String) -> Self {
        Self { status: "down".to_string(), latency_ms: None, detail: Some(detail) }
    }

    fn is_up(&self) -> bool {
        self.status == "up"
    }
}

/// Liveness probe - always returns healthy if server is running
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: papercompass_common::VERSION.to_string(),
    })
}

/// Readiness probe - account store reachable and paper data present
pub async fn ready(State(state): State<AppState>) -> Json<ReadyResponse> {
    let start = std::time::Instant::now();

    let account_store = match state.repo.ping().await {
        Ok(_) => CheckResult::up(Some(start.elapsed().as_millis() as u64), None),
        Err(e) => CheckResult::down(e.to_string()),
    };

    let paper_data = match state.engine.conferences().await {
        Ok(conferences) if !conferences.is_empty() => {
            let cached = state.engine.cache().len().await;
            CheckResult::up(None, Some(format!("{} conferences, {} cached", conferences.len(), cached)))
        }
        Ok(_) => CheckResult::down("no conference directories".to_string()),
        Err(e) => CheckResult::down(e.to_string()),
    };

    let all_healthy = account_store.is_up() && paper_data.is_up();

    Json(ReadyResponse {
        status: if all_healthy { "ready" } else { "not_ready" }.to_string(),
        checks: HealthChecks { account_store, paper_data },
    })
}

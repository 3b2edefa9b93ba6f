use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;
use storefront_artifacts::{ArtifactKind, ArtifactOutcome, ArtifactStatus, LoadReport};

#[derive(Clone)]
pub struct HealthState {
    report: Arc<LoadReport>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub name: &'static str,
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub artifacts: Vec<HealthCheck>,
    pub loaded_at: String,
    pub checked_at: String,
}

pub fn router(report: Arc<LoadReport>) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { report })
}

/// Ready once the catalog is loaded: every fallback chain ends in catalog
/// popularity. Other missing artifacts only degrade personalization.
pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let artifacts: Vec<HealthCheck> = state.report.outcomes.iter().map(artifact_check).collect();
    let catalog_ready = state.report.is_loaded(ArtifactKind::Catalog);
    let status = match (catalog_ready, state.report.all_loaded()) {
        (true, true) => "ready",
        (true, false) => "degraded",
        (false, _) => "unavailable",
    };

    let payload = HealthResponse {
        status,
        artifacts,
        loaded_at: state.report.loaded_at.to_rfc3339(),
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if catalog_ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

fn artifact_check(outcome: &ArtifactOutcome) -> HealthCheck {
    let (status, detail) = match &outcome.status {
        ArtifactStatus::Loaded { records } => ("ready", format!("{records} records")),
        ArtifactStatus::Missing => ("missing", format!("{} not found", outcome.path.display())),
        ArtifactStatus::Failed { error } => ("failed", error.clone()),
    };
    HealthCheck { name: outcome.kind.as_str(), status, detail }
}

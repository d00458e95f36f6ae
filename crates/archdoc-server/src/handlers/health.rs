//! Health endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;

use crate::services::HealthReport;
use crate::state::AppState;

/// Handle GET /health.
///
/// Always answers 200; degradation is reported in the body.
pub(crate) async fn health(State(state): State<Arc<AppState>>) -> Json<HealthReport> {
    Json(state.health().await)
}

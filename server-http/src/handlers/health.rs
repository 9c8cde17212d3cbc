use crate::api::HealthResponse;
use crate::state::AppState;
use axum::{Json, extract::State};

/// GET /health
///
/// Always 200; dependency trouble shows up in the body only.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(state.health.check().await.into())
}

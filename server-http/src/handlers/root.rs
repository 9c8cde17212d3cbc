use crate::api::BannerResponse;
use crate::error::ApiError;
use crate::state::AppState;
use axum::{Json, extract::State};

/// GET /
pub async fn banner(State(state): State<AppState>) -> Json<BannerResponse> {
    Json(BannerResponse {
        framework: "axum",
        language: "Rust",
        message: format!("Hello from {}!", state.service_name),
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn route_not_found() -> ApiError {
    ApiError::RouteNotFound
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

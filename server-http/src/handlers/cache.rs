use crate::api::{CacheSetResponse, CacheValueResponse};
use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, State, rejection::PathRejection},
};
use tracing::info;
use waypoint::CacheLookup;

/// GET /api/cache/{key}
pub async fn get_value(
    State(state): State<AppState>,
    key: Result<Path<String>, PathRejection>,
) -> Result<Json<CacheValueResponse>, ApiError> {
    let Path(key) = key?;
    info!("GET: key={}", key);

    match state.gateway.get(&key).await? {
        CacheLookup::Found(value) => Ok(Json(CacheValueResponse { key, value })),
        CacheLookup::NotFound => Err(ApiError::KeyNotFound),
    }
}

/// POST /api/cache/{key}/{value}
///
/// Stores the value for one hour.
pub async fn set_value(
    State(state): State<AppState>,
    params: Result<Path<(String, String)>, PathRejection>,
) -> Result<Json<CacheSetResponse>, ApiError> {
    let Path((key, value)) = params?;
    info!("SET: key={}", key);

    state.gateway.set_default_ttl(&key, &value).await?;

    Ok(Json(CacheSetResponse {
        key,
        message: "Cache set successfully",
        value,
    }))
}

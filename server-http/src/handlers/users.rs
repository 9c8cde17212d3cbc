use crate::api::{ListUsersResponse, UserCreatedResponse, UserSummary};
use crate::error::ApiError;
use axum::{Json, extract::rejection::JsonRejection, http::StatusCode};
use serde_json::Value;
use tracing::info;

const DEMO_USERS: [UserSummary; 2] = [
    UserSummary {
        email: "john@example.com",
        id: 1,
        name: "John Doe",
    },
    UserSummary {
        email: "jane@example.com",
        id: 2,
        name: "Jane Smith",
    },
];

/// GET /api/users
pub async fn list_users() -> Json<ListUsersResponse> {
    Json(ListUsersResponse {
        users: DEMO_USERS.to_vec(),
    })
}

/// POST /api/users
///
/// Echoes the submitted user back. Nothing is stored.
pub async fn create_user(
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<UserCreatedResponse>), ApiError> {
    let Json(user) = body?;
    info!("Create user (not persisted)");

    Ok((
        StatusCode::CREATED,
        Json(UserCreatedResponse {
            message: "User created successfully",
            user,
        }),
    ))
}

use serde::Serialize;
use serde_json::Value;
use waypoint::HealthReport;

// Keep fields in alphabetical order; clients see them serialized that way.

#[derive(Debug, Serialize)]
pub struct BannerResponse {
    pub framework: &'static str,
    pub language: &'static str,
    pub message: String,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub database: &'static str,
    pub redis: &'static str,
    pub service: String,
    pub status: &'static str,
}

impl From<HealthReport> for HealthResponse {
    fn from(report: HealthReport) -> Self {
        Self {
            database: report.database.as_str(),
            redis: report.redis.as_str(),
            service: report.service,
            status: report.status.as_str(),
        }
    }
}

// === Cache Operation Models ===

#[derive(Debug, Serialize)]
pub struct CacheValueResponse {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Serialize)]
pub struct CacheSetResponse {
    pub key: String,
    pub message: &'static str,
    pub value: String,
}

// === User Models ===

#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub email: &'static str,
    pub id: u32,
    pub name: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ListUsersResponse {
    pub users: Vec<UserSummary>,
}

#[derive(Debug, Serialize)]
pub struct UserCreatedResponse {
    pub message: &'static str,
    pub user: Value,
}

// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

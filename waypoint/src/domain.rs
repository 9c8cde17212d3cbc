/// Result of reading a key from the cache store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CacheLookup {
    Found(String),
    NotFound,
}

impl CacheLookup {
    pub fn is_found(&self) -> bool {
        matches!(self, CacheLookup::Found(_))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Unhealthy => "unhealthy",
        }
    }

    pub fn from_probe<E>(outcome: &Result<(), E>) -> Self {
        match outcome {
            Ok(()) => HealthStatus::Healthy,
            Err(_) => HealthStatus::Unhealthy,
        }
    }
}

/// Outcome of one health check.
///
/// `status` is always [`HealthStatus::Healthy`], whatever `database` and
/// `redis` say.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub database: HealthStatus,
    pub redis: HealthStatus,
    pub service: String,
}

impl HealthReport {
    pub fn dependencies_healthy(&self) -> bool {
        self.database == HealthStatus::Healthy && self.redis == HealthStatus::Healthy
    }
}

use crate::connection::ConnectionFactory;
use crate::domain::{HealthReport, HealthStatus};
use shared::ConnectionError;
use tracing::warn;

/// Probes the relational and cache stores and folds the results into a
/// [`HealthReport`].
///
/// Both probes run concurrently on every check. A failing probe only marks
/// its own dependency unhealthy.
#[derive(Clone, Debug)]
pub struct HealthAggregator {
    connections: ConnectionFactory,
    service: String,
}

impl HealthAggregator {
    pub fn new(connections: ConnectionFactory, service: impl Into<String>) -> Self {
        Self {
            connections,
            service: service.into(),
        }
    }

    pub async fn check(&self) -> HealthReport {
        let (relational, cache) = tokio::join!(self.probe_relational(), self.probe_cache());

        if let Err(e) = &relational {
            warn!("Relational store probe failed: {}", e);
        }
        if let Err(e) = &cache {
            warn!("Cache store probe failed: {}", e);
        }

        let report = self.aggregate(
            HealthStatus::from_probe(&relational),
            HealthStatus::from_probe(&cache),
        );
        if !report.dependencies_healthy() {
            warn!(
                "Degraded: database={}, redis={}",
                report.database.as_str(),
                report.redis.as_str()
            );
        }
        report
    }

    /// Opening a session is enough; it is closed straight away.
    pub async fn probe_relational(&self) -> Result<(), ConnectionError> {
        let mut handle = self.connections.open_relational().await?;
        ConnectionFactory::close(&mut *handle).await;
        Ok(())
    }

    /// Open a session and ping it.
    pub async fn probe_cache(&self) -> Result<(), ConnectionError> {
        let mut handle = self.connections.open_cache().await?;
        let pong = handle.ping().await;
        ConnectionFactory::close(&mut *handle).await;
        pong
    }

    pub fn aggregate(&self, relational: HealthStatus, cache: HealthStatus) -> HealthReport {
        HealthReport {
            status: HealthStatus::Healthy,
            database: relational,
            redis: cache,
            service: self.service.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{CacheConnector, CacheHandle, RelationalConnector, RelationalHandle};
    use crate::testing::{FakeCacheConnector, FakeRelationalConnector};
    use async_trait::async_trait;
    use shared::{ConnectionErrorKind, Store};
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    fn aggregator(
        relational: &FakeRelationalConnector,
        cache: &FakeCacheConnector,
    ) -> HealthAggregator {
        HealthAggregator::new(
            ConnectionFactory::new(Arc::new(relational.clone()), Arc::new(cache.clone())),
            "python-api",
        )
    }

    #[tokio::test]
    async fn test_all_healthy() {
        let relational = FakeRelationalConnector::reachable();
        let cache = FakeCacheConnector::reachable();

        let report = aggregator(&relational, &cache).check().await;

        assert_eq!(report.status, HealthStatus::Healthy);
        assert_eq!(report.database, HealthStatus::Healthy);
        assert_eq!(report.redis, HealthStatus::Healthy);
        assert_eq!(report.service, "python-api");
        assert!(report.dependencies_healthy());
        assert_eq!(relational.close_count(), 1);
        assert_eq!(cache.close_count(), 1);
    }

    #[tokio::test]
    async fn test_relational_down_leaves_cache_healthy() {
        let relational = FakeRelationalConnector::unreachable();
        let cache = FakeCacheConnector::reachable();

        let report = aggregator(&relational, &cache).check().await;

        assert_eq!(report.database, HealthStatus::Unhealthy);
        assert_eq!(report.redis, HealthStatus::Healthy);
        assert_eq!(cache.open_count(), 1);
    }

    #[tokio::test]
    async fn test_cache_down_leaves_relational_healthy() {
        let relational = FakeRelationalConnector::reachable();
        let cache = FakeCacheConnector::unreachable();

        let report = aggregator(&relational, &cache).check().await;

        assert_eq!(report.database, HealthStatus::Healthy);
        assert_eq!(report.redis, HealthStatus::Unhealthy);
        assert_eq!(relational.open_count(), 1);
    }

    #[tokio::test]
    async fn test_both_down_still_reports_healthy_status() {
        let relational = FakeRelationalConnector::unreachable();
        let cache = FakeCacheConnector::unreachable();

        let report = aggregator(&relational, &cache).check().await;

        assert_eq!(report.status, HealthStatus::Healthy);
        assert_eq!(report.database, HealthStatus::Unhealthy);
        assert_eq!(report.redis, HealthStatus::Unhealthy);
        assert!(!report.dependencies_healthy());
    }

    #[tokio::test]
    async fn test_failed_ping_is_unhealthy_and_closes() {
        let relational = FakeRelationalConnector::reachable();
        let cache = FakeCacheConnector::reachable().with_failing_commands();
        let health = aggregator(&relational, &cache);

        let probe = health.probe_cache().await;
        assert_eq!(probe.unwrap_err().kind(), ConnectionErrorKind::Protocol);
        assert_eq!(cache.close_count(), 1);

        let report = health.check().await;
        assert_eq!(report.redis, HealthStatus::Unhealthy);
        assert_eq!(report.database, HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn test_failed_close_keeps_probe_healthy() {
        let relational = FakeRelationalConnector::reachable().with_failing_close();
        let cache = FakeCacheConnector::reachable().with_failing_close();
        let health = aggregator(&relational, &cache);

        assert!(health.probe_relational().await.is_ok());

        let report = health.check().await;
        assert_eq!(report.database, HealthStatus::Healthy);
        assert_eq!(report.redis, HealthStatus::Healthy);
        assert_eq!(relational.close_count(), 2);
        assert_eq!(cache.close_count(), 1);
    }

    #[tokio::test]
    async fn test_probe_reports_failure_kind() {
        let relational = FakeRelationalConnector::failing(ConnectionErrorKind::Authentication);
        let cache = FakeCacheConnector::reachable();

        let err = aggregator(&relational, &cache)
            .probe_relational()
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ConnectionErrorKind::Authentication);
        assert_eq!(err.store, Store::Relational);
    }

    struct SlowRelational(Duration);

    #[async_trait]
    impl RelationalConnector for SlowRelational {
        async fn connect(&self) -> Result<Box<dyn RelationalHandle>, ConnectionError> {
            tokio::time::sleep(self.0).await;
            Err(ConnectionError::new(
                Store::Relational,
                ConnectionErrorKind::Timeout,
                "connect timed out",
            ))
        }
    }

    struct SlowCache(Duration);

    #[async_trait]
    impl CacheConnector for SlowCache {
        async fn connect(&self) -> Result<Box<dyn CacheHandle>, ConnectionError> {
            tokio::time::sleep(self.0).await;
            Err(ConnectionError::new(
                Store::Cache,
                ConnectionErrorKind::Timeout,
                "connect timed out",
            ))
        }
    }

    #[tokio::test]
    async fn test_probes_run_concurrently() {
        let delay = Duration::from_millis(300);
        let health = HealthAggregator::new(
            ConnectionFactory::new(Arc::new(SlowRelational(delay)), Arc::new(SlowCache(delay))),
            "python-api",
        );

        let started = Instant::now();
        let report = health.check().await;

        assert_eq!(report.database, HealthStatus::Unhealthy);
        assert_eq!(report.redis, HealthStatus::Unhealthy);
        assert!(started.elapsed() < delay * 2);
    }
}

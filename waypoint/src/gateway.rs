use crate::connection::ConnectionFactory;
use crate::domain::CacheLookup;
use shared::{Error, Result, TtlSecs};
use tracing::{debug, warn};

/// Get and set-with-expiry against the cache store.
///
/// Every call opens its own handle and closes it before returning, whatever
/// the outcome. Store failures come back as [`Error::BackendUnavailable`] and
/// are never retried.
#[derive(Clone, Debug)]
pub struct CacheGateway {
    connections: ConnectionFactory,
}

impl CacheGateway {
    pub fn new(connections: ConnectionFactory) -> Self {
        Self { connections }
    }

    pub async fn get(&self, key: &str) -> Result<CacheLookup> {
        require_non_empty("key", key)?;

        let mut handle = self.connections.open_cache().await.map_err(|e| {
            warn!("GET {}: {}", key, e);
            Error::BackendUnavailable(e)
        })?;
        let result = handle.get(key).await;
        ConnectionFactory::close(&mut *handle).await;

        match result {
            Ok(Some(value)) => {
                debug!("GET {}: hit", key);
                Ok(CacheLookup::Found(value))
            }
            Ok(None) => {
                debug!("GET {}: miss", key);
                Ok(CacheLookup::NotFound)
            }
            Err(e) => {
                warn!("GET {}: {}", key, e);
                Err(Error::BackendUnavailable(e))
            }
        }
    }

    /// Write with the default one hour expiry.
    pub async fn set_default_ttl(&self, key: &str, value: &str) -> Result<()> {
        self.set(key, value, TtlSecs::DEFAULT).await
    }

    /// Unconditionally overwrite `key`, restarting its expiry window.
    pub async fn set(&self, key: &str, value: &str, ttl: TtlSecs) -> Result<()> {
        require_non_empty("key", key)?;
        require_non_empty("value", value)?;
        if ttl.0 == 0 {
            return Err(Error::InvalidInput("ttl must be positive".to_string()));
        }

        let mut handle = self.connections.open_cache().await.map_err(|e| {
            warn!("SET {}: {}", key, e);
            Error::BackendUnavailable(e)
        })?;
        let result = handle.set_ex(key, value, ttl).await;
        ConnectionFactory::close(&mut *handle).await;

        result.map_err(|e| {
            warn!("SET {}: {}", key, e);
            Error::BackendUnavailable(e)
        })?;
        debug!("SET {} (ttl {}s)", key, ttl.0);
        Ok(())
    }
}

fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::InvalidInput(format!("{field} must not be empty")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeCacheConnector, FakeRelationalConnector};
    use shared::ConnectionErrorKind;
    use std::sync::Arc;
    use tokio::time::{Duration, sleep};

    fn gateway(cache: &FakeCacheConnector) -> CacheGateway {
        CacheGateway::new(ConnectionFactory::new(
            Arc::new(FakeRelationalConnector::reachable()),
            Arc::new(cache.clone()),
        ))
    }

    #[tokio::test]
    async fn test_get_unwritten_key_is_not_found() {
        let cache = FakeCacheConnector::reachable();
        let gateway = gateway(&cache);

        let result = gateway.get("never-written").await.unwrap();
        assert_eq!(result, CacheLookup::NotFound);
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let cache = FakeCacheConnector::reachable();
        let gateway = gateway(&cache);

        gateway.set_default_ttl("foo", "bar").await.unwrap();

        let result = gateway.get("foo").await.unwrap();
        assert_eq!(result, CacheLookup::Found("bar".to_string()));
        assert_eq!(cache.last_ttl("foo"), Some(TtlSecs(3600)));
    }

    #[tokio::test]
    async fn test_last_write_wins() {
        let cache = FakeCacheConnector::reachable();
        let gateway = gateway(&cache);

        gateway.set("k", "v1", TtlSecs(60)).await.unwrap();
        gateway.set("k", "v2", TtlSecs(3600)).await.unwrap();

        assert_eq!(
            gateway.get("k").await.unwrap(),
            CacheLookup::Found("v2".to_string())
        );
        assert_eq!(cache.last_ttl("k"), Some(TtlSecs(3600)));
    }

    #[tokio::test]
    async fn test_entry_expires_after_ttl() {
        let cache = FakeCacheConnector::reachable();
        let gateway = gateway(&cache);

        gateway.set("short", "lived", TtlSecs(1)).await.unwrap();
        assert!(gateway.get("short").await.unwrap().is_found());

        sleep(Duration::from_millis(1100)).await;

        assert_eq!(gateway.get("short").await.unwrap(), CacheLookup::NotFound);
    }

    #[tokio::test]
    async fn test_unreachable_store_is_backend_unavailable() {
        let cache = FakeCacheConnector::unreachable();
        let gateway = gateway(&cache);

        let get = gateway.get("foo").await;
        assert!(matches!(
            get,
            Err(Error::BackendUnavailable(ref e)) if e.kind() == ConnectionErrorKind::Unreachable
        ));

        let set = gateway.set_default_ttl("foo", "bar").await;
        assert!(matches!(set, Err(Error::BackendUnavailable(_))));

        // Nothing was opened, so nothing to close
        assert_eq!(cache.close_count(), 0);
    }

    #[tokio::test]
    async fn test_command_failure_is_backend_unavailable_and_closes() {
        let cache = FakeCacheConnector::reachable().with_failing_commands();
        let gateway = gateway(&cache);

        assert!(matches!(
            gateway.get("foo").await,
            Err(Error::BackendUnavailable(ref e)) if e.kind() == ConnectionErrorKind::Protocol
        ));
        assert!(matches!(
            gateway.set_default_ttl("foo", "bar").await,
            Err(Error::BackendUnavailable(_))
        ));
        assert_eq!(cache.open_count(), 2);
        assert_eq!(cache.close_count(), 2);
    }

    #[tokio::test]
    async fn test_handle_closed_on_hit_and_miss() {
        let cache = FakeCacheConnector::reachable();
        let gateway = gateway(&cache);

        gateway.set_default_ttl("foo", "bar").await.unwrap();
        gateway.get("foo").await.unwrap();
        gateway.get("missing").await.unwrap();

        assert_eq!(cache.open_count(), 3);
        assert_eq!(cache.close_count(), 3);
    }

    #[tokio::test]
    async fn test_failed_close_does_not_mask_result() {
        let cache = FakeCacheConnector::reachable().with_failing_close();
        let gateway = gateway(&cache);

        gateway.set_default_ttl("foo", "bar").await.unwrap();
        assert_eq!(
            gateway.get("foo").await.unwrap(),
            CacheLookup::Found("bar".to_string())
        );
    }

    #[tokio::test]
    async fn test_invalid_input_is_rejected_before_connecting() {
        let cache = FakeCacheConnector::reachable();
        let gateway = gateway(&cache);

        assert!(matches!(gateway.get("").await, Err(Error::InvalidInput(_))));
        assert!(matches!(
            gateway.set_default_ttl("k", "").await,
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            gateway.set("k", "v", TtlSecs(0)).await,
            Err(Error::InvalidInput(_))
        ));
        assert_eq!(cache.open_count(), 0);
    }
}

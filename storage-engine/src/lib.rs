mod moka_cache;
mod postgres_store;
mod redis_store;

pub use moka_cache::MokaConnector;
pub use postgres_store::{PostgresConnector, PostgresHandle};
pub use redis_store::{RedisConnector, RedisHandle};

use shared::config::{CacheBackend, Config};
use std::sync::Arc;
use waypoint::ConnectionFactory;
use waypoint::ports::CacheConnector;

/// Wire up the connectors selected by `config`.
pub fn connection_factory(config: &Config) -> ConnectionFactory {
    let relational = Arc::new(PostgresConnector::new(config.relational.clone()));

    let cache: Arc<dyn CacheConnector> = match config.cache_backend {
        CacheBackend::Redis => {
            tracing::info!(
                "Cache store: redis at {}:{}",
                config.cache.host,
                config.cache.port
            );
            Arc::new(RedisConnector::new(config.cache.clone()))
        }
        CacheBackend::Memory => {
            tracing::warn!("Cache store: in-memory, entries are lost on restart");
            Arc::new(MokaConnector::new(config.memory_max_entries))
        }
    };

    ConnectionFactory::new(relational, cache)
}

#[cfg(test)]
mod tests {
    use super::*;
    use waypoint::{CacheGateway, CacheLookup};

    #[tokio::test]
    async fn test_memory_backend_round_trip() {
        let config = Config::from_lookup(|key| match key {
            "CACHE_BACKEND" => Some("memory".to_string()),
            _ => None,
        });
        let gateway = CacheGateway::new(connection_factory(&config));

        gateway.set_default_ttl("foo", "bar").await.unwrap();

        assert_eq!(
            gateway.get("foo").await.unwrap(),
            CacheLookup::Found("bar".to_string())
        );
        assert_eq!(gateway.get("missing").await.unwrap(), CacheLookup::NotFound);
    }
}

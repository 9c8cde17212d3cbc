use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache;
use shared::{ConnectionError, ConnectionErrorKind, Store, TtlSecs};
use std::fmt::Debug;
use std::time::{Duration, Instant};
use waypoint::ports::{CacheConnector, CacheHandle, ConnectionHandle};

#[derive(Clone, Debug)]
struct Entry {
    value: String,
    ttl: Duration,
}

/// Every write restarts the entry's own TTL; reads leave it alone.
struct PerEntryTtl;

impl Expiry<String, Entry> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &Entry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Moka-backed in-process cache store with per-entry TTL.
/// Stands in for Redis when no external cache store is available.
#[derive(Clone)]
pub struct MokaConnector {
    cache: Cache<String, Entry>,
}

impl MokaConnector {
    /// Create a store, optionally bounded to `max_entries`
    pub fn new(max_entries: Option<u64>) -> Self {
        let mut builder = Cache::builder().name("waypoint-memory").expire_after(PerEntryTtl);

        if let Some(capacity) = max_entries {
            builder = builder.max_capacity(capacity);
        }

        Self {
            cache: builder.build(),
        }
    }
}

impl Default for MokaConnector {
    fn default() -> Self {
        Self::new(None)
    }
}

#[async_trait]
impl CacheConnector for MokaConnector {
    async fn connect(&self) -> Result<Box<dyn CacheHandle>, ConnectionError> {
        Ok(Box::new(MokaHandle {
            cache: Some(self.cache.clone()),
        }))
    }
}

impl Debug for MokaConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaConnector")
            .field("entry_count", &self.cache.entry_count())
            .field("weighted_size", &self.cache.weighted_size())
            .finish()
    }
}

struct MokaHandle {
    cache: Option<Cache<String, Entry>>,
}

impl MokaHandle {
    fn cache(&self) -> Result<&Cache<String, Entry>, ConnectionError> {
        self.cache.as_ref().ok_or_else(|| {
            ConnectionError::new(
                Store::Cache,
                ConnectionErrorKind::Protocol,
                "handle already closed",
            )
        })
    }
}

#[async_trait]
impl ConnectionHandle for MokaHandle {
    async fn close(&mut self) -> Result<(), ConnectionError> {
        self.cache = None;
        Ok(())
    }
}

#[async_trait]
impl CacheHandle for MokaHandle {
    async fn get(&mut self, key: &str) -> Result<Option<String>, ConnectionError> {
        // Expired entries read as absent even before moka evicts them
        Ok(self.cache()?.get(key).await.map(|entry| entry.value))
    }

    async fn set_ex(
        &mut self,
        key: &str,
        value: &str,
        ttl: TtlSecs,
    ) -> Result<(), ConnectionError> {
        let entry = Entry {
            value: value.to_string(),
            ttl: ttl.as_duration(),
        };
        self.cache()?.insert(key.to_string(), entry).await;
        Ok(())
    }

    async fn ping(&mut self) -> Result<(), ConnectionError> {
        self.cache().map(|_| ())
    }
}

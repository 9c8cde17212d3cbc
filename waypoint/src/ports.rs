#![deny(clippy::all)]

use async_trait::async_trait;
use shared::{ConnectionError, TtlSecs};

// Ports are the pluggable extension points for the backing stores

/// An open session to a backing store, owned by exactly one operation.
#[async_trait]
pub trait ConnectionHandle: Send {
    /// Release the session. Calling it again after a close is a no-op.
    async fn close(&mut self) -> Result<(), ConnectionError>;
}

/// Session to the relational store. Only its reachability matters here.
pub trait RelationalHandle: ConnectionHandle {}

/// Session to the cache store
#[async_trait]
pub trait CacheHandle: ConnectionHandle {
    async fn get(&mut self, key: &str) -> Result<Option<String>, ConnectionError>;

    /// Write `value` under `key`, replacing any previous value and expiry.
    async fn set_ex(&mut self, key: &str, value: &str, ttl: TtlSecs)
    -> Result<(), ConnectionError>;

    /// Liveness round-trip
    async fn ping(&mut self) -> Result<(), ConnectionError>;
}

/// Opens sessions to the relational store
#[async_trait]
pub trait RelationalConnector: Send + Sync + 'static {
    async fn connect(&self) -> Result<Box<dyn RelationalHandle>, ConnectionError>;
}

/// Opens sessions to the cache store
#[async_trait]
pub trait CacheConnector: Send + Sync + 'static {
    async fn connect(&self) -> Result<Box<dyn CacheHandle>, ConnectionError>;
}

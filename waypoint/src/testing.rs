//! In-process stand-ins for the backing stores.
//!
//! Each fake counts the handles it opens and closes so tests can check that
//! no session outlives its operation.

use crate::ports::{
    CacheConnector, CacheHandle, ConnectionHandle, RelationalConnector, RelationalHandle,
};
use async_trait::async_trait;
use shared::{ConnectionError, ConnectionErrorKind, Store, TtlSecs};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

#[derive(Default)]
struct Counters {
    opened: AtomicUsize,
    closed: AtomicUsize,
}

#[derive(Clone, Debug)]
struct StoredValue {
    value: String,
    ttl: TtlSecs,
    expires_at: Instant,
}

#[derive(Clone, Default)]
pub struct FakeCacheConnector {
    entries: Arc<Mutex<HashMap<String, StoredValue>>>,
    counters: Arc<Counters>,
    unreachable: bool,
    failing_commands: bool,
    failing_close: bool,
}

impl FakeCacheConnector {
    pub fn reachable() -> Self {
        Self::default()
    }

    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::default()
        }
    }

    /// Connects fine, then fails every get, set and ping.
    pub fn with_failing_commands(mut self) -> Self {
        self.failing_commands = true;
        self
    }

    pub fn with_failing_close(mut self) -> Self {
        self.failing_close = true;
        self
    }

    pub fn open_count(&self) -> usize {
        self.counters.opened.load(Ordering::SeqCst)
    }

    pub fn close_count(&self) -> usize {
        self.counters.closed.load(Ordering::SeqCst)
    }

    /// TTL of the most recent write to `key`, expired or not.
    pub fn last_ttl(&self, key: &str) -> Option<TtlSecs> {
        self.entries
            .lock()
            .ok()
            .and_then(|entries| entries.get(key).map(|stored| stored.ttl))
    }
}

#[async_trait]
impl CacheConnector for FakeCacheConnector {
    async fn connect(&self) -> Result<Box<dyn CacheHandle>, ConnectionError> {
        if self.unreachable {
            return Err(ConnectionError::new(
                Store::Cache,
                ConnectionErrorKind::Unreachable,
                "connection refused",
            ));
        }
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeCacheHandle {
            connector: self.clone(),
            open: true,
        }))
    }
}

struct FakeCacheHandle {
    connector: FakeCacheConnector,
    open: bool,
}

impl FakeCacheHandle {
    fn check(&self) -> Result<(), ConnectionError> {
        if !self.open {
            return Err(ConnectionError::new(
                Store::Cache,
                ConnectionErrorKind::Protocol,
                "handle already closed",
            ));
        }
        if self.connector.failing_commands {
            return Err(ConnectionError::new(
                Store::Cache,
                ConnectionErrorKind::Protocol,
                "broken pipe",
            ));
        }
        Ok(())
    }

    fn entries(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<String, StoredValue>>, ConnectionError> {
        self.connector.entries.lock().map_err(|_| {
            ConnectionError::new(Store::Cache, ConnectionErrorKind::Protocol, "poisoned")
        })
    }
}

#[async_trait]
impl ConnectionHandle for FakeCacheHandle {
    async fn close(&mut self) -> Result<(), ConnectionError> {
        if !self.open {
            return Ok(());
        }
        self.open = false;
        self.connector.counters.closed.fetch_add(1, Ordering::SeqCst);
        if self.connector.failing_close {
            return Err(ConnectionError::new(
                Store::Cache,
                ConnectionErrorKind::Unreachable,
                "reset by peer during close",
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl CacheHandle for FakeCacheHandle {
    async fn get(&mut self, key: &str) -> Result<Option<String>, ConnectionError> {
        self.check()?;
        let entries = self.entries()?;
        Ok(entries
            .get(key)
            .filter(|stored| stored.expires_at > Instant::now())
            .map(|stored| stored.value.clone()))
    }

    async fn set_ex(
        &mut self,
        key: &str,
        value: &str,
        ttl: TtlSecs,
    ) -> Result<(), ConnectionError> {
        self.check()?;
        let mut entries = self.entries()?;
        entries.insert(
            key.to_string(),
            StoredValue {
                value: value.to_string(),
                ttl,
                expires_at: Instant::now() + ttl.as_duration(),
            },
        );
        Ok(())
    }

    async fn ping(&mut self) -> Result<(), ConnectionError> {
        self.check()
    }
}

#[derive(Clone, Default)]
pub struct FakeRelationalConnector {
    counters: Arc<Counters>,
    failure: Option<ConnectionErrorKind>,
    failing_close: bool,
}

impl FakeRelationalConnector {
    pub fn reachable() -> Self {
        Self::default()
    }

    pub fn unreachable() -> Self {
        Self::failing(ConnectionErrorKind::Unreachable)
    }

    pub fn failing(kind: ConnectionErrorKind) -> Self {
        Self {
            failure: Some(kind),
            ..Self::default()
        }
    }

    /// Connects fine, then errors when the session is torn down.
    pub fn with_failing_close(mut self) -> Self {
        self.failing_close = true;
        self
    }

    pub fn open_count(&self) -> usize {
        self.counters.opened.load(Ordering::SeqCst)
    }

    pub fn close_count(&self) -> usize {
        self.counters.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RelationalConnector for FakeRelationalConnector {
    async fn connect(&self) -> Result<Box<dyn RelationalHandle>, ConnectionError> {
        if let Some(kind) = self.failure {
            return Err(ConnectionError::new(Store::Relational, kind, "fake failure"));
        }
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeRelationalHandle {
            counters: self.counters.clone(),
            failing_close: self.failing_close,
            open: true,
        }))
    }
}

struct FakeRelationalHandle {
    counters: Arc<Counters>,
    failing_close: bool,
    open: bool,
}

#[async_trait]
impl ConnectionHandle for FakeRelationalHandle {
    async fn close(&mut self) -> Result<(), ConnectionError> {
        if !std::mem::replace(&mut self.open, false) {
            return Ok(());
        }
        self.counters.closed.fetch_add(1, Ordering::SeqCst);
        if self.failing_close {
            return Err(ConnectionError::new(
                Store::Relational,
                ConnectionErrorKind::Unreachable,
                "connection task ended with an error",
            ));
        }
        Ok(())
    }
}

impl RelationalHandle for FakeRelationalHandle {}

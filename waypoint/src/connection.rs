use crate::ports::{
    CacheConnector, CacheHandle, ConnectionHandle, RelationalConnector, RelationalHandle,
};
use shared::ConnectionError;
use std::sync::Arc;

/// Hands out fresh, unpooled sessions to both backing stores.
///
/// Cloning is cheap; the connectors are shared and hold only their
/// immutable connection parameters.
#[derive(Clone)]
pub struct ConnectionFactory {
    relational: Arc<dyn RelationalConnector>,
    cache: Arc<dyn CacheConnector>,
}

impl ConnectionFactory {
    pub fn new(relational: Arc<dyn RelationalConnector>, cache: Arc<dyn CacheConnector>) -> Self {
        Self { relational, cache }
    }

    pub async fn open_relational(&self) -> Result<Box<dyn RelationalHandle>, ConnectionError> {
        self.relational.connect().await
    }

    pub async fn open_cache(&self) -> Result<Box<dyn CacheHandle>, ConnectionError> {
        self.cache.connect().await
    }

    /// Close a handle, logging and discarding any failure from the store.
    pub async fn close<H>(handle: &mut H)
    where
        H: ConnectionHandle + ?Sized,
    {
        if let Err(e) = handle.close().await {
            tracing::warn!("Ignoring failed close: {}", e);
        }
    }
}

impl std::fmt::Debug for ConnectionFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionFactory").finish_non_exhaustive()
    }
}

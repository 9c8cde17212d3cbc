use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client, ErrorKind, RedisError};
use shared::config::CacheParams;
use shared::{ConnectionError, ConnectionErrorKind, Store, TtlSecs};
use waypoint::ports::{CacheConnector, CacheHandle, ConnectionHandle};

/// Opens a fresh Redis connection for every handle.
#[derive(Clone, Debug)]
pub struct RedisConnector {
    params: CacheParams,
}

impl RedisConnector {
    pub fn new(params: CacheParams) -> Self {
        Self { params }
    }
}

#[async_trait]
impl CacheConnector for RedisConnector {
    async fn connect(&self) -> Result<Box<dyn CacheHandle>, ConnectionError> {
        let client = Client::open((self.params.host.clone(), self.params.port)).map_err(|e| {
            ConnectionError::new(Store::Cache, ConnectionErrorKind::Configuration, e.to_string())
        })?;

        let conn = tokio::time::timeout(
            self.params.connect_timeout,
            client.get_multiplexed_async_connection(),
        )
        .await
        .map_err(|_| {
            ConnectionError::new(
                Store::Cache,
                ConnectionErrorKind::Timeout,
                format!(
                    "no connection to {}:{} within {:?}",
                    self.params.host, self.params.port, self.params.connect_timeout
                ),
            )
        })?
        .map_err(classify_redis_error)?;

        tracing::debug!("Opened Redis connection to {}:{}", self.params.host, self.params.port);
        Ok(Box::new(RedisHandle { conn: Some(conn) }))
    }
}

pub struct RedisHandle {
    conn: Option<MultiplexedConnection>,
}

impl RedisHandle {
    fn connection(&mut self) -> Result<&mut MultiplexedConnection, ConnectionError> {
        self.conn.as_mut().ok_or_else(|| {
            ConnectionError::new(
                Store::Cache,
                ConnectionErrorKind::Protocol,
                "connection already closed",
            )
        })
    }
}

#[async_trait]
impl ConnectionHandle for RedisHandle {
    async fn close(&mut self) -> Result<(), ConnectionError> {
        // Dropping the last clone of a multiplexed connection shuts it down
        drop(self.conn.take());
        Ok(())
    }
}

#[async_trait]
impl CacheHandle for RedisHandle {
    async fn get(&mut self, key: &str) -> Result<Option<String>, ConnectionError> {
        let conn = self.connection()?;
        let value: Option<String> = conn.get(key).await.map_err(classify_redis_error)?;
        Ok(value)
    }

    async fn set_ex(
        &mut self,
        key: &str,
        value: &str,
        ttl: TtlSecs,
    ) -> Result<(), ConnectionError> {
        let conn = self.connection()?;
        let _: () = conn
            .set_ex(key, value, ttl.0)
            .await
            .map_err(classify_redis_error)?;
        Ok(())
    }

    async fn ping(&mut self) -> Result<(), ConnectionError> {
        let conn = self.connection()?;
        let _: String = redis::cmd("PING")
            .query_async(conn)
            .await
            .map_err(classify_redis_error)?;
        Ok(())
    }
}

pub(crate) fn classify_redis_error(e: RedisError) -> ConnectionError {
    let kind = if e.is_timeout() {
        ConnectionErrorKind::Timeout
    } else if e.kind() == ErrorKind::AuthenticationFailed
        || matches!(e.code(), Some("NOAUTH") | Some("WRONGPASS"))
    {
        ConnectionErrorKind::Authentication
    } else if e.is_connection_refusal() || e.is_connection_dropped() || e.is_io_error() {
        ConnectionErrorKind::Unreachable
    } else {
        ConnectionErrorKind::Protocol
    };
    ConnectionError::new(Store::Cache, kind, e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::time::Duration;

    #[test]
    fn test_classify_refused_connection() {
        let err = RedisError::from(io::Error::new(io::ErrorKind::ConnectionRefused, "refused"));
        let classified = classify_redis_error(err);
        assert_eq!(classified.kind(), ConnectionErrorKind::Unreachable);
        assert_eq!(classified.store, Store::Cache);
    }

    #[test]
    fn test_classify_authentication_failure() {
        let err = RedisError::from((ErrorKind::AuthenticationFailed, "invalid password"));
        assert_eq!(
            classify_redis_error(err).kind(),
            ConnectionErrorKind::Authentication
        );
    }

    #[test]
    fn test_classify_type_error_as_protocol() {
        let err = RedisError::from((ErrorKind::TypeError, "unexpected reply"));
        assert_eq!(classify_redis_error(err).kind(), ConnectionErrorKind::Protocol);
    }

    #[tokio::test]
    async fn test_connect_to_closed_port_fails_cleanly() {
        let connector = RedisConnector::new(CacheParams {
            host: "127.0.0.1".to_string(),
            port: 1,
            connect_timeout: Duration::from_secs(2),
        });

        let err = match connector.connect().await {
            Ok(_) => panic!("nothing should be listening on port 1"),
            Err(e) => e,
        };
        assert_eq!(err.store, Store::Cache);
        assert!(matches!(
            err.kind(),
            ConnectionErrorKind::Unreachable | ConnectionErrorKind::Timeout
        ));
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let mut handle = RedisHandle { conn: None };
        assert!(handle.close().await.is_ok());
        assert!(handle.close().await.is_ok());
        assert_eq!(
            handle.ping().await.unwrap_err().kind(),
            ConnectionErrorKind::Protocol
        );
    }
}

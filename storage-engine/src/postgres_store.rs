use async_trait::async_trait;
use shared::config::RelationalParams;
use shared::{ConnectionError, ConnectionErrorKind, Store};
use std::error::Error as StdError;
use tokio::task::JoinHandle;
use tokio_postgres::error::SqlState;
use tokio_postgres::{Client, NoTls};
use waypoint::ports::{ConnectionHandle, RelationalConnector, RelationalHandle};

/// Opens a fresh PostgreSQL session for every handle.
#[derive(Clone)]
pub struct PostgresConnector {
    params: RelationalParams,
}

impl PostgresConnector {
    pub fn new(params: RelationalParams) -> Self {
        Self { params }
    }

    fn pg_config(&self) -> tokio_postgres::Config {
        let mut config = tokio_postgres::Config::new();
        config
            .host(&self.params.host)
            .port(self.params.port)
            .dbname(&self.params.database)
            .user(&self.params.user)
            .password(&self.params.password)
            .connect_timeout(self.params.connect_timeout)
            .application_name("waypoint");
        config
    }
}

impl std::fmt::Debug for PostgresConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresConnector")
            .field("host", &self.params.host)
            .field("port", &self.params.port)
            .field("database", &self.params.database)
            .field("user", &self.params.user)
            .finish()
    }
}

#[async_trait]
impl RelationalConnector for PostgresConnector {
    async fn connect(&self) -> Result<Box<dyn RelationalHandle>, ConnectionError> {
        let config = self.pg_config();
        let (client, connection) = tokio::time::timeout(
            self.params.connect_timeout,
            config.connect(NoTls),
        )
        .await
        .map_err(|_| {
            ConnectionError::new(
                Store::Relational,
                ConnectionErrorKind::Timeout,
                format!(
                    "no session with {}:{} within {:?}",
                    self.params.host, self.params.port, self.params.connect_timeout
                ),
            )
        })?
        .map_err(classify_postgres_error)?;

        // The connection object drives the socket until the client is dropped
        let driver = tokio::spawn(connection);

        tracing::debug!(
            "Opened PostgreSQL session to {}:{}/{}",
            self.params.host,
            self.params.port,
            self.params.database
        );
        Ok(Box::new(PostgresHandle {
            client: Some(client),
            driver: Some(driver),
        }))
    }
}

pub struct PostgresHandle {
    client: Option<Client>,
    driver: Option<JoinHandle<Result<(), tokio_postgres::Error>>>,
}

#[async_trait]
impl ConnectionHandle for PostgresHandle {
    async fn close(&mut self) -> Result<(), ConnectionError> {
        drop(self.client.take());
        let Some(driver) = self.driver.take() else {
            return Ok(());
        };
        match driver.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(classify_postgres_error(e)),
            Err(e) => Err(ConnectionError::new(
                Store::Relational,
                ConnectionErrorKind::Protocol,
                format!("connection task failed: {e}"),
            )),
        }
    }
}

impl RelationalHandle for PostgresHandle {}

pub(crate) fn classify_postgres_error(e: tokio_postgres::Error) -> ConnectionError {
    let kind = if let Some(code) = e.code() {
        if *code == SqlState::INVALID_PASSWORD
            || *code == SqlState::INVALID_AUTHORIZATION_SPECIFICATION
        {
            ConnectionErrorKind::Authentication
        } else if *code == SqlState::INVALID_CATALOG_NAME {
            ConnectionErrorKind::Configuration
        } else {
            ConnectionErrorKind::Protocol
        }
    } else {
        match io_cause(&e) {
            Some(io) if io.kind() == std::io::ErrorKind::TimedOut => ConnectionErrorKind::Timeout,
            Some(_) => ConnectionErrorKind::Unreachable,
            None => ConnectionErrorKind::Protocol,
        }
    };
    ConnectionError::new(Store::Relational, kind, e.to_string())
}

fn io_cause(e: &tokio_postgres::Error) -> Option<&std::io::Error> {
    let mut source = StdError::source(e);
    while let Some(cause) = source {
        if let Some(io) = cause.downcast_ref::<std::io::Error>() {
            return Some(io);
        }
        source = StdError::source(cause);
    }
    None
}

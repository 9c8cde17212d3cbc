// shared/src/lib.rs

use std::fmt;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("backend unavailable: {0}")]
    BackendUnavailable(#[source] ConnectionError),
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Expiry applied to a cache write, in whole seconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TtlSecs(pub u64);

impl TtlSecs {
    /// One hour, the expiry every cache write gets unless told otherwise.
    pub const DEFAULT: TtlSecs = TtlSecs(3600);

    pub fn as_duration(self) -> std::time::Duration {
        std::time::Duration::from_secs(self.0)
    }
}

impl Default for TtlSecs {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// The backing store a connection was aimed at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Store {
    Relational,
    Cache,
}

impl fmt::Display for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Store::Relational => f.write_str("relational store"),
            Store::Cache => f.write_str("cache store"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionErrorKind {
    /// Host could not be reached, refused the connection or dropped it.
    Unreachable,
    /// The store rejected the supplied credentials.
    Authentication,
    /// Connect or round-trip exceeded the client timeout.
    Timeout,
    /// Connected, but a command or response failed.
    Protocol,
    /// Connection parameters could not be turned into a client.
    Configuration,
}

impl fmt::Display for ConnectionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConnectionErrorKind::Unreachable => "unreachable",
            ConnectionErrorKind::Authentication => "authentication failed",
            ConnectionErrorKind::Timeout => "timed out",
            ConnectionErrorKind::Protocol => "protocol error",
            ConnectionErrorKind::Configuration => "misconfigured",
        };
        f.write_str(label)
    }
}

/// Failure to open, use or close a session to a backing store.
#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
#[error("{store} {kind}: {reason}")]
pub struct ConnectionError {
    pub store: Store,
    pub kind: ConnectionErrorKind,
    pub reason: String,
}

impl ConnectionError {
    pub fn new(store: Store, kind: ConnectionErrorKind, reason: impl Into<String>) -> Self {
        Self {
            store,
            kind,
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ConnectionErrorKind {
        self.kind
    }
}

impl From<ConnectionError> for Error {
    fn from(err: ConnectionError) -> Self {
        Error::BackendUnavailable(err)
    }
}

pub mod config;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_error_display() {
        let err = ConnectionError::new(
            Store::Cache,
            ConnectionErrorKind::Unreachable,
            "connection refused",
        );
        assert_eq!(err.to_string(), "cache store unreachable: connection refused");
    }

    #[test]
    fn test_connection_error_converts_to_backend_unavailable() {
        let err: Error =
            ConnectionError::new(Store::Relational, ConnectionErrorKind::Timeout, "5s").into();
        match err {
            Error::BackendUnavailable(inner) => {
                assert_eq!(inner.kind(), ConnectionErrorKind::Timeout);
                assert_eq!(inner.store, Store::Relational);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_default_ttl_is_one_hour() {
        assert_eq!(TtlSecs::default(), TtlSecs(3600));
        assert_eq!(TtlSecs::DEFAULT.as_duration().as_secs(), 3600);
    }
}

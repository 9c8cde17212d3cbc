pub mod connection;
pub mod domain;
pub mod gateway;
pub mod health;
pub mod ports;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use connection::ConnectionFactory;
pub use domain::{CacheLookup, HealthReport, HealthStatus};
pub use gateway::CacheGateway;
pub use health::HealthAggregator;

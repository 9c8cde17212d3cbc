use shared::config::Config;
use waypoint::{CacheGateway, ConnectionFactory, HealthAggregator};

/// Server state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    pub gateway: CacheGateway,
    pub health: HealthAggregator,
    pub service_name: String,
}

impl AppState {
    pub fn new(connections: ConnectionFactory, service_name: impl Into<String>) -> Self {
        let service_name = service_name.into();
        Self {
            gateway: CacheGateway::new(connections.clone()),
            health: HealthAggregator::new(connections, service_name.clone()),
            service_name,
        }
    }

    /// State backed by the stores named in `config`.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            storage_engine::connection_factory(config),
            config.service_name.clone(),
        )
    }
}

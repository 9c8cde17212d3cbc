use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// Which cache store the service talks to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheBackend {
    Redis,
    /// In-process store, for local runs without Redis.
    Memory,
}

/// Connection parameters for the relational store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelationalParams {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
    pub connect_timeout: Duration,
}

/// Connection parameters for the cache store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheParams {
    pub host: String,
    pub port: u16,
    pub connect_timeout: Duration,
}

pub struct Config {
    pub host: String,
    pub http_port: u16,
    pub service_name: String,
    pub relational: RelationalParams,
    pub cache: CacheParams,
    pub cache_backend: CacheBackend,
    /// Entry bound for the in-process store; unbounded when unset.
    pub memory_max_entries: Option<u64>,
    pub allowed_origins: Vec<String>,
}

impl Config {
    const DEFAULT_HOST: &'static str = "0.0.0.0";
    const DEFAULT_HTTP_PORT: u16 = 5000;
    const DEFAULT_SERVICE_NAME: &'static str = "python-api";
    const DEFAULT_DB_HOST: &'static str = "postgres";
    const DEFAULT_DB_PORT: u16 = 5432;
    const DEFAULT_DB_NAME: &'static str = "multiapp";
    const DEFAULT_DB_USER: &'static str = "dev";
    const DEFAULT_DB_PASSWORD: &'static str = "devpass";
    const DEFAULT_REDIS_HOST: &'static str = "redis";
    const DEFAULT_REDIS_PORT: u16 = 6379;
    const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let string = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let connect_timeout = Duration::from_secs(parse_or(
            &lookup,
            "CONNECT_TIMEOUT_SECS",
            Self::DEFAULT_CONNECT_TIMEOUT_SECS,
        ));

        let cache_backend = match lookup("CACHE_BACKEND").as_deref() {
            None | Some("redis") => CacheBackend::Redis,
            Some("memory") => CacheBackend::Memory,
            Some(other) => {
                warn!("Unknown CACHE_BACKEND '{}', falling back to redis", other);
                CacheBackend::Redis
            }
        };

        let memory_max_entries = lookup("MEMORY_MAX_ENTRIES").and_then(|raw| {
            raw.trim().parse::<u64>().ok().or_else(|| {
                warn!("MEMORY_MAX_ENTRIES='{}' is not valid, leaving the store unbounded", raw);
                None
            })
        });

        let password = lookup("DB_PASSWORD").unwrap_or_else(|| {
            warn!("DB_PASSWORD not set, using the development default");
            Self::DEFAULT_DB_PASSWORD.to_string()
        });

        Self {
            host: string("WAYPOINT_HOST", Self::DEFAULT_HOST),
            http_port: parse_or(&lookup, "PORT", Self::DEFAULT_HTTP_PORT),
            service_name: string("SERVICE_NAME", Self::DEFAULT_SERVICE_NAME),
            relational: RelationalParams {
                host: string("DB_HOST", Self::DEFAULT_DB_HOST),
                port: parse_or(&lookup, "DB_PORT", Self::DEFAULT_DB_PORT),
                database: string("DB_NAME", Self::DEFAULT_DB_NAME),
                user: string("DB_USER", Self::DEFAULT_DB_USER),
                password,
                connect_timeout,
            },
            cache: CacheParams {
                host: string("REDIS_HOST", Self::DEFAULT_REDIS_HOST),
                port: parse_or(&lookup, "REDIS_PORT", Self::DEFAULT_REDIS_PORT),
                connect_timeout,
            },
            cache_backend,
            memory_max_entries,
            allowed_origins: string("ALLOWED_ORIGINS", "*")
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.http_port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Copy + std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse::<T>().unwrap_or_else(|_| {
            warn!("{}='{}' is not valid, using {}", key, raw, default);
            default
        }),
        None => default,
    }
}

//! Server configuration from environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::cache::CacheConfig;
use crate::network::PipelineConfig;
use crate::routing::RouteConfig;

/// A variable that is set but cannot be used.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {name}={value:?}: {reason}")]
pub struct ConfigError {
    pub name: &'static str,
    pub value: String,
    pub reason: &'static str,
}

/// Everything the server binary needs to start.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Feed directory or zip archive (`FEED_PATH`).
    pub feed_path: PathBuf,

    /// Cache directory (`CACHE_DIR`). Set it empty to disable the disk cache.
    pub cache: Option<CacheConfig>,

    /// `MAX_TRIPS` (`0` or unset for every trip) and `TIME_MERGE`
    /// (`running_average` or `trip_weighted`).
    pub pipeline: PipelineConfig,

    /// `BIND_ADDR`
    pub bind_addr: SocketAddr,

    /// `ROUTE_LAMBDA` and `TOP_HUBS`
    pub route: RouteConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            feed_path: PathBuf::from("data/gtfs"),
            cache: Some(CacheConfig::default()),
            pipeline: PipelineConfig::default(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8000)),
            route: RouteConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable lookup; unset variables keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup("FEED_PATH") {
            config.feed_path = PathBuf::from(path);
        }
        if let Some(dir) = lookup("CACHE_DIR") {
            config.cache = (!dir.trim().is_empty()).then(|| CacheConfig::new(dir));
        }
        if let Some(value) = lookup("MAX_TRIPS") {
            let n: usize = parse("MAX_TRIPS", &value, "expected a non-negative integer")?;
            config.pipeline.max_trips = (n > 0).then_some(n);
        }
        if let Some(value) = lookup("TIME_MERGE") {
            config.pipeline.time_merge = parse(
                "TIME_MERGE",
                &value,
                "expected running_average or trip_weighted",
            )?;
        }
        if let Some(value) = lookup("BIND_ADDR") {
            config.bind_addr = parse("BIND_ADDR", &value, "expected host:port")?;
        }
        if let Some(value) = lookup("ROUTE_LAMBDA") {
            let lambda: f64 = parse("ROUTE_LAMBDA", &value, "expected a number")?;
            if !lambda.is_finite() || lambda < 0.0 {
                return Err(ConfigError {
                    name: "ROUTE_LAMBDA",
                    value,
                    reason: "must be finite and non-negative",
                });
            }
            config.route.lambda = lambda;
        }
        if let Some(value) = lookup("TOP_HUBS") {
            config.route.top_k = parse("TOP_HUBS", &value, "expected a non-negative integer")?;
        }

        Ok(config)
    }
}

fn parse<T: std::str::FromStr>(
    name: &'static str,
    value: &str,
    reason: &'static str,
) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError {
        name,
        value: value.to_string(),
        reason,
    })
}

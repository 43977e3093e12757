//! Process configuration, read from the environment.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::batch::BatchConfig;
use crate::cache::CacheConfig;
use crate::directory::DirectoryConfig;
use crate::upstream::TransitClientConfig;

/// Error returned when an environment variable cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid value for {var}: {value:?}")]
pub struct ConfigError {
    var: &'static str,
    value: String,
}

/// Everything needed to start the server.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// Address the HTTP server listens on
    pub bind: SocketAddr,
    /// Upstream client settings
    pub upstream: TransitClientConfig,
    /// Stop directory settings
    pub directory: DirectoryConfig,
    /// Arrival cache settings
    pub cache: CacheConfig,
    /// Batch lookup settings
    pub batch: BatchConfig,
    /// Emit logs as JSON lines instead of human-readable text
    pub json_logs: bool,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 3000)),
            upstream: TransitClientConfig::default(),
            directory: DirectoryConfig::default(),
            cache: CacheConfig::default(),
            batch: BatchConfig::default(),
            json_logs: false,
        }
    }
}

impl ProxyConfig {
    /// Read configuration from `TRANSIT_PROXY_*` environment variables,
    /// falling back to defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(bind) = parse_var(&lookup, "TRANSIT_PROXY_BIND")? {
            config.bind = bind;
        }
        if let Some(url) = lookup("TRANSIT_PROXY_UPSTREAM_URL") {
            config.upstream = config.upstream.with_base_url(url);
        }
        if let Some(secs) = parse_var(&lookup, "TRANSIT_PROXY_TIMEOUT_SECS")? {
            config.upstream = config.upstream.with_timeout(secs);
        }
        if let Some(secs) = parse_var(&lookup, "TRANSIT_PROXY_ARRIVAL_TTL_SECS")? {
            config.cache = config.cache.with_arrival_ttl(Duration::from_secs(secs));
        }
        if let Some(secs) = parse_var(&lookup, "TRANSIT_PROXY_REFERENCE_TTL_SECS")? {
            config.directory = config.directory.with_ttl(Duration::from_secs(secs));
        }
        if let Some(format) = lookup("LOG_FORMAT") {
            config.json_logs = format.eq_ignore_ascii_case("json");
        }

        Ok(config)
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError> {
    let Some(value) = lookup(var) else {
        return Ok(None);
    };
    value
        .trim()
        .parse()
        .map(Some)
        .map_err(|_| ConfigError { var, value })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::upstream::DEFAULT_BASE_URL;

    fn from_map(vars: &[(&str, &str)]) -> Result<ProxyConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ProxyConfig::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let config = from_map(&[]).unwrap();

        assert_eq!(config.bind, SocketAddr::from(([127, 0, 0, 1], 3000)));
        assert_eq!(config.upstream.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.cache.arrival_ttl, Duration::from_secs(15));
        assert_eq!(config.directory.ttl, Duration::from_secs(86_400));
        assert_eq!(config.batch.chunk_size, 50);
        assert!(!config.json_logs);
    }

    #[test]
    fn overrides_applied() {
        let config = from_map(&[
            ("TRANSIT_PROXY_BIND", "0.0.0.0:8080"),
            ("TRANSIT_PROXY_UPSTREAM_URL", "http://localhost:9000"),
            ("TRANSIT_PROXY_TIMEOUT_SECS", "5"),
            ("TRANSIT_PROXY_ARRIVAL_TTL_SECS", "30"),
            ("TRANSIT_PROXY_REFERENCE_TTL_SECS", "3600"),
            ("LOG_FORMAT", "JSON"),
        ])
        .unwrap();

        assert_eq!(config.bind, SocketAddr::from(([0, 0, 0, 0], 8080)));
        assert_eq!(config.upstream.base_url, "http://localhost:9000");
        assert_eq!(config.upstream.timeout_secs, 5);
        assert_eq!(config.cache.arrival_ttl, Duration::from_secs(30));
        assert_eq!(config.directory.ttl, Duration::from_secs(3600));
        assert!(config.json_logs);
    }

    #[test]
    fn malformed_value_names_variable() {
        let err = from_map(&[("TRANSIT_PROXY_ARRIVAL_TTL_SECS", "soon")]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid value for TRANSIT_PROXY_ARRIVAL_TTL_SECS: \"soon\""
        );
    }
}

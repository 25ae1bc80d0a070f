//! Configuration management for the mail router
//!
//! This module handles loading configuration from environment variables
//! and configuration files using the figment crate.

use mailroute_core::RouterConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub routing: RoutingConfig,
    pub observability: ObservabilityConfig,
    pub privacy: PrivacyConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

/// Resolution pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Per-URL liveness probe timeout in milliseconds
    pub probe_timeout_ms: u64,
    /// Homepage fetch timeout in milliseconds
    pub sniff_timeout_ms: u64,
    /// MX query timeout in milliseconds
    pub dns_timeout_ms: u64,
    /// Maximum liveness probes in flight per request
    pub probe_concurrency: usize,
    /// Marker searched for in homepage bodies
    pub sniff_marker: String,
    /// Optional TOML file replacing the built-in rule tables
    pub rules_file: Option<PathBuf>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        let core = RouterConfig::default();
        Self {
            probe_timeout_ms: core.probe_timeout_ms,
            sniff_timeout_ms: core.sniff_timeout_ms,
            dns_timeout_ms: core.dns_timeout_ms,
            probe_concurrency: core.probe_concurrency,
            sniff_marker: core.sniff_marker,
            rules_file: None,
        }
    }
}

impl RoutingConfig {
    pub fn to_router_config(&self) -> RouterConfig {
        RouterConfig {
            probe_timeout_ms: self.probe_timeout_ms,
            sniff_timeout_ms: self.sniff_timeout_ms,
            dns_timeout_ms: self.dns_timeout_ms,
            probe_concurrency: self.probe_concurrency,
            sniff_marker: self.sniff_marker.clone(),
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Enable JSON structured logging
    pub json_logs: bool,
    /// Log filter used when RUST_LOG is unset
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            json_logs: false,
            log_level: "info".to_string(),
        }
    }
}

/// Log masking configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrivacyConfig {
    /// Salt for hashing login local parts in logs; random per process when unset
    pub salt: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.routing.probe_timeout_ms, 5000);
        assert!(!config.observability.json_logs);
        assert!(config.privacy.salt.is_none());
    }

    #[test]
    fn test_routing_config_matches_core_defaults() {
        let routing = RoutingConfig::default();
        let core = routing.to_router_config();
        assert_eq!(core.probe_timeout_ms, 5000);
        assert_eq!(core.sniff_timeout_ms, 5000);
        assert_eq!(core.probe_concurrency, 1);
        assert_eq!(core.sniff_marker, "Whois");
        assert!(routing.rules_file.is_none());
    }
}

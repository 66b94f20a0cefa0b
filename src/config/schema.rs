//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the
//! service-function router. All types derive Serde traits for
//! deserialization from config files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::dpi::EnforcementPolicy;

/// Root configuration for the router.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RouterConfig {
    /// Listener configuration (bind address, body limit).
    pub listener: ListenerConfig,

    /// Server-role identity: certificate shown to upstream callers and the
    /// CA pool used to authenticate them.
    pub server_identity: IdentityConfig,

    /// Client-role identity: certificate shown to the next hop and the CA
    /// pool used to authenticate it. Optional when every next hop in the
    /// deployment is plaintext.
    pub client_identity: Option<IdentityConfig>,

    /// Inspection settings.
    pub dpi: DpiConfig,

    /// Outbound relay settings.
    pub forwarder: ForwarderConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8443").
    pub bind_address: String,

    /// Maximum request body size in bytes, buffered for inspection.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8443".to_string(),
            max_body_bytes: 2 * 1024 * 1024,
        }
    }
}

/// Paths to one TLS identity: certificate, private key, trusted-CA bundle.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct IdentityConfig {
    /// Path to the certificate chain (PEM).
    pub cert_path: PathBuf,

    /// Path to the private key (PEM).
    pub key_path: PathBuf,

    /// Path to the CA bundle peers must chain to (PEM).
    pub ca_path: PathBuf,
}

/// Inspection configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct DpiConfig {
    /// What a detection hit does to the forwarding decision:
    /// `alert-only` logs and forwards, `block-on-hit` drops.
    pub policy: EnforcementPolicy,
}

/// Outbound relay configuration.
///
/// Defaults mirror a high-fan-out chain deployment: a large idle budget
/// per host with a short idle timeout.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ForwarderConfig {
    /// Maximum idle connections kept per next-hop host.
    pub max_idle_per_host: usize,

    /// Idle connection timeout in seconds.
    pub idle_timeout_secs: u64,

    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for ForwarderConfig {
    fn default() -> Self {
        Self {
            max_idle_per_host: 1000,
            idle_timeout_secs: 10,
            connect_timeout_secs: 10,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 60 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_alert_only() {
        let config = RouterConfig::default();
        assert_eq!(config.dpi.policy, EnforcementPolicy::AlertOnly);
        assert!(config.client_identity.is_none());
    }

    #[test]
    fn full_config_round_trips_through_toml() {
        let toml = r#"
            [listener]
            bind_address = "127.0.0.1:8443"

            [server_identity]
            cert_path = "/etc/sfc/server.crt"
            key_path = "/etc/sfc/server.key"
            ca_path = "/etc/sfc/clients-ca.crt"

            [client_identity]
            cert_path = "/etc/sfc/client.crt"
            key_path = "/etc/sfc/client.key"
            ca_path = "/etc/sfc/hops-ca.crt"

            [dpi]
            policy = "block-on-hit"

            [forwarder]
            max_idle_per_host = 64
            idle_timeout_secs = 5
        "#;

        let config: RouterConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:8443");
        assert_eq!(config.dpi.policy, EnforcementPolicy::BlockOnHit);
        assert_eq!(config.forwarder.max_idle_per_host, 64);
        // Unset fields fall back to defaults.
        assert_eq!(config.forwarder.connect_timeout_secs, 10);
        assert!(config.client_identity.is_some());
    }
}

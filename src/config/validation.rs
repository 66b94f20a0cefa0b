//! Configuration validation.
//!
//! Semantic validation on top of serde's syntactic checks. Pure function:
//! `RouterConfig → Result<(), Vec<ValidationError>>`, reporting all errors
//! rather than stopping at the first. Runs before the config is accepted
//! into the system.

use std::net::SocketAddr;

use crate::config::schema::{IdentityConfig, RouterConfig};

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("listener.bind_address {0:?} is not a valid socket address")]
    InvalidBindAddress(String),
    #[error("{section}.{field} must be set")]
    MissingPath { section: &'static str, field: &'static str },
    #[error("observability.metrics_address {0:?} is not a valid socket address")]
    InvalidMetricsAddress(String),
    #[error("timeouts.request_secs must be greater than zero")]
    ZeroRequestTimeout,
    #[error("listener.max_body_bytes must be greater than zero")]
    ZeroBodyLimit,
    #[error("forwarder.max_idle_per_host must be greater than zero")]
    ZeroIdleBudget,
}

/// Validate a configuration, collecting every violation.
pub fn validate_config(config: &RouterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }
    if config.listener.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    validate_identity(&config.server_identity, "server_identity", &mut errors);
    if let Some(client_identity) = &config.client_identity {
        validate_identity(client_identity, "client_identity", &mut errors);
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }
    if config.forwarder.max_idle_per_host == 0 {
        errors.push(ValidationError::ZeroIdleBudget);
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_identity(
    identity: &IdentityConfig,
    section: &'static str,
    errors: &mut Vec<ValidationError>,
) {
    if identity.cert_path.as_os_str().is_empty() {
        errors.push(ValidationError::MissingPath { section, field: "cert_path" });
    }
    if identity.key_path.as_os_str().is_empty() {
        errors.push(ValidationError::MissingPath { section, field: "key_path" });
    }
    if identity.ca_path.as_os_str().is_empty() {
        errors.push(ValidationError::MissingPath { section, field: "ca_path" });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> RouterConfig {
        let mut config = RouterConfig::default();
        config.listener.bind_address = "127.0.0.1:8443".to_string();
        config.server_identity.cert_path = "/etc/sfc/server.crt".into();
        config.server_identity.key_path = "/etc/sfc/server.key".into();
        config.server_identity.ca_path = "/etc/sfc/ca.crt".into();
        config
    }

    #[test]
    fn valid_config_passes() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn all_errors_are_reported_not_just_the_first() {
        let mut config = valid_config();
        config.listener.bind_address = "not-an-address".to_string();
        config.server_identity.cert_path = "".into();
        config.timeouts.request_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn default_config_is_missing_identity_paths() {
        let errors = validate_config(&RouterConfig::default()).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::MissingPath { section: "server_identity", .. })));
    }

    #[test]
    fn metrics_address_is_only_checked_when_enabled() {
        let mut config = valid_config();
        config.observability.metrics_address = "bogus".to_string();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert!(validate_config(&config).is_err());
    }
}

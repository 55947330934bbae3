//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Reject ambiguous broker and auth settings
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AdminConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::{AdminConfig, StoreBackend};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self { field, message: message.into() }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub fn validate_config(config: &AdminConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.store.backend == StoreBackend::Sqlite && config.store.sqlite_path.trim().is_empty() {
        errors.push(ValidationError::new("store.sqlite_path", "must be set for the sqlite backend"));
    }

    let broker = &config.broker;
    if broker.outbound_queue.trim().is_empty() {
        errors.push(ValidationError::new("broker.outbound_queue", "must not be empty"));
    }
    if broker.inbound_queue.trim().is_empty() {
        errors.push(ValidationError::new("broker.inbound_queue", "must not be empty"));
    }
    if broker.outbound_queue == broker.inbound_queue {
        errors.push(ValidationError::new(
            "broker.inbound_queue",
            "must differ from broker.outbound_queue",
        ));
    }
    if broker.queue_capacity == 0 {
        errors.push(ValidationError::new("broker.queue_capacity", "must be greater than 0"));
    }
    if broker.connect_max_attempts == 0 {
        errors.push(ValidationError::new("broker.connect_max_attempts", "must be at least 1"));
    }
    if broker.connect_base_delay_ms > broker.connect_max_delay_ms {
        errors.push(ValidationError::new(
            "broker.connect_base_delay_ms",
            "must not exceed broker.connect_max_delay_ms",
        ));
    }

    if config.health_check.timeout_secs == 0 {
        errors.push(ValidationError::new("health_check.timeout_secs", "must be greater than 0"));
    }

    if config.admin.api_keys.is_empty() {
        errors.push(ValidationError::new("admin.api_keys", "at least one key is required"));
    }
    let mut seen = HashSet::new();
    for key in &config.admin.api_keys {
        if key.key.trim().is_empty() {
            errors.push(ValidationError::new(
                "admin.api_keys",
                format!("key for operator '{}' is empty", key.operator),
            ));
        }
        if !seen.insert(key.key.as_str()) {
            errors.push(ValidationError::new(
                "admin.api_keys",
                format!("key for operator '{}' is shared with another operator", key.operator),
            ));
        }
    }
    if config.admin.request_timeout_secs == 0 {
        errors.push(ValidationError::new("admin.request_timeout_secs", "must be greater than 0"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::ApiKeyConfig;

    fn keyed_config() -> AdminConfig {
        let mut config = AdminConfig::default();
        config.admin.api_keys.push(ApiKeyConfig {
            operator: "ops".into(),
            key: "k-ops".into(),
        });
        config
    }

    #[test]
    fn test_keyed_default_config_is_valid() {
        assert!(validate_config(&keyed_config()).is_ok());
    }

    #[test]
    fn test_default_config_requires_api_key() {
        let errors = validate_config(&AdminConfig::default()).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "admin.api_keys");
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = keyed_config();
        config.listener.bind_address = "nowhere".into();
        config.broker.inbound_queue = config.broker.outbound_queue.clone();
        config.admin.api_keys.push(ApiKeyConfig {
            operator: "second".into(),
            key: "k-ops".into(),
        });

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().any(|e| e.field == "listener.bind_address"));
        assert!(errors.iter().any(|e| e.field == "admin.api_keys"));
    }
}

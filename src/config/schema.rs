//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the control
//! plane. All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the fleet admin service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AdminConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Persistence backend.
    pub store: StoreConfig,

    /// Broker queues and connect retry policy.
    pub broker: BrokerConfig,

    /// Inbound event handling.
    pub messaging: MessagingConfig,

    /// Registration health probe settings.
    pub health_check: HealthCheckConfig,

    /// Admin API authentication and timeouts.
    pub admin: AdminApiConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Which store implementation to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    Sqlite,
}

/// Persistence configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,

    /// Database file, used when `backend = "sqlite"`.
    pub sqlite_path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            sqlite_path: "fleet-admin.db".to_string(),
        }
    }
}

/// Broker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BrokerConfig {
    /// Queue carrying commands to the proxy fleet.
    pub outbound_queue: String,

    /// Queue carrying events from the proxy fleet.
    pub inbound_queue: String,

    /// Messages retained per queue while nobody is subscribed.
    pub queue_capacity: usize,

    /// Connect attempts before giving up (startup and reconnect).
    pub connect_max_attempts: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub connect_base_delay_ms: u64,

    /// Maximum delay between attempts in milliseconds.
    pub connect_max_delay_ms: u64,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            outbound_queue: "admin-to-reverseproxy".to_string(),
            inbound_queue: "reverseproxy-to-admin".to_string(),
            queue_capacity: 10_000,
            connect_max_attempts: 5,
            connect_base_delay_ms: 200,
            connect_max_delay_ms: 5_000,
        }
    }
}

/// Inbound event handling.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct MessagingConfig {
    /// When true, `replica-added` events mark the replica active instead of
    /// being recorded as acknowledgements only.
    pub trust_replica_added: bool,
}

/// Registration health probe configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Probe timeout in seconds.
    pub timeout_secs: u64,

    /// User-Agent sent with probes.
    pub user_agent: String,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 5,
            user_agent: "fleet-admin-health-check".to_string(),
        }
    }
}

/// A bearer key and the operator it identifies.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ApiKeyConfig {
    pub operator: String,
    pub key: String,
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminApiConfig {
    /// Accepted bearer keys. Empty by default; validation requires at least one.
    pub api_keys: Vec<ApiKeyConfig>,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for AdminApiConfig {
    fn default() -> Self {
        Self {
            api_keys: Vec::new(),
            request_timeout_secs: 30,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Filter used when RUST_LOG is unset.
    pub log_filter: String,

    /// Enable Prometheus exporter.
    pub metrics_enabled: bool,

    /// Prometheus listen address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_filter: "fleet_admin=info,tower_http=info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

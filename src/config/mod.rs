//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML), or defaults when no --config is given
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → AdminConfig (validated, immutable)
//!     → handed by value to each subsystem at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::AdminApiConfig;
pub use schema::AdminConfig;
pub use schema::ApiKeyConfig;
pub use schema::BrokerConfig;
pub use schema::HealthCheckConfig;
pub use schema::ListenerConfig;
pub use schema::MessagingConfig;
pub use schema::ObservabilityConfig;
pub use schema::StoreBackend;
pub use schema::StoreConfig;

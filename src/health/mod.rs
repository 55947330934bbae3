//! Health probing subsystem.
//!
//! # Data Flow
//! ```text
//! ReplicaManager::register
//!     → replicas::validation (endpoint charset, probe URL)
//!     → probe.rs (GET probe URL, 2xx within timeout)
//!     → Ok → store mutation
//!     → Err → HealthCheckFailed, nothing written
//! ```
//!
//! # Design Decisions
//! - Probing is synchronous with registration and never retried
//! - The probe is a trait so lifecycle tests can script outcomes

pub mod probe;

pub use probe::{HealthProbe, HttpHealthProbe, ProbeFailure};

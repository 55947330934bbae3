//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → stdout (fmt layer, filtered by RUST_LOG or config)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured fields (replica_id, url, kind) instead of formatted strings
//! - Request ID flows from the admin API into handler spans
//! - Metrics are cheap (atomic increments); recording is a no-op until the
//!   exporter is installed

pub mod logging;
pub mod metrics;

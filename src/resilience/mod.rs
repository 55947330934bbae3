//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Broker connect / re-subscribe:
//!     → retries.rs (bounded attempts, RetryPolicy from config)
//!     → backoff.rs (exponential delay with jitter between attempts)
//!     → give up with the last error once attempts are exhausted
//! ```
//!
//! # Design Decisions
//! - Retries are bounded; exhaustion is an error the caller escalates
//! - Jittered backoff prevents a reconnect stampede
//! - Publish is never retried here; it is fire-and-forget by contract

pub mod backoff;
pub mod retries;

pub use retries::{retry_with_backoff, RetryPolicy};

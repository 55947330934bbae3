//! Traffic statistics.
//!
//! # Data Flow
//! ```text
//! Inbound `statistics` event
//!     → aggregator.rs (validate batch)
//!     → Store::accumulate_statistics (one transaction, counters += deltas)
//!
//! Admin API get-statistics
//!     → aggregator.rs summary (totals + per-URL records)
//! ```
//!
//! # Design Decisions
//! - Counters only ever grow; nothing here resets them
//! - A batch applies completely or not at all

pub mod aggregator;

pub use aggregator::{StatisticsAggregator, StatisticsSummary};

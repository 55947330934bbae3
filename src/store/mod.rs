//! Persistence subsystem.
//!
//! # Data Flow
//! ```text
//! ReplicaManager / ParameterManager / StatisticsAggregator
//!     → Store trait (this module)
//!     → memory.rs (single lock, staged writes)
//!     → sqlite.rs (rusqlite transactions, UNIQUE constraints)
//! ```
//!
//! # Design Decisions
//! - Every method is one atomic unit; there is no in-process locking above the store
//! - Invariants that need atomicity ("one active parameter version", "unique
//!   name/url", "all-or-nothing statistics batch") are store operations, not
//!   read-then-write sequences in the managers
//! - Audit rows are appended separately, after the mutation they describe

pub mod memory;
pub mod models;
pub mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{StoreBackend, StoreConfig};
pub use memory::MemoryStore;
pub use models::*;
pub use sqlite::SqliteStore;

/// Errors raised by a store implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("store backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Largest value a request counter may reach. Matches SQLite's INTEGER range
/// so every backend overflows at the same point.
pub const MAX_REQUEST_COUNT: u64 = i64::MAX as u64;

/// `current + delta`, or the counter overflow error for `url`.
pub(crate) fn add_request_count(current: u64, delta: u64, url: &str) -> StoreResult<u64> {
    current
        .checked_add(delta)
        .filter(|total| *total <= MAX_REQUEST_COUNT)
        .ok_or_else(|| StoreError::Backend(format!("request counter overflow for '{}'", url)))
}

/// Transactional repository over replicas, audit entries, parameter versions
/// and statistics.
#[async_trait]
pub trait Store: Send + Sync {
    async fn replica(&self, key: &ReplicaKey) -> StoreResult<Option<Replica>>;

    async fn replicas(&self) -> StoreResult<Vec<Replica>>;

    /// Insert a replica as `inactive`, or, when the exact (name, url) pair
    /// already exists, set it `active` and refresh its health endpoint.
    async fn register_replica(&self, new: NewReplica) -> StoreResult<RegisterOutcome>;

    /// Unconditionally write a status, returning the previous one.
    async fn set_replica_status(
        &self,
        key: &ReplicaKey,
        status: ReplicaStatus,
    ) -> StoreResult<StatusChange>;

    /// Write `status` only if the stored status still equals `expected`.
    /// Returns `None` when another writer got there first.
    async fn compare_and_set_replica_status(
        &self,
        id: i64,
        expected: ReplicaStatus,
        status: ReplicaStatus,
    ) -> StoreResult<Option<Replica>>;

    async fn append_activity(&self, entry: NewActivity) -> StoreResult<ActivityLogEntry>;

    /// Audit entries, newest first.
    async fn activity(&self) -> StoreResult<Vec<ActivityLogEntry>>;

    /// Most recently created version regardless of status.
    async fn latest_parameters(&self) -> StoreResult<Option<ParameterVersion>>;

    /// Most recently created version with status `active`.
    async fn latest_active_parameters(&self) -> StoreResult<Option<ParameterVersion>>;

    /// All versions, newest first.
    async fn parameter_versions(&self) -> StoreResult<Vec<ParameterVersion>>;

    /// Insert a version and settle the active flag in one unit.
    async fn insert_parameters(
        &self,
        params: ParameterSet,
        activation: Activation,
    ) -> StoreResult<ParameterVersion>;

    /// Add every delta to its URL's counters, inserting missing URLs.
    /// Any failure leaves every record untouched.
    async fn accumulate_statistics(
        &self,
        batch: &[StatisticsDelta],
    ) -> StoreResult<Vec<StatisticsRecord>>;

    async fn statistics(&self) -> StoreResult<Vec<StatisticsRecord>>;
}

/// Open the store selected in configuration.
pub fn open_store(config: &StoreConfig) -> StoreResult<Arc<dyn Store>> {
    match config.backend {
        StoreBackend::Memory => {
            tracing::info!("Using in-memory store");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Sqlite => {
            tracing::info!(path = %config.sqlite_path, "Opening SQLite store");
            Ok(Arc::new(SqliteStore::open(&config.sqlite_path)?))
        }
    }
}

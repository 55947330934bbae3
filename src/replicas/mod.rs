//! Replica lifecycle subsystem.
//!
//! # Data Flow
//! ```text
//! Admin API (register / disable / change status):
//!     → validation.rs (required fields, endpoint charset, probe URL)
//!     → health probe (register only)
//!     → Store mutation (upsert or compare-and-set)
//!     → audit entry
//!     → CommandPublisher (add-replica / remove-replica)
//!
//! Inbound fleet reports (replica-added / -failed / -removed):
//!     → lookup by url
//!     → Store status write + audit entry, nothing published
//! ```
//!
//! # Design Decisions
//! - Mutation first, publish second; a failed publish is reported, not undone
//! - States: inactive → active → disabled, with disabled → active reactivation

pub mod lifecycle;
pub mod validation;

pub use lifecycle::{FleetReport, ReplicaManager, ReplicaSelector};

//! Prequal parameter versioning.
//!
//! # Data Flow
//! ```text
//! Admin API add:
//!     → validate values
//!     → Store::insert_parameters (insert + settle the single active row, atomically)
//!     → audit entry with the full values
//!     → CommandPublisher (new-parameters)
//!
//! Admin API read:
//!     → newest version if active, else newest active version
//!
//! Fleet acknowledgements (parameters-updated / parameters-update-failed):
//!     → audit entry only
//! ```
//!
//! # Design Decisions
//! - A new version is staged inactive unless it is the first or is named by activate_id
//! - The one-active invariant lives in the store, never in a read-then-write here

pub mod versions;

pub use versions::{ParameterAck, ParameterManager};

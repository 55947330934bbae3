//! Caller authentication.
//!
//! # Data Flow
//! ```text
//! Admin API / fleet bridge request:
//!     → Authorization: Bearer <key>
//!     → identity.rs (look the key up among configured operators)
//!     → CallerIdentity, passed explicitly into each mutating operation
//! ```
//!
//! # Design Decisions
//! - Fail closed: a missing or unknown key is rejected
//! - Identity is a typed value, never an ambient context lookup

pub mod identity;

pub use identity::{ApiKeyRegistry, CallerIdentity};

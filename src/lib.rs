//! Fleet admin control plane.
//!
//! Tracks load-balancer backend replicas, keeps the proxy fleet in sync over
//! a message channel, versions the prequal probe parameters and accumulates
//! traffic statistics reported back by the fleet.
//!
//! # Architecture Overview
//!
//! ```text
//!   operator ──HTTP──▶ admin ──▶ replicas / parameters / statistics ──▶ store
//!                                     │
//!                                     ▼ commands
//!                                 messaging ──outbound queue──▶ bridge ──ws──▶ proxy fleet
//!                                     ▲
//!                                     └──── consumer ◀──inbound queue◀── bridge ◀──ws── proxy fleet
//! ```

// Core subsystems
pub mod config;
pub mod error;
pub mod store;

// Domain
pub mod health;
pub mod parameters;
pub mod replicas;
pub mod statistics;

// Surfaces
pub mod admin;
pub mod http;
pub mod messaging;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod security;

pub use config::AdminConfig;
pub use error::{AdminError, AdminResult};
pub use http::AdminServer;
pub use lifecycle::Shutdown;

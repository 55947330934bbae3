//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Open store → Connect broker (with retry)
//!     → Build managers → Hand back services for the listeners
//!
//! Shutdown (shutdown.rs):
//!     Signal received or consumer gave up → broadcast → HTTP drains,
//!     bridge sessions close, consumer loop exits
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then store and broker, then listeners
//! - A startup failure is returned as an error, never a panic
//! - One broadcast channel reaches every long-running task

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{bootstrap, Services, StartupError};

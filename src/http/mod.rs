//! HTTP surface of the control plane.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, trace span, timeout)
//!     → admin auth (bearer key → CallerIdentity)
//!     → admin handlers / fleet bridge upgrade
//!     → response.rs ({success, message, data} envelope, error → status)
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use response::ApiResponse;
pub use server::{AdminServer, AppState};

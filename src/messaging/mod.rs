//! Messaging gateway between the control plane and the proxy fleet.
//!
//! # Data Flow
//! ```text
//! Outbound (admin → proxy fleet):
//!     manager mutation
//!     → publisher.rs (Command → envelope bytes, fire-and-forget)
//!     → broker.rs (outbound queue)
//!     → bridge.rs (text frame to every connected proxy)
//!
//! Inbound (proxy fleet → admin):
//!     bridge.rs (frame from a proxy)
//!     → broker.rs (inbound queue)
//!     → consumer.rs (single loop, decode once via envelope.rs)
//!     → ReplicaManager / ParameterManager / StatisticsAggregator
//! ```
//!
//! # Design Decisions
//! - Bodies decode into a closed enum at the boundary; handlers get typed payloads
//! - Malformed and unrecognized payloads are logged and dropped, never retried
//! - Subscriptions are re-established with bounded backoff

pub mod bridge;
pub mod broker;
pub mod consumer;
pub mod envelope;
pub mod publisher;

pub use bridge::FleetBridge;
pub use broker::{Broker, BrokerError, MemoryBroker, Subscription};
pub use consumer::{DispatchOutcome, EventConsumer, EventDispatcher, MessagingError};
pub use envelope::{Command, DecodeError, InboundEvent, ReplicaRef};
pub use publisher::{Applied, CommandPublisher, Delivery};

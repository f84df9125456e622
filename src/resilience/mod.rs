//! Resilience helpers for the broker connection.
//!
//! # Data Flow
//! ```text
//! Broker connection error:
//!     → backoff.rs (exponential delay with jitter)
//!     → event loop polls again, rumqttc reconnects
//! ```
//!
//! # Design Decisions
//! - UDP sends are fire-and-forget and never retried
//! - Only the broker connection backs off

pub mod backoff;

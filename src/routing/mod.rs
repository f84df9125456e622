//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound Event (topic, payload, received_at)
//!     → router.rs (snapshot lookup, orchestration)
//!     → matcher.rs (topic pattern match)
//!     → speed estimator (first speed-aware match)
//!     → trigger.rs (payload vs trigger value)
//!     → debounce.rs (per trigger-name window)
//!     → Return: RouteOutcome per matching mapping
//! ```
//!
//! # Design Decisions
//! - Mapping table read as an immutable snapshot per event
//! - No regex in hot path
//! - Deterministic: same input and state always give the same outcomes
//! - All matching mappings are evaluated, in table order

pub mod debounce;
pub mod matcher;
pub mod router;
pub mod trigger;

pub use debounce::{DebounceDecision, DebounceGate};
pub use matcher::{topic_matches, TopicFilter};
pub use router::{Event, RouteOutcome, Router};
pub use trigger::should_trigger;

//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Router / dispatcher produce:
//!     → events.rs (Notification → NotificationSink)
//!     → metrics.rs (counters, gauges)
//!     → logging.rs (structured log events)
//!
//! Consumers:
//!     → Log output (stdout, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//!     → External UIs via ChannelSink
//! ```
//!
//! # Design Decisions
//! - Notifications are data, not formatted strings
//! - Metrics are cheap (atomic increments)

pub mod events;
pub mod logging;
pub mod metrics;

pub use events::{ChannelSink, FanoutSink, MetricsSink, Notification, NotificationSink, TracingSink};

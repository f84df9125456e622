//! Message-bus ingestion.
//!
//! # Data Flow
//! ```text
//! MQTT broker
//!     → mqtt.rs event loop (poll, backoff on errors)
//!     → BusMessage::Publish(Event) over a bounded channel
//!     → bridge actor → Router::handle_event
//!
//! Mapping table change / reconnect:
//!     → MqttBus::sync_subscriptions (subscribe added, unsubscribe removed)
//! ```

pub mod mqtt;

pub use mqtt::{run_event_loop, BusError, BusMessage, MqttBus};

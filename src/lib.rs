//! MQTT to UDP bridge library.
//!
//! Routes publish/subscribe events to UDP datagrams according to a table of
//! mappings, with debounce, delayed sends and vehicle speed inference.

pub mod bridge;
pub mod bus;
pub mod config;
pub mod dispatch;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod routing;
pub mod speed;

pub use bridge::Bridge;
pub use config::schema::BridgeConfig;
pub use lifecycle::Shutdown;
pub use routing::{Event, Router};

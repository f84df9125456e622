//! Outbound datagram dispatch.
//!
//! # Data Flow
//! ```text
//! Router fire decision (mapping, topic, payload, speed?)
//!     → template.rs (render {payload} / {topic} / {speed})
//!     → scheduler.rs (UDP switch check, spawn immediate or delayed task)
//!     → sender.rs (ephemeral socket, send timeout, one datagram)
//! ```

pub mod scheduler;
pub mod sender;
pub mod template;

pub use scheduler::{DispatchOutcome, Dispatcher};
pub use sender::{send_with_timeout, DatagramSender, DispatchError, UdpSender};

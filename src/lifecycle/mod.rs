//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Shutdown (shutdown.rs):
//!     Signal received → broadcast → bus event loop and bridge actor exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger shutdown
//!     SIGHUP → Reload the configuration file
//! ```
//!
//! # Design Decisions
//! - In-flight datagram sends are not drained; they are fire-and-forget
//! - SIGHUP reload goes through the same path as file-watch reloads

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;

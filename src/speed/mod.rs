//! Vehicle speed inference.
//!
//! # Data Flow
//! ```text
//! {"Val": 1} on topic T  → Idle  → Armed(start, car_length, units)
//! {"Val": 0} on topic T  → Armed → Idle, speed = car_length / elapsed
//! ```
//!
//! # Design Decisions
//! - State is keyed by concrete topic, not by mapping
//! - Units and car length are captured when the topic arms
//! - No timeout: an armed topic waits until it is cleared or re-armed

pub mod estimator;

pub use estimator::{SpeedEstimator, SpeedMeasurement, SpeedObservation};

//! Per-topic speed estimation from sensor start/stop pairs.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde_json::Value;

use crate::config::schema::{Mapping, SpeedUnits};

/// Timing in progress for one topic.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Armed {
    start: Instant,
    car_length: f64,
    units: SpeedUnits,
}

/// A completed measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeedMeasurement {
    pub topic: String,
    /// Speed in meters per second.
    pub meters_per_sec: f64,
    pub units: SpeedUnits,
    pub car_length: f64,
    pub elapsed: Duration,
}

impl SpeedMeasurement {
    /// Speed converted into the configured units.
    pub fn value(&self) -> f64 {
        self.meters_per_sec * self.units.factor()
    }

    /// One decimal place plus unit suffix, e.g. `"4.5 m/s"`.
    pub fn formatted(&self) -> String {
        format!("{:.1} {}", self.value(), self.units)
    }
}

/// Result of feeding one event to the estimator.
#[derive(Debug, Clone, PartialEq)]
pub enum SpeedObservation {
    /// Not a sensor transition this estimator cares about.
    Ignored,
    /// `Val == 1`: timing started (or restarted) for the topic.
    Armed,
    /// `Val == 0` with non-positive elapsed time; state cleared, no result.
    Discarded,
    Measured(SpeedMeasurement),
}

/// Two-state (idle/armed) machine keyed by topic.
///
/// An armed topic that never sees `Val == 0` stays armed until the next
/// `Val == 1` overwrites it.
#[derive(Debug, Default)]
pub struct SpeedEstimator {
    armed: HashMap<String, Armed>,
}

impl SpeedEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one event. Only mappings with a positive `car_length` engage.
    pub fn observe(&mut self, topic: &str, payload: &str, now: Instant, mapping: &Mapping) -> SpeedObservation {
        if !mapping.tracks_speed() {
            return SpeedObservation::Ignored;
        }

        match sensor_val(payload) {
            Some(1) => {
                self.armed.insert(
                    topic.to_string(),
                    Armed {
                        start: now,
                        car_length: mapping.car_length,
                        units: mapping.speed_units,
                    },
                );
                SpeedObservation::Armed
            }
            Some(0) => match self.armed.remove(topic) {
                Some(armed) => complete(topic, armed, now),
                None => SpeedObservation::Ignored,
            },
            _ => SpeedObservation::Ignored,
        }
    }

    pub fn is_armed(&self, topic: &str) -> bool {
        self.armed.contains_key(topic)
    }

    pub fn clear(&mut self) {
        self.armed.clear();
    }
}

fn complete(topic: &str, armed: Armed, now: Instant) -> SpeedObservation {
    let elapsed = now.saturating_duration_since(armed.start);
    if elapsed.is_zero() {
        return SpeedObservation::Discarded;
    }

    SpeedObservation::Measured(SpeedMeasurement {
        topic: topic.to_string(),
        meters_per_sec: armed.car_length / elapsed.as_secs_f64(),
        units: armed.units,
        car_length: armed.car_length,
        elapsed,
    })
}

/// Integer `Val` field of a JSON object payload.
///
/// Integral floats, numeric strings and booleans are accepted the way
/// sensor gateways tend to emit them.
fn sensor_val(payload: &str) -> Option<i64> {
    let value: Value = serde_json::from_str(payload).ok()?;
    match value.as_object()?.get("Val")? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

//! Event routing.
//!
//! # Responsibilities
//! - Take one inbound event at a time
//! - Evaluate every mapping of the current snapshot against it
//! - Own the debounce and speed-tracking state
//! - Hand fire decisions to the dispatcher
//!
//! # Design Decisions
//! - `handle_event` takes `&mut self`: a single owner processes events in
//!   arrival order, so the state maps need no locks
//! - Speed is computed once per event, before trigger evaluation, from the
//!   first matching mapping with a car length; the result is attached to
//!   every mapping that fires for that event
//! - Every stage returns an explicit outcome; nothing here is fatal

use std::sync::Arc;
use std::time::Instant;

use crate::config::{Mapping, MappingTable};
use crate::dispatch::{DispatchOutcome, Dispatcher};
use crate::observability::metrics;
use crate::observability::{Notification, NotificationSink};
use crate::routing::debounce::{DebounceDecision, DebounceGate};
use crate::routing::matcher::topic_matches;
use crate::routing::trigger::should_trigger;
use crate::speed::{SpeedEstimator, SpeedObservation};

/// One message received from the bus.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub topic: String,
    pub payload: String,
    pub received_at: Instant,
}

impl Event {
    /// An event received now.
    pub fn new(topic: impl Into<String>, payload: impl Into<String>) -> Self {
        Self::at(topic, payload, Instant::now())
    }

    pub fn at(topic: impl Into<String>, payload: impl Into<String>, received_at: Instant) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
            received_at,
        }
    }

    /// Build from raw bytes; invalid UTF-8 is replaced rather than rejected.
    pub fn from_bytes(topic: impl Into<String>, payload: &[u8], received_at: Instant) -> Self {
        Self::at(topic, String::from_utf8_lossy(payload).into_owned(), received_at)
    }
}

/// What happened to one matching mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// The payload did not satisfy the trigger value.
    NotTriggered { trigger_name: String },
    /// Triggered inside the debounce window.
    Debounced { trigger_name: String },
    /// Fired and handed to the dispatcher.
    Fired {
        trigger_name: String,
        dispatch: DispatchOutcome,
    },
}

/// Routes events to datagrams.
pub struct Router {
    mappings: MappingTable,
    debounce: DebounceGate,
    speed: SpeedEstimator,
    dispatcher: Dispatcher,
    sink: Arc<dyn NotificationSink>,
}

impl Router {
    pub fn new(mappings: MappingTable, dispatcher: Dispatcher, sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            mappings,
            debounce: DebounceGate::new(),
            speed: SpeedEstimator::new(),
            dispatcher,
            sink,
        }
    }

    pub fn mappings(&self) -> &MappingTable {
        &self.mappings
    }

    /// Process one event against the current mapping snapshot.
    ///
    /// Returns one outcome per matching mapping, in table order.
    pub fn handle_event(&mut self, event: &Event) -> Vec<RouteOutcome> {
        metrics::record_event();

        let snapshot = self.mappings.snapshot();
        let matching: Vec<&Mapping> = snapshot
            .iter()
            .filter(|m| topic_matches(&m.topic_pattern, &event.topic))
            .collect();

        if matching.is_empty() {
            tracing::trace!(topic = %event.topic, "No mapping for topic");
            return Vec::new();
        }

        let speed = self.observe_speed(event, &matching);

        matching
            .into_iter()
            .map(|mapping| self.route(mapping, event, speed.as_deref()))
            .collect()
    }

    /// Forget all debounce and speed-tracking state.
    pub fn clear_state(&mut self) {
        self.debounce.clear();
        self.speed.clear();
    }

    fn observe_speed(&mut self, event: &Event, matching: &[&Mapping]) -> Option<String> {
        let mapping = matching.iter().find(|m| m.tracks_speed())?;

        match self.speed.observe(&event.topic, &event.payload, event.received_at, mapping) {
            SpeedObservation::Armed => {
                self.sink.notify(Notification::VehicleDetected {
                    topic: event.topic.clone(),
                });
                None
            }
            SpeedObservation::Measured(measurement) => {
                metrics::record_speed_measurement();
                let speed = measurement.formatted();
                self.sink.notify(Notification::SpeedMeasured {
                    topic: measurement.topic,
                    speed: speed.clone(),
                    car_length: measurement.car_length,
                    elapsed: measurement.elapsed,
                });
                Some(speed)
            }
            SpeedObservation::Discarded => {
                tracing::debug!(topic = %event.topic, "Discarded speed measurement with no elapsed time");
                None
            }
            SpeedObservation::Ignored => None,
        }
    }

    fn route(&mut self, mapping: &Mapping, event: &Event, speed: Option<&str>) -> RouteOutcome {
        let trigger_name = mapping.trigger_name.clone();

        if !should_trigger(&event.payload, &mapping.trigger_value) {
            return RouteOutcome::NotTriggered { trigger_name };
        }

        match self.debounce.allow(&trigger_name, event.received_at, mapping.timeout()) {
            DebounceDecision::TooSoon { elapsed, required } => {
                metrics::record_debounced(&trigger_name);
                self.sink.notify(Notification::DebounceSuppressed {
                    trigger_name: trigger_name.clone(),
                    elapsed,
                    required,
                });
                RouteOutcome::Debounced { trigger_name }
            }
            DebounceDecision::Allowed => {
                metrics::record_fire(&trigger_name);
                let dispatch = self.dispatcher.dispatch(mapping, &event.topic, &event.payload, speed);
                RouteOutcome::Fired { trigger_name, dispatch }
            }
        }
    }
}

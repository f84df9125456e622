//! Immediate and delayed datagram dispatch.
//!
//! # Responsibilities
//! - Render the mapping template for one firing
//! - Honor the global UDP switch at scheduling time
//! - Run every send on its own task so ingestion never waits on the network
//!
//! # Design Decisions
//! - Message and target are captured when the send is scheduled; a delayed
//!   send fires even if UDP is disabled or the mapping is edited meanwhile
//! - Spawned sends have no cancellation path and no return channel
//! - Failures end as a `TransportError` notification, never as an error
//!   returned to the router

use std::sync::Arc;
use std::time::Duration;

use crate::config::{Mapping, UdpSwitch, UdpTarget};
use crate::dispatch::sender::DatagramSender;
use crate::dispatch::template::render;
use crate::observability::metrics;
use crate::observability::{Notification, NotificationSink};

/// What the dispatcher did with a firing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// UDP is disabled; nothing was scheduled.
    Suppressed,
    /// A send task was spawned and will run right away.
    Immediate,
    /// A send task was spawned and will run after `delay`.
    Delayed { delay: Duration },
}

/// A fully built datagram waiting to go out.
#[derive(Debug, Clone)]
struct PendingSend {
    trigger_name: String,
    target: UdpTarget,
    message: String,
    delay: Duration,
    speed: Option<String>,
}

/// Builds outbound messages and spawns their sends.
///
/// Must be used from within a Tokio runtime.
#[derive(Clone)]
pub struct Dispatcher {
    sender: Arc<dyn DatagramSender>,
    udp: UdpSwitch,
    sink: Arc<dyn NotificationSink>,
}

impl Dispatcher {
    pub fn new(sender: Arc<dyn DatagramSender>, udp: UdpSwitch, sink: Arc<dyn NotificationSink>) -> Self {
        Self { sender, udp, sink }
    }

    /// Dispatch one firing of `mapping` for the event `(topic, payload)`.
    pub fn dispatch(&self, mapping: &Mapping, topic: &str, payload: &str, speed: Option<&str>) -> DispatchOutcome {
        if !self.udp.is_enabled() {
            self.sink.notify(Notification::SendSuppressed {
                trigger_name: mapping.trigger_name.clone(),
            });
            return DispatchOutcome::Suppressed;
        }

        let pending = PendingSend {
            trigger_name: mapping.trigger_name.clone(),
            target: mapping.target(),
            message: render(&mapping.udp_message, topic, payload, speed),
            delay: mapping.udp_delay(),
            speed: speed.map(str::to_string),
        };

        self.sink.notify(Notification::Fired {
            trigger_name: pending.trigger_name.clone(),
            target: pending.target.clone(),
            delay: pending.delay,
            speed: pending.speed.clone(),
        });

        let outcome = if pending.delay.is_zero() {
            DispatchOutcome::Immediate
        } else {
            DispatchOutcome::Delayed { delay: pending.delay }
        };

        tokio::spawn(run_send(self.sender.clone(), self.sink.clone(), pending));
        outcome
    }
}

async fn run_send(sender: Arc<dyn DatagramSender>, sink: Arc<dyn NotificationSink>, pending: PendingSend) {
    let delayed = !pending.delay.is_zero();
    if delayed {
        tokio::time::sleep(pending.delay).await;
    }

    match sender.send(&pending.target, pending.message.as_bytes()).await {
        Ok(()) => {
            metrics::record_send(true);
            tracing::trace!(trigger = %pending.trigger_name, target = %pending.target, "Datagram sent");
            if delayed {
                sink.notify(Notification::DelayedSendCompleted {
                    trigger_name: pending.trigger_name,
                    target: pending.target,
                    speed: pending.speed,
                });
            }
        }
        Err(e) => {
            metrics::record_send(false);
            sink.notify(Notification::TransportError {
                trigger_name: pending.trigger_name,
                target: pending.target,
                error: e.to_string(),
            });
        }
    }
}

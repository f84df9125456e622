//! Structured status notifications emitted by the engine.
//!
//! The router and dispatcher never format log lines for a UI; they emit a
//! [`Notification`] to a [`NotificationSink`] and let the sink decide how
//! to present it.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::config::UdpTarget;
use crate::observability::metrics;

/// One reportable engine event.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// A mapping fired and its datagram was handed to the sender.
    Fired {
        trigger_name: String,
        target: UdpTarget,
        delay: Duration,
        speed: Option<String>,
    },
    /// A mapping matched but fired again inside its debounce window.
    DebounceSuppressed {
        trigger_name: String,
        elapsed: Duration,
        required: Duration,
    },
    /// A mapping fired while UDP sending was globally disabled.
    SendSuppressed { trigger_name: String },
    /// A delayed datagram went out.
    DelayedSendCompleted {
        trigger_name: String,
        target: UdpTarget,
        speed: Option<String>,
    },
    /// A datagram could not be sent.
    TransportError {
        trigger_name: String,
        target: UdpTarget,
        error: String,
    },
    /// A speed-tracking topic armed.
    VehicleDetected { topic: String },
    /// A start/stop pair completed.
    SpeedMeasured {
        topic: String,
        speed: String,
        car_length: f64,
        elapsed: Duration,
    },
}

impl Notification {
    /// Short machine-readable kind, used as a metrics/log label.
    pub fn kind(&self) -> &'static str {
        match self {
            Notification::Fired { .. } => "fired",
            Notification::DebounceSuppressed { .. } => "debounce_suppressed",
            Notification::SendSuppressed { .. } => "send_suppressed",
            Notification::DelayedSendCompleted { .. } => "delayed_send_completed",
            Notification::TransportError { .. } => "transport_error",
            Notification::VehicleDetected { .. } => "vehicle_detected",
            Notification::SpeedMeasured { .. } => "speed_measured",
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notification::Fired { trigger_name, target, delay, speed } => {
                if delay.is_zero() {
                    write!(f, "{} triggered → Sent to {}", trigger_name, target)?;
                } else {
                    write!(
                        f,
                        "{} triggered → Sending to {} in {:.1}s",
                        trigger_name,
                        target,
                        delay.as_secs_f64()
                    )?;
                }
                if let Some(speed) = speed {
                    write!(f, " (Speed: {})", speed)?;
                }
                Ok(())
            }
            Notification::DebounceSuppressed { trigger_name, elapsed, required } => write!(
                f,
                "{} ignored → Too soon ({:.1}s < {:.1}s timeout)",
                trigger_name,
                elapsed.as_secs_f64(),
                required.as_secs_f64()
            ),
            Notification::SendSuppressed { trigger_name } => {
                write!(f, "{} triggered → UDP disabled", trigger_name)
            }
            Notification::DelayedSendCompleted { trigger_name, target, speed } => {
                write!(f, "{} delayed send completed to {}", trigger_name, target)?;
                if let Some(speed) = speed {
                    write!(f, " (Speed: {})", speed)?;
                }
                Ok(())
            }
            Notification::TransportError { target, error, .. } => {
                write!(f, "UDP send failed to {}: {}", target, error)
            }
            Notification::VehicleDetected { topic } => write!(f, "Vehicle detected on {}", topic),
            Notification::SpeedMeasured { topic, speed, car_length, elapsed } => write!(
                f,
                "Vehicle passed {}: {} (length: {}m, time: {:.2}s)",
                topic,
                speed,
                car_length,
                elapsed.as_secs_f64()
            ),
        }
    }
}

/// Receiver of engine notifications. Must not block.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Logs every notification through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, notification: Notification) {
        let kind = notification.kind();
        match &notification {
            Notification::TransportError { trigger_name, target, error } => {
                tracing::warn!(kind, trigger = %trigger_name, target = %target, error = %error, "{}", notification);
            }
            Notification::DebounceSuppressed { trigger_name, .. }
            | Notification::SendSuppressed { trigger_name } => {
                tracing::debug!(kind, trigger = %trigger_name, "{}", notification);
            }
            _ => tracing::info!(kind, "{}", notification),
        }
    }
}

/// Forwards notifications into an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl NotificationSink for ChannelSink {
    fn notify(&self, notification: Notification) {
        // Receiver gone means nobody is listening anymore.
        let _ = self.tx.send(notification);
    }
}

/// Counts notifications by kind in `bridge_notifications_total`.
#[derive(Debug, Default, Clone, Copy)]
pub struct MetricsSink;

impl NotificationSink for MetricsSink {
    fn notify(&self, notification: Notification) {
        metrics::record_notification(notification.kind());
    }
}

/// Delivers each notification to several sinks in order.
#[derive(Default, Clone)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn NotificationSink>>,
}

impl FanoutSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl NotificationSink for FanoutSink {
    fn notify(&self, notification: Notification) {
        if let Some((last, rest)) = self.sinks.split_last() {
            for sink in rest {
                sink.notify(notification.clone());
            }
            last.notify(notification);
        }
    }
}

//! MQTT client adapter built on rumqttc.
//!
//! # Responsibilities
//! - Build client options from `[broker]`
//! - Keep broker subscriptions in step with the mapping table
//! - Poll the event loop and forward publishes as router events
//!
//! # Design Decisions
//! - Subscriptions are tracked locally and diffed on every sync
//! - Subscribe/unsubscribe calls run on a worker task in request order; a
//!   sync never waits on the client's request channel, which the event loop
//!   only drains while the bridge keeps draining the event channel
//! - A ConnAck clears the tracked set so a fresh session resubscribes all
//! - Connection errors back off and keep polling; rumqttc reconnects on
//!   the next poll

use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use rumqttc::{AsyncClient, EventLoop, MqttOptions, Packet, QoS};
use thiserror::Error;
use tokio::sync::{broadcast, mpsc};
use uuid::Uuid;

use crate::config::{BrokerConfig, Mapping};
use crate::resilience::backoff::Backoff;
use crate::routing::Event;

/// Capacity of the rumqttc request channel.
const REQUEST_CAPACITY: usize = 32;

/// Errors raised by the bus adapter.
#[derive(Debug, Error)]
pub enum BusError {
    #[error("MQTT client error: {0}")]
    Client(#[from] rumqttc::ClientError),
}

/// What the event loop reports to the bridge.
#[derive(Debug, Clone, PartialEq)]
pub enum BusMessage {
    /// A (re)connect completed; subscriptions must be re-established.
    Connected,
    /// The connection dropped; the loop is backing off.
    Disconnected,
    Publish(Event),
}

/// Subscription changes applied by one sync.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SubscriptionPlan {
    pub subscribe: Vec<String>,
    pub unsubscribe: Vec<String>,
}

impl SubscriptionPlan {
    pub fn is_empty(&self) -> bool {
        self.subscribe.is_empty() && self.unsubscribe.is_empty()
    }
}

/// Diff the currently subscribed patterns against the wanted mappings.
pub fn plan_subscriptions(current: &BTreeSet<String>, mappings: &[Mapping]) -> SubscriptionPlan {
    let wanted: BTreeSet<String> = mappings.iter().map(|m| m.topic_pattern.clone()).collect();

    SubscriptionPlan {
        subscribe: wanted.difference(current).cloned().collect(),
        unsubscribe: current.difference(&wanted).cloned().collect(),
    }
}

/// Client options for `config`, with a random client id when none is set.
pub fn mqtt_options(config: &BrokerConfig) -> MqttOptions {
    let client_id = config
        .client_id
        .clone()
        .unwrap_or_else(|| format!("mqtt-udp-bridge-{}", Uuid::new_v4()));

    let mut options = MqttOptions::new(client_id, &config.address, config.port);
    options.set_keep_alive(Duration::from_secs(config.keep_alive_secs.max(5)));
    options.set_clean_session(true);

    if let (Some(username), Some(password)) = (&config.username, &config.password) {
        options.set_credentials(username, password);
    }
    options
}

#[derive(Debug)]
enum SubscriptionRequest {
    Subscribe(String),
    Unsubscribe(String),
}

/// Handle for issuing subscribe/unsubscribe requests.
pub struct MqttBus {
    client: AsyncClient,
    subscribed: BTreeSet<String>,
    requests: mpsc::UnboundedSender<SubscriptionRequest>,
}

impl MqttBus {
    /// Create the client and its subscription worker.
    ///
    /// Must be called within a Tokio runtime. Nothing connects until the
    /// event loop is polled.
    pub fn connect(config: &BrokerConfig) -> (Self, EventLoop) {
        let (client, eventloop) = AsyncClient::new(mqtt_options(config), REQUEST_CAPACITY);
        let (requests, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_subscription_worker(client.clone(), rx));
        (
            Self {
                client,
                subscribed: BTreeSet::new(),
                requests,
            },
            eventloop,
        )
    }

    pub fn subscribed(&self) -> &BTreeSet<String> {
        &self.subscribed
    }

    /// Forget tracked subscriptions, e.g. after the session was lost.
    pub fn reset(&mut self) {
        self.subscribed.clear();
    }

    /// Queue subscriptions for new patterns and drop removed ones.
    ///
    /// Returns without waiting for the client; the worker issues the
    /// requests in order.
    pub fn sync_subscriptions(&mut self, mappings: &[Mapping]) -> SubscriptionPlan {
        let plan = plan_subscriptions(&self.subscribed, mappings);

        for pattern in &plan.subscribe {
            if self.requests.send(SubscriptionRequest::Subscribe(pattern.clone())).is_ok() {
                self.subscribed.insert(pattern.clone());
            } else {
                tracing::warn!(pattern = %pattern, "Subscription worker stopped; not subscribing");
            }
        }

        for pattern in &plan.unsubscribe {
            let _ = self.requests.send(SubscriptionRequest::Unsubscribe(pattern.clone()));
            self.subscribed.remove(pattern);
        }

        if !plan.is_empty() {
            tracing::debug!(
                added = plan.subscribe.len(),
                removed = plan.unsubscribe.len(),
                total = self.subscribed.len(),
                "Subscriptions updated"
            );
        }
        plan
    }

    /// Publish one message. Used by the CLI tools.
    pub async fn publish(&self, topic: &str, payload: impl Into<Vec<u8>>) -> Result<(), BusError> {
        self.client
            .publish(topic, QoS::AtLeastOnce, false, payload)
            .await?;
        Ok(())
    }

    pub async fn disconnect(&self) -> Result<(), BusError> {
        self.client.disconnect().await?;
        Ok(())
    }

    /// Queue a disconnect without waiting for room in the request channel.
    pub fn try_disconnect(&self) -> Result<(), BusError> {
        self.client.try_disconnect()?;
        Ok(())
    }
}

/// Issue queued requests until the owning [`MqttBus`] is dropped.
async fn run_subscription_worker(client: AsyncClient, mut rx: mpsc::UnboundedReceiver<SubscriptionRequest>) {
    while let Some(request) = rx.recv().await {
        let result = match &request {
            SubscriptionRequest::Subscribe(pattern) => client.subscribe(pattern.as_str(), QoS::AtMostOnce).await,
            SubscriptionRequest::Unsubscribe(pattern) => client.unsubscribe(pattern.as_str()).await,
        };
        if let Err(e) = result {
            tracing::warn!(?request, error = %e, "Subscription request failed");
        }
    }
}

/// Poll `eventloop` until shutdown or until the receiver goes away.
pub async fn run_event_loop(
    mut eventloop: EventLoop,
    tx: mpsc::Sender<BusMessage>,
    mut shutdown: broadcast::Receiver<()>,
) {
    let backoff = Backoff::default();
    let mut failures = 0u32;

    loop {
        tokio::select! {
            polled = eventloop.poll() => {
                let message = match polled {
                    Ok(rumqttc::Event::Incoming(Packet::ConnAck(_))) => {
                        failures = 0;
                        tracing::info!("Connected to MQTT broker");
                        Some(BusMessage::Connected)
                    }
                    Ok(rumqttc::Event::Incoming(Packet::Publish(publish))) => Some(BusMessage::Publish(
                        Event::from_bytes(publish.topic, &publish.payload, Instant::now()),
                    )),
                    Ok(_) => None,
                    Err(e) => {
                        failures = failures.saturating_add(1);
                        let delay = backoff.delay(failures);
                        tracing::warn!(error = %e, attempt = failures, ?delay, "MQTT connection error, retrying");
                        if failures == 1 && tx.send(BusMessage::Disconnected).await.is_err() {
                            break;
                        }
                        tokio::select! {
                            _ = tokio::time::sleep(delay) => {}
                            _ = shutdown.recv() => break,
                        }
                        None
                    }
                };

                if let Some(message) = message {
                    if tx.send(message).await.is_err() {
                        break;
                    }
                }
            }
            _ = shutdown.recv() => {
                tracing::info!("MQTT event loop received shutdown signal, exiting loop");
                break;
            }
        }
    }
}

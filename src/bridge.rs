//! The bridge actor: owns the router and serializes everything that touches it.
//!
//! # Data Flow
//! ```text
//! bus event loop ──BusMessage──┐
//! config watcher ──BridgeConfig─┼─▶ Bridge::run (one task) ─▶ Router
//! shutdown ────────────────────┘
//! ```
//!
//! # Design Decisions
//! - Events are handled one at a time in arrival order; the router's
//!   debounce and speed maps are never shared
//! - Reloads swap the mapping table and UDP switch, then resync subscriptions
//! - Broker settings are read once; changing them needs a restart

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};

use crate::bus::{BusMessage, MqttBus};
use crate::config::{BridgeConfig, BrokerConfig, MappingTable, UdpSwitch};
use crate::dispatch::{DatagramSender, Dispatcher};
use crate::observability::metrics;
use crate::observability::NotificationSink;
use crate::routing::{Event, RouteOutcome, Router};

/// Summary of one applied reload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReloadSummary {
    pub old_mappings: usize,
    pub new_mappings: usize,
    pub udp_enabled: bool,
}

/// Routes bus traffic through a [`Router`] and applies config reloads.
pub struct Bridge {
    router: Router,
    udp: UdpSwitch,
    broker: BrokerConfig,
    bus: Option<MqttBus>,
    bus_rx: Option<mpsc::Receiver<BusMessage>>,
}

impl Bridge {
    pub fn new(config: BridgeConfig, sender: Arc<dyn DatagramSender>, sink: Arc<dyn NotificationSink>) -> Self {
        let udp = UdpSwitch::new(config.udp.enabled);
        let dispatcher = Dispatcher::new(sender, udp.clone(), sink.clone());
        let mappings = MappingTable::new(config.mappings);
        metrics::record_mapping_count(mappings.len());

        Self {
            router: Router::new(mappings, dispatcher, sink),
            udp,
            broker: config.broker,
            bus: None,
            bus_rx: None,
        }
    }

    /// Attach a bus client and the channel its event loop feeds.
    pub fn with_bus(mut self, bus: MqttBus, rx: mpsc::Receiver<BusMessage>) -> Self {
        self.bus = Some(bus);
        self.bus_rx = Some(rx);
        self
    }

    pub fn udp_switch(&self) -> UdpSwitch {
        self.udp.clone()
    }

    pub fn mappings(&self) -> &MappingTable {
        self.router.mappings()
    }

    /// Route one event directly.
    pub fn handle_event(&mut self, event: &Event) -> Vec<RouteOutcome> {
        self.router.handle_event(event)
    }

    /// Apply a reloaded configuration.
    pub fn apply_config(&mut self, config: BridgeConfig) -> ReloadSummary {
        if config.broker.address != self.broker.address || config.broker.port != self.broker.port {
            tracing::warn!(
                current = %format!("{}:{}", self.broker.address, self.broker.port),
                requested = %format!("{}:{}", config.broker.address, config.broker.port),
                "Broker settings changed; restart to apply"
            );
        }

        let old = self.router.mappings().replace(config.mappings);
        self.udp.set(config.udp.enabled);

        let summary = ReloadSummary {
            old_mappings: old.len(),
            new_mappings: self.router.mappings().len(),
            udp_enabled: config.udp.enabled,
        };
        metrics::record_mapping_count(summary.new_mappings);

        self.sync_subscriptions();

        tracing::info!(
            udp_enabled = summary.udp_enabled,
            "Reloaded: {} → {} mappings",
            summary.old_mappings,
            summary.new_mappings
        );
        summary
    }

    fn sync_subscriptions(&mut self) {
        if let Some(bus) = self.bus.as_mut() {
            let snapshot = self.router.mappings().snapshot();
            bus.sync_subscriptions(&snapshot);
        }
    }

    fn handle_bus_message(&mut self, message: BusMessage) {
        match message {
            BusMessage::Connected => {
                if let Some(bus) = self.bus.as_mut() {
                    bus.reset();
                }
                self.sync_subscriptions();
                if let Some(bus) = &self.bus {
                    tracing::info!(patterns = bus.subscribed().len(), "Subscriptions requested after connect");
                }
            }
            BusMessage::Disconnected => {
                tracing::warn!("Unexpected disconnection from MQTT broker");
            }
            BusMessage::Publish(event) => {
                self.router.handle_event(&event);
            }
        }
    }

    /// Run until shutdown.
    pub async fn run(
        mut self,
        mut config_updates: mpsc::UnboundedReceiver<BridgeConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        tracing::info!(
            mappings = self.router.mappings().len(),
            broker = %format!("{}:{}", self.broker.address, self.broker.port),
            bus = self.bus.is_some(),
            udp_enabled = self.udp.is_enabled(),
            "Bridge running"
        );

        let mut bus_rx = self.bus_rx.take();

        loop {
            tokio::select! {
                message = next_bus_message(&mut bus_rx) => match message {
                    Some(message) => self.handle_bus_message(message),
                    None => {
                        tracing::warn!("MQTT event loop stopped; no more events will arrive");
                        bus_rx = None;
                    }
                },
                Some(config) = config_updates.recv() => {
                    self.apply_config(config);
                }
                _ = shutdown.recv() => {
                    tracing::info!("Bridge received shutdown signal, exiting loop");
                    break;
                }
            }
        }

        if let Some(bus) = &self.bus {
            if let Err(e) = bus.try_disconnect() {
                tracing::debug!(error = %e, "MQTT disconnect failed");
            }
        }
    }
}

/// Next bus message, or pending forever when there is no bus.
async fn next_bus_message(rx: &mut Option<mpsc::Receiver<BusMessage>>) -> Option<BusMessage> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Mapping, UdpTarget};
    use crate::dispatch::DispatchError;
    use crate::observability::TracingSink;
    use async_trait::async_trait;

    struct Recording(mpsc::UnboundedSender<String>);

    #[async_trait]
    impl DatagramSender for Recording {
        async fn send(&self, _target: &UdpTarget, payload: &[u8]) -> Result<(), DispatchError> {
            let _ = self.0.send(String::from_utf8_lossy(payload).into_owned());
            Ok(())
        }
    }

    fn config_with(mappings: Vec<Mapping>, udp_enabled: bool) -> BridgeConfig {
        let mut config = BridgeConfig::default();
        config.mappings = mappings;
        config.udp.enabled = udp_enabled;
        config
    }

    #[test]
    fn test_apply_config_swaps_table_and_switch() {
        let (tx, _sent) = mpsc::unbounded_channel();
        let mut bridge = Bridge::new(
            config_with(vec![Mapping::new("A", "a", "127.0.0.1", 5005)], true),
            Arc::new(Recording(tx)),
            Arc::new(TracingSink),
        );

        let summary = bridge.apply_config(config_with(
            vec![
                Mapping::new("B", "b", "127.0.0.1", 5005),
                Mapping::new("C", "c", "127.0.0.1", 5005),
            ],
            false,
        ));

        assert_eq!(summary, ReloadSummary { old_mappings: 1, new_mappings: 2, udp_enabled: false });
        assert!(!bridge.udp_switch().is_enabled());
        assert!(bridge.handle_event(&Event::new("a", "x")).is_empty());
    }

    #[tokio::test]
    async fn test_run_routes_bus_events_until_shutdown() {
        let (tx, mut sent) = mpsc::unbounded_channel();
        let bridge = Bridge::new(
            config_with(vec![Mapping::new("A", "a/+", "127.0.0.1", 5005)], true),
            Arc::new(Recording(tx)),
            Arc::new(TracingSink),
        );

        let (bus_tx, bus_rx) = mpsc::channel(8);
        let (_config_tx, config_rx) = mpsc::unbounded_channel();
        let shutdown = crate::lifecycle::Shutdown::new();

        let mut bridge = bridge;
        bridge.bus_rx = Some(bus_rx);
        let task = tokio::spawn(bridge.run(config_rx, shutdown.subscribe()));

        bus_tx.send(BusMessage::Publish(Event::new("a/1", "hello"))).await.unwrap();
        assert_eq!(sent.recv().await.unwrap(), "hello");

        shutdown.trigger();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_events_flow_while_subscriptions_are_pending() {
        let (tx, mut sent) = mpsc::unbounded_channel();
        let many: Vec<Mapping> = (0..100)
            .map(|i| Mapping::new(format!("M{}", i), format!("sensors/{}", i), "127.0.0.1", 5005))
            .collect();

        // The rumqttc event loop is never polled, so its request channel stays full.
        let (bus, _eventloop) = MqttBus::connect(&BrokerConfig::default());
        let (bus_tx, bus_rx) = mpsc::channel(8);
        let bridge = Bridge::new(config_with(many, true), Arc::new(Recording(tx)), Arc::new(TracingSink))
            .with_bus(bus, bus_rx);

        let (_config_tx, config_rx) = mpsc::unbounded_channel();
        let shutdown = crate::lifecycle::Shutdown::new();
        let task = tokio::spawn(bridge.run(config_rx, shutdown.subscribe()));

        bus_tx.send(BusMessage::Connected).await.unwrap();
        bus_tx.send(BusMessage::Publish(Event::new("sensors/42", "car"))).await.unwrap();
        let datagram = tokio::time::timeout(std::time::Duration::from_secs(2), sent.recv())
            .await
            .expect("bridge stalled on subscriptions");
        assert_eq!(datagram.unwrap(), "car");

        shutdown.trigger();
        task.await.unwrap();
    }
}

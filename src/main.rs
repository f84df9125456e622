//! MQTT to UDP bridge (v1)
//!
//! Subscribes to the topic patterns of every configured mapping and turns
//! matching messages into UDP datagrams.
//!
//! # Architecture Overview
//!
//! ```text
//!   MQTT broker
//!       │
//!       ▼
//!   ┌──────────────┐    ┌──────────────┐    ┌──────────────────────────┐
//!   │ bus (rumqttc │───▶│ bridge actor │───▶│ routing                  │
//!   │  event loop) │    │              │    │ matcher / trigger /      │
//!   └──────────────┘    └──────────────┘    │ debounce / speed         │
//!                              ▲            └────────────┬─────────────┘
//!                              │                         │
//!                       ┌──────┴───────┐                 ▼
//!                       │ config       │          ┌──────────────┐
//!                       │ watcher/HUP  │          │ dispatch     │
//!                       └──────────────┘          │ task / delay │
//!                                                 └──────┬───────┘
//!                                                        ▼
//!                                                  UDP datagrams
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::mpsc;

use mqtt_udp_bridge::bus::{run_event_loop, MqttBus};
use mqtt_udp_bridge::config::load_config;
use mqtt_udp_bridge::config::watcher::ConfigWatcher;
use mqtt_udp_bridge::dispatch::UdpSender;
use mqtt_udp_bridge::lifecycle::{signals, Shutdown};
use mqtt_udp_bridge::observability::{logging, metrics, FanoutSink, MetricsSink, TracingSink};
use mqtt_udp_bridge::Bridge;

/// Capacity of the bus → bridge event channel.
const EVENT_QUEUE: usize = 1024;

#[derive(Parser)]
#[command(name = "mqtt-udp-bridge")]
#[command(about = "Route MQTT messages to UDP datagrams", long_about = None)]
struct Args {
    /// Configuration file (TOML, or a JSON map file).
    #[arg(short, long, default_value = "bridge.toml")]
    config: PathBuf,

    /// Start with UDP sending disabled.
    #[arg(long)]
    no_udp: bool,

    /// Reload the configuration when the file changes.
    #[arg(long)]
    watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = load_config(&args.config)?;
    logging::init_logging(&config.logging);

    tracing::info!("mqtt-udp-bridge v{} starting", env!("CARGO_PKG_VERSION"));

    if args.no_udp {
        config.udp.enabled = false;
    }

    tracing::info!(
        path = %args.config.display(),
        mappings = config.mappings.len(),
        broker = %format!("{}:{}", config.broker.address, config.broker.port),
        udp_enabled = config.udp.enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();

    let (watcher, config_updates) = ConfigWatcher::new(&args.config);
    let _file_watch = if args.watch { Some(watcher.run()?) } else { None };
    signals::spawn_reload_on_hangup(watcher.clone(), shutdown.subscribe());

    let sender = Arc::new(UdpSender::new(config.udp.send_timeout()));
    let auto_connect = config.broker.auto_connect;
    let broker = config.broker.clone();
    let sink = FanoutSink::new()
        .with(Arc::new(TracingSink))
        .with(Arc::new(MetricsSink));
    let mut bridge = Bridge::new(config, sender, Arc::new(sink));

    if auto_connect {
        let (bus, eventloop) = MqttBus::connect(&broker);
        let (bus_tx, bus_rx) = mpsc::channel(EVENT_QUEUE);
        tokio::spawn(run_event_loop(eventloop, bus_tx, shutdown.subscribe()));
        bridge = bridge.with_bus(bus, bus_rx);
    } else {
        tracing::warn!("broker.auto_connect is false; not connecting to MQTT");
    }

    let bridge_task = tokio::spawn(bridge.run(config_updates, shutdown.subscribe()));

    signals::shutdown_signal().await;
    shutdown.trigger();
    bridge_task.await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

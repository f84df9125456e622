use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::net::UdpSocket;
use tokio::sync::broadcast;

use mqtt_udp_bridge::bus::{run_event_loop, BusMessage, MqttBus};
use mqtt_udp_bridge::config::{load_config, BrokerConfig};

#[derive(Parser)]
#[command(name = "bridge-cli")]
#[command(about = "Test and inspection tools for the MQTT to UDP bridge", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct BrokerArgs {
    #[arg(short, long, default_value = "localhost")]
    broker: String,

    #[arg(short, long, default_value_t = 1883)]
    port: u16,
}

impl BrokerArgs {
    fn to_config(&self) -> BrokerConfig {
        BrokerConfig {
            address: self.broker.clone(),
            port: self.port,
            ..BrokerConfig::default()
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a configuration file and print its mappings
    Check {
        #[arg(short, long, default_value = "bridge.toml")]
        config: PathBuf,
    },
    /// Print every datagram received on a UDP address
    Listen {
        #[arg(short, long, default_value = "0.0.0.0:5005")]
        bind: String,
    },
    /// Publish one MQTT message
    Publish {
        #[command(flatten)]
        broker: BrokerArgs,
        #[arg(short, long)]
        topic: String,
        #[arg(short = 'm', long)]
        payload: String,
    },
    /// Publish {"Val":1} then {"Val":0} to simulate a vehicle crossing a sensor
    SimulateVehicle {
        #[command(flatten)]
        broker: BrokerArgs,
        #[arg(short, long)]
        topic: String,
        /// Seconds between the two sensor states
        #[arg(short, long, default_value_t = 0.5)]
        seconds: f64,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check { config } => {
            let config = load_config(&config)?;
            println!("{}", serde_json::to_string_pretty(&config.mappings)?);
            eprintln!("{} mappings OK", config.mappings.len());
        }
        Commands::Listen { bind } => {
            let socket = UdpSocket::bind(&bind).await?;
            eprintln!("Listening on {}", socket.local_addr()?);
            let mut buf = vec![0u8; 65_535];
            loop {
                let (len, from) = socket.recv_from(&mut buf).await?;
                println!("{} {}", from, String::from_utf8_lossy(&buf[..len]));
            }
        }
        Commands::Publish { broker, topic, payload } => {
            publish_all(&broker.to_config(), &[(topic, payload, Duration::ZERO)]).await?;
        }
        Commands::SimulateVehicle { broker, topic, seconds } => {
            let gap = Duration::try_from_secs_f64(seconds)?;
            let messages = [
                (topic.clone(), r#"{"Val":1}"#.to_string(), Duration::ZERO),
                (topic, r#"{"Val":0}"#.to_string(), gap),
            ];
            publish_all(&broker.to_config(), &messages).await?;
        }
    }

    Ok(())
}

/// Connect, publish each message after its delay, then disconnect.
async fn publish_all(
    broker: &BrokerConfig,
    messages: &[(String, String, Duration)],
) -> Result<(), Box<dyn std::error::Error>> {
    let (bus, eventloop) = MqttBus::connect(broker);
    let (tx, mut rx) = tokio::sync::mpsc::channel(16);
    let (stop_tx, stop_rx) = broadcast::channel(1);
    let event_loop = tokio::spawn(run_event_loop(eventloop, tx, stop_rx));

    match tokio::time::timeout(Duration::from_secs(5), rx.recv()).await {
        Ok(Some(BusMessage::Connected)) => {}
        _ => return Err(format!("could not connect to {}:{}", broker.address, broker.port).into()),
    }

    for (topic, payload, delay) in messages {
        tokio::time::sleep(*delay).await;
        bus.publish(topic, payload.clone()).await?;
        println!("Published to {}: {}", topic, payload);
    }

    // Let the event loop flush the outgoing publishes.
    tokio::time::sleep(Duration::from_millis(200)).await;
    bus.disconnect().await?;
    let _ = stop_tx.send(());
    let _ = event_loop.await;
    Ok(())
}

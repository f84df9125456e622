//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the bridge.
//! All types derive Serde traits for deserialization from config files.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the bridge.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct BridgeConfig {
    /// MQTT broker connection settings.
    pub broker: BrokerConfig,

    /// Outbound UDP settings.
    pub udp: UdpConfig,

    /// Logging settings.
    pub logging: LoggingConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Routing rules, evaluated in order for every event.
    pub mappings: Vec<Mapping>,
}

/// MQTT broker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BrokerConfig {
    /// Broker host name or address.
    pub address: String,

    /// Broker TCP port.
    pub port: u16,

    /// Client identifier. A random one is generated when unset.
    pub client_id: Option<String>,

    /// MQTT keep-alive interval in seconds.
    pub keep_alive_secs: u64,

    pub username: Option<String>,
    pub password: Option<String>,

    /// Connect to the broker on startup.
    pub auto_connect: bool,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            address: "localhost".to_string(),
            port: 1883,
            client_id: None,
            keep_alive_secs: 60,
            username: None,
            password: None,
            auto_connect: true,
        }
    }
}

/// Outbound UDP configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UdpConfig {
    /// Global send switch. When false, fires are reported but nothing is sent.
    pub enabled: bool,

    /// Per-datagram send timeout in seconds.
    pub send_timeout_secs: u64,
}

impl Default for UdpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            send_timeout_secs: 5,
        }
    }
}

impl UdpConfig {
    pub fn send_timeout(&self) -> Duration {
        Duration::from_secs(self.send_timeout_secs)
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is not set.
    pub level: String,

    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "mqtt_udp_bridge=info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Address for the metrics endpoint (e.g., "0.0.0.0:9090").
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Units a computed vehicle speed is reported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
pub enum SpeedUnits {
    #[default]
    #[serde(rename = "mph")]
    Mph,
    #[serde(rename = "km/h")]
    Kmh,
    #[serde(rename = "m/s")]
    Mps,
}

impl SpeedUnits {
    /// Multiplier converting meters per second into these units.
    pub fn factor(self) -> f64 {
        match self {
            SpeedUnits::Mph => 2.23694,
            SpeedUnits::Kmh => 3.6,
            SpeedUnits::Mps => 1.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SpeedUnits::Mph => "mph",
            SpeedUnits::Kmh => "km/h",
            SpeedUnits::Mps => "m/s",
        }
    }
}

impl fmt::Display for SpeedUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One routing rule: topic pattern, trigger condition and outbound datagram.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Mapping {
    /// Display name, also the debounce key. Filled in by the loader when empty.
    #[serde(default)]
    pub trigger_name: String,

    /// Topic pattern; `+` matches one level, a trailing `#` matches the rest.
    #[serde(alias = "topic")]
    pub topic_pattern: String,

    /// Payload value that fires the mapping. Empty fires on anything.
    #[serde(default)]
    pub trigger_value: String,

    /// Debounce window in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: f64,

    /// Delay before sending, in seconds.
    #[serde(default)]
    pub udp_delay: f64,

    pub udp_ip: String,
    pub udp_port: u16,

    /// Template; `{payload}`, `{topic}` and `{speed}` are substituted.
    #[serde(default = "default_udp_message")]
    pub udp_message: String,

    /// Vehicle length in meters. Zero disables speed estimation.
    #[serde(default)]
    pub car_length: f64,

    #[serde(default)]
    pub speed_units: SpeedUnits,
}

fn default_timeout() -> f64 {
    1.0
}

fn default_udp_message() -> String {
    "{payload}".to_string()
}

impl Mapping {
    /// Create a mapping with the loader defaults applied.
    pub fn new(
        trigger_name: impl Into<String>,
        topic_pattern: impl Into<String>,
        udp_ip: impl Into<String>,
        udp_port: u16,
    ) -> Self {
        Self {
            trigger_name: trigger_name.into(),
            topic_pattern: topic_pattern.into(),
            trigger_value: String::new(),
            timeout: default_timeout(),
            udp_delay: 0.0,
            udp_ip: udp_ip.into(),
            udp_port,
            udp_message: default_udp_message(),
            car_length: 0.0,
            speed_units: SpeedUnits::default(),
        }
    }

    /// Debounce window; non-finite or negative values collapse to zero.
    pub fn timeout(&self) -> Duration {
        secs_to_duration(self.timeout)
    }

    pub fn udp_delay(&self) -> Duration {
        secs_to_duration(self.udp_delay)
    }

    pub fn tracks_speed(&self) -> bool {
        self.car_length > 0.0
    }

    /// The `host:port` destination.
    pub fn target(&self) -> UdpTarget {
        UdpTarget {
            host: self.udp_ip.clone(),
            port: self.udp_port,
        }
    }
}

fn secs_to_duration(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs).unwrap_or_default()
}

/// Destination of an outbound datagram. The host may be a name or an address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UdpTarget {
    pub host: String,
    pub port: u16,
}

impl fmt::Display for UdpTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BridgeConfig::default();
        assert_eq!(config.broker.address, "localhost");
        assert_eq!(config.broker.port, 1883);
        assert!(config.broker.auto_connect);
        assert!(config.udp.enabled);
        assert_eq!(config.udp.send_timeout(), Duration::from_secs(5));
        assert!(config.mappings.is_empty());
    }

    #[test]
    fn test_mapping_defaults_from_toml() {
        let mapping: Mapping = toml::from_str(
            r#"
            topic = "sensors/gate1"
            udp_ip = "10.0.0.5"
            udp_port = 5005
            "#,
        )
        .unwrap();

        assert_eq!(mapping.topic_pattern, "sensors/gate1");
        assert_eq!(mapping.trigger_value, "");
        assert_eq!(mapping.timeout(), Duration::from_secs(1));
        assert_eq!(mapping.udp_delay(), Duration::ZERO);
        assert_eq!(mapping.udp_message, "{payload}");
        assert_eq!(mapping.speed_units, SpeedUnits::Mph);
        assert!(!mapping.tracks_speed());
    }

    #[test]
    fn test_speed_units_serde_names() {
        #[derive(Deserialize)]
        struct Wrapper {
            units: SpeedUnits,
        }

        let w: Wrapper = toml::from_str(r#"units = "km/h""#).unwrap();
        assert_eq!(w.units, SpeedUnits::Kmh);
        let w: Wrapper = toml::from_str(r#"units = "m/s""#).unwrap();
        assert_eq!(w.units, SpeedUnits::Mps);
        assert!(toml::from_str::<Wrapper>(r#"units = "knots""#).is_err());
    }

    #[test]
    fn test_negative_durations_collapse_to_zero() {
        let mut mapping = Mapping::new("Gate", "a/b", "127.0.0.1", 9000);
        mapping.timeout = -3.0;
        mapping.udp_delay = f64::NAN;
        assert_eq!(mapping.timeout(), Duration::ZERO);
        assert_eq!(mapping.udp_delay(), Duration::ZERO);
    }

    #[test]
    fn test_target_display() {
        let mapping = Mapping::new("Gate", "a/b", "192.168.1.20", 7000);
        assert_eq!(mapping.target().to_string(), "192.168.1.20:7000");
    }
}
